//! wgpu implementation of [`GpuBackend`]
//!
//! Offscreen targets are `Rgba8Unorm` textures that can be uploaded to,
//! sampled and rendered into. The program holds two pipelines built from
//! the same shader modules: one writing the offscreen format and one
//! writing the surface format.

use wgpu::util::DeviceExt;

use glyphfall_rain::RasterBuffer;

use crate::error::{RenderError, ShaderStage};
use crate::traits::*;

/// Texture format of the offscreen feedback targets
pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    // position
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x2,
    },
    // tex_coord
    wgpu::VertexAttribute {
        offset: 8,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x2,
    },
];

/// Feedback pipelines for both destination formats
pub struct WgpuProgram {
    offscreen: wgpu::RenderPipeline,
    surface: wgpu::RenderPipeline,
}

/// Vertex buffer holding the full-screen quad
pub struct WgpuGeometry {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// Offscreen texture with its view and sampling bind group
pub struct WgpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// GPU backend drawing through wgpu onto a window surface
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<(wgpu::SurfaceTexture, wgpu::TextureView)>,
}

impl WgpuBackend {
    /// Wrap an initialized device and a configured surface
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Feedback Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Feedback Uniform Buffer"),
            contents: bytemuck::cast_slice(&[FrameUniforms::new(0.0)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Feedback Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        surface.configure(&device, &config);

        Self {
            device,
            queue,
            surface,
            config,
            bind_group_layout,
            uniform_buffer,
            sampler,
            encoder: None,
            frame: None,
        }
    }

    fn compile_stage(
        &self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<wgpu::ShaderModule, RenderError> {
        let label = match stage {
            ShaderStage::Vertex => "Feedback Vertex Shader",
            ShaderStage::Fragment => "Feedback Fragment Shader",
        };

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(err) => Err(RenderError::ShaderCompile {
                stage,
                log: err.to_string(),
            }),
            None => Ok(module),
        }
    }

    fn create_pipeline(
        &self,
        layout: &wgpu::PipelineLayout,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
        format: wgpu::TextureFormat,
    ) -> wgpu::RenderPipeline {
        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Feedback Pipeline"),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs_main"),
                // The pass replaces the destination outright
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }

    /// Acquire the next surface texture, reconfiguring on loss
    fn acquire_frame(&mut self) -> Option<(wgpu::SurfaceTexture, wgpu::TextureView)> {
        match self.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame.texture.create_view(&Default::default());
                Some((frame, view))
            }
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("Surface {:?}, reconfiguring", e);
                self.surface.configure(&self.device, &self.config);
                None
            }
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                None
            }
        }
    }
}

impl GpuBackend for WgpuBackend {
    type Program = WgpuProgram;
    type Geometry = WgpuGeometry;
    type Target = WgpuTarget;

    fn build_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, RenderError> {
        let vertex = self.compile_stage(ShaderStage::Vertex, vertex_source)?;
        let fragment = self.compile_stage(ShaderStage::Fragment, fragment_source)?;

        let layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Feedback Pipeline Layout"),
            bind_group_layouts: &[&self.bind_group_layout],
            push_constant_ranges: &[],
        });

        // Interface mismatches between the stages surface here
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let offscreen = self.create_pipeline(&layout, &vertex, &fragment, TARGET_FORMAT);
        let surface = self.create_pipeline(&layout, &vertex, &fragment, self.config.format);
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::ProgramLink(err.to_string()));
        }

        Ok(WgpuProgram { offscreen, surface })
    }

    fn create_quad(&mut self, vertices: &[QuadVertex]) -> Result<Self::Geometry, RenderError> {
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Feedback Quad Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(WgpuGeometry {
            buffer,
            vertex_count: vertices.len() as u32,
        })
    }

    fn allocate_target(&mut self, width: u32, height: u32) -> Result<Self::Target, RenderError> {
        let (width, height) = (width.max(1), height.max(1));

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Feedback Target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(RenderError::TargetAllocation {
                width,
                height,
                reason: err.to_string(),
            });
        }

        let view = texture.create_view(&Default::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Feedback Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Ok(WgpuTarget {
            texture,
            view,
            bind_group,
            width,
            height,
        })
    }

    fn upload(&mut self, target: &Self::Target, buffer: &RasterBuffer) {
        if (buffer.width(), buffer.height()) != (target.width, target.height) {
            log::warn!(
                "Upload of {}x{} buffer into {}x{} target skipped",
                buffer.width(),
                buffer.height(),
                target.width,
                target.height
            );
            return;
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            buffer.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(target.width * 4),
                rows_per_image: Some(target.height),
            },
            wgpu::Extent3d {
                width: target.width,
                height: target.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn draw(
        &mut self,
        program: &Self::Program,
        geometry: &Self::Geometry,
        source: &Self::Target,
        destination: Destination<'_, Self::Target>,
        uniforms: FrameUniforms,
    ) {
        if matches!(destination, Destination::Surface) && self.frame.is_none() {
            self.frame = self.acquire_frame();
            if self.frame.is_none() {
                return;
            }
        }

        // Buffer writes land before the submission, so every draw in a
        // frame sees the last uniforms written. Both passes share them.
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let (view, pipeline, load) = match destination {
            Destination::Target(target) => (&target.view, &program.offscreen, wgpu::LoadOp::Load),
            Destination::Surface => match &self.frame {
                Some((_, view)) => (
                    view,
                    &program.surface,
                    wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                ),
                None => return,
            },
        };

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Feedback Encoder"),
            })
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Feedback Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &source.bind_group, &[]);
        pass.set_vertex_buffer(0, geometry.buffer.slice(..));
        pass.draw(0..geometry.vertex_count, 0..1);
    }

    fn present(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
        if let Some((frame, _view)) = self.frame.take() {
            frame.present();
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
    }
}
