//! GPU state management
//!
//! Brings up the wgpu adapter, device and window surface. Any failure here
//! is fatal: the effect has no degraded mode without a GPU.

use std::sync::Arc;

use glyphfall_renderer::RenderError;
use winit::window::Window;

/// Device, queue and configured surface for one window
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Initialize GPU resources for `window`
    pub fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let size = window.inner_size();

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::SurfaceCreation(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| RenderError::NoAdapter(e.to_string()))?;

        log::info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glyphfall device"),
            ..Default::default()
        }))
        .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps.formats).ok_or_else(|| {
            RenderError::SurfaceCreation("surface reports no supported formats".to_string())
        })?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Surface format: {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        Ok(Self {
            device,
            queue,
            surface,
            config,
        })
    }
}

/// Prefer a non-sRGB format so raster bytes reach the screen unconverted
pub fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}
