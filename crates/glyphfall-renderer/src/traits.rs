//! GPU backend abstraction for the feedback compositor
//!
//! This module defines the GPU-agnostic operations the compositor needs.
//! The wgpu backend drives real hardware; the mock backend records calls
//! so compositor behavior can be tested without a GPU context.

use bytemuck::{Pod, Zeroable};
use glyphfall_rain::RasterBuffer;

use crate::error::RenderError;

/// Interleaved quad vertex: clip-space position and texture coordinate
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coord: [f32; 2],
}

impl QuadVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self {
            position: [x, y],
            tex_coord: [u, v],
        }
    }
}

/// Two triangles covering the surface. Texture row 0 maps to the top
/// edge, so raster rows upload without a vertical flip.
pub const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex::new(-1.0, -1.0, 0.0, 1.0),
    QuadVertex::new(1.0, -1.0, 1.0, 1.0),
    QuadVertex::new(-1.0, 1.0, 0.0, 0.0),
    QuadVertex::new(-1.0, 1.0, 0.0, 0.0),
    QuadVertex::new(1.0, -1.0, 1.0, 1.0),
    QuadVertex::new(1.0, 1.0, 1.0, 0.0),
];

/// Per-frame shader uniforms (std140-compatible, 16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// Elapsed time in seconds
    pub time: f32,
    pub _pad: [f32; 3],
}

impl FrameUniforms {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            _pad: [0.0; 3],
        }
    }
}

/// Where a draw writes its output
#[derive(Debug)]
pub enum Destination<'a, T> {
    /// An offscreen target
    Target(&'a T),
    /// The visible surface
    Surface,
}

/// GPU operations used by the feedback compositor
///
/// Draws are recorded in submission order and flushed by [`present`].
///
/// [`present`]: GpuBackend::present
pub trait GpuBackend {
    /// Linked vertex + fragment program
    type Program;
    /// Uploaded vertex data
    type Geometry;
    /// Texture with a render target bound to it
    type Target;

    /// Compile both stages and link them. Failure carries the diagnostic log.
    fn build_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, RenderError>;

    /// Upload static quad geometry
    fn create_quad(&mut self, vertices: &[QuadVertex]) -> Result<Self::Geometry, RenderError>;

    /// Allocate a texture (nearest filtering, edge clamping) and its render target
    fn allocate_target(&mut self, width: u32, height: u32) -> Result<Self::Target, RenderError>;

    /// Replace the target's texture content with the buffer's pixels
    fn upload(&mut self, target: &Self::Target, buffer: &RasterBuffer);

    /// Draw the quad sampling `source` into `destination`
    fn draw(
        &mut self,
        program: &Self::Program,
        geometry: &Self::Geometry,
        source: &Self::Target,
        destination: Destination<'_, Self::Target>,
        uniforms: FrameUniforms,
    );

    /// Submit recorded work and show the surface
    fn present(&mut self);

    /// Resize the visible surface
    fn resize_surface(&mut self, width: u32, height: u32);
}
