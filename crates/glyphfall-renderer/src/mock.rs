//! Mock GPU backend for testing
//!
//! Provides a MockBackend that implements [`GpuBackend`] and records every
//! call for test assertions, without requiring a GPU context.

use std::collections::HashMap;

use glyphfall_rain::RasterBuffer;

use crate::error::{RenderError, ShaderStage};
use crate::traits::*;

/// Record of a backend call for test inspection
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    /// Program was compiled and linked
    BuildProgram {
        vertex_source: String,
        fragment_source: String,
    },
    /// Quad geometry was uploaded
    CreateQuad { vertices: usize },
    /// A target was allocated
    AllocateTarget { id: usize, width: u32, height: u32 },
    /// Buffer pixels replaced a target's content
    Upload { target: usize, width: u32, height: u32 },
    /// Quad was drawn; `destination: None` is the surface
    Draw {
        source: usize,
        destination: Option<usize>,
        time: f32,
    },
    /// Frame was presented
    Present,
    /// Surface was resized
    ResizeSurface { width: u32, height: u32 },
}

/// Target handle handed out by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTarget {
    pub id: usize,
    pub width: u32,
    pub height: u32,
}

/// A backend that records all calls instead of talking to a GPU
#[derive(Debug, Default)]
pub struct MockBackend {
    /// All calls made to this backend
    pub calls: Vec<GpuCall>,
    /// When set, `build_program` fails with this log
    pub fail_program: Option<String>,
    next_target: usize,
    writes: HashMap<usize, usize>,
}

impl MockBackend {
    /// Create a new mock backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all recorded calls (write counts are kept)
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Get the number of recorded calls
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    // === Assertion helpers ===

    /// Number of uploads and draws that wrote into a target
    pub fn writes_to(&self, target: usize) -> usize {
        self.writes.get(&target).copied().unwrap_or(0)
    }

    /// Number of frames presented
    pub fn present_count(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, GpuCall::Present)).count()
    }

    /// Number of targets allocated
    pub fn allocation_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, GpuCall::AllocateTarget { .. }))
            .count()
    }

    /// Time uniforms passed to surface draws, in order
    pub fn surface_times(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Draw {
                    destination: None,
                    time,
                    ..
                } => Some(*time),
                _ => None,
            })
            .collect()
    }

    /// Size of the most recently allocated target
    pub fn last_allocation(&self) -> Option<(u32, u32)> {
        self.calls.iter().rev().find_map(|c| match c {
            GpuCall::AllocateTarget { width, height, .. } => Some((*width, *height)),
            _ => None,
        })
    }

    fn record_write(&mut self, target: usize) {
        *self.writes.entry(target).or_insert(0) += 1;
    }
}

impl GpuBackend for MockBackend {
    type Program = ();
    type Geometry = usize;
    type Target = MockTarget;

    fn build_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self::Program, RenderError> {
        self.calls.push(GpuCall::BuildProgram {
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
        });
        match &self.fail_program {
            Some(log) => Err(RenderError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log: log.clone(),
            }),
            None => Ok(()),
        }
    }

    fn create_quad(&mut self, vertices: &[QuadVertex]) -> Result<Self::Geometry, RenderError> {
        self.calls.push(GpuCall::CreateQuad {
            vertices: vertices.len(),
        });
        Ok(vertices.len())
    }

    fn allocate_target(&mut self, width: u32, height: u32) -> Result<Self::Target, RenderError> {
        let id = self.next_target;
        self.next_target += 1;
        self.calls.push(GpuCall::AllocateTarget { id, width, height });
        Ok(MockTarget { id, width, height })
    }

    fn upload(&mut self, target: &Self::Target, buffer: &RasterBuffer) {
        self.calls.push(GpuCall::Upload {
            target: target.id,
            width: buffer.width(),
            height: buffer.height(),
        });
        self.record_write(target.id);
    }

    fn draw(
        &mut self,
        _program: &Self::Program,
        _geometry: &Self::Geometry,
        source: &Self::Target,
        destination: Destination<'_, Self::Target>,
        uniforms: FrameUniforms,
    ) {
        let destination = match destination {
            Destination::Target(target) => Some(target.id),
            Destination::Surface => None,
        };
        self.calls.push(GpuCall::Draw {
            source: source.id,
            destination,
            time: uniforms.time,
        });
        if let Some(id) = destination {
            self.record_write(id);
        }
    }

    fn present(&mut self) {
        self.calls.push(GpuCall::Present);
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.calls.push(GpuCall::ResizeSurface { width, height });
    }
}
