//! Feedback compositor - ping-pongs two offscreen targets
//!
//! Each frame the rasterized rain is uploaded into the back target, drawn
//! through the pulsing shader into the front target, the two roles are
//! swapped, and the new front target is drawn onto the visible surface.
//!
//! The swap never copies pixels: both targets live in a two-slot arena and
//! a single parity index says which slot currently plays the front role.

use glyphfall_rain::RasterBuffer;

use crate::error::RenderError;
use crate::shaders::builtin;
use crate::traits::{Destination, FULLSCREEN_QUAD, FrameUniforms, GpuBackend};

/// A backend target together with the size it was allocated at
#[derive(Debug)]
pub struct OffscreenTarget<T> {
    pub resource: T,
    pub width: u32,
    pub height: u32,
}

/// Exactly two offscreen targets with alternating back/front roles
#[derive(Debug)]
pub struct TargetPair<T> {
    slots: [OffscreenTarget<T>; 2],
    front: usize,
}

impl<T> TargetPair<T> {
    /// Slot 0 starts as back, slot 1 as front
    pub fn new(first: OffscreenTarget<T>, second: OffscreenTarget<T>) -> Self {
        Self {
            slots: [first, second],
            front: 1,
        }
    }

    /// Target that receives the upload and is sampled by the feedback pass
    pub fn back(&self) -> &OffscreenTarget<T> {
        &self.slots[1 - self.front]
    }

    /// Target the feedback pass writes into
    pub fn front(&self) -> &OffscreenTarget<T> {
        &self.slots[self.front]
    }

    /// Exchange roles
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn size(&self) -> (u32, u32) {
        let front = self.front();
        (front.width, front.height)
    }
}

/// Owns the shader program, quad and target pair on a [`GpuBackend`]
///
/// Construction is the one-time `Uninitialized -> Ready` transition; a
/// value of this type is always ready to render.
pub struct FeedbackCompositor<B: GpuBackend> {
    backend: B,
    program: B::Program,
    quad: B::Geometry,
    targets: TargetPair<B::Target>,
}

impl<B: GpuBackend> FeedbackCompositor<B> {
    /// Build the program and quad, and allocate both targets
    pub fn new(mut backend: B, width: u32, height: u32) -> Result<Self, RenderError> {
        let program = backend.build_program(builtin::FEEDBACK_VERTEX, builtin::FEEDBACK_FRAGMENT)?;
        let quad = backend.create_quad(&FULLSCREEN_QUAD)?;
        let targets = allocate_pair(&mut backend, width, height)?;

        log::info!("Feedback compositor ready at {}x{}", width, height);

        Ok(Self {
            backend,
            program,
            quad,
            targets,
        })
    }

    /// Composite one frame and present it
    pub fn render_frame(&mut self, source: &RasterBuffer, elapsed_seconds: f32) {
        if (source.width(), source.height()) != self.targets.size() {
            log::warn!(
                "Skipping frame: buffer {}x{} does not match targets {:?}",
                source.width(),
                source.height(),
                self.targets.size()
            );
            return;
        }

        let uniforms = FrameUniforms::new(elapsed_seconds);

        self.backend.upload(&self.targets.back().resource, source);
        self.backend.draw(
            &self.program,
            &self.quad,
            &self.targets.back().resource,
            Destination::Target(&self.targets.front().resource),
            uniforms,
        );

        self.targets.swap();

        self.backend.draw(
            &self.program,
            &self.quad,
            &self.targets.front().resource,
            Destination::Surface,
            uniforms,
        );
        self.backend.present();
    }

    /// Reallocate both targets and the surface at a new size.
    ///
    /// The old targets are dropped; roles restart from the initial parity.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.targets = allocate_pair(&mut self.backend, width, height)?;
        self.backend.resize_surface(width, height);
        log::debug!("Feedback targets reallocated at {}x{}", width, height);
        Ok(())
    }

    pub fn targets(&self) -> &TargetPair<B::Target> {
        &self.targets
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn allocate_pair<B: GpuBackend>(
    backend: &mut B,
    width: u32,
    height: u32,
) -> Result<TargetPair<B::Target>, RenderError> {
    let mut allocate = || -> Result<OffscreenTarget<B::Target>, RenderError> {
        Ok(OffscreenTarget {
            resource: backend.allocate_target(width, height)?,
            width,
            height,
        })
    };
    let first = allocate()?;
    let second = allocate()?;
    Ok(TargetPair::new(first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{GpuCall, MockBackend};
    use glyphfall_rain::ProceduralGlyphSource;

    fn buffer(width: u32, height: u32) -> RasterBuffer {
        RasterBuffer::new(width, height, Box::new(ProceduralGlyphSource::new(16.0)))
    }

    #[test]
    fn test_pair_roles_alternate() {
        let target = |id| OffscreenTarget {
            resource: id,
            width: 1,
            height: 1,
        };
        let mut pair = TargetPair::new(target(10), target(20));

        assert_eq!(pair.back().resource, 10);
        assert_eq!(pair.front().resource, 20);

        pair.swap();
        assert_eq!(pair.back().resource, 20);
        assert_eq!(pair.front().resource, 10);

        pair.swap();
        assert_eq!(pair.front().resource, 20);
    }

    #[test]
    fn test_new_builds_everything_once() {
        let compositor = FeedbackCompositor::new(MockBackend::new(), 320, 240).unwrap();
        let calls = &compositor.backend().calls;

        assert!(matches!(calls[0], GpuCall::BuildProgram { .. }));
        assert_eq!(calls[1], GpuCall::CreateQuad { vertices: 6 });
        assert_eq!(
            calls[2..],
            [
                GpuCall::AllocateTarget { id: 0, width: 320, height: 240 },
                GpuCall::AllocateTarget { id: 1, width: 320, height: 240 },
            ]
        );
        assert_eq!(compositor.targets().size(), (320, 240));
    }

    #[test]
    fn test_program_failure_is_fatal() {
        let mut backend = MockBackend::new();
        backend.fail_program = Some("expected `;`".to_string());

        let result = FeedbackCompositor::new(backend, 320, 240);

        assert!(matches!(result, Err(RenderError::ShaderCompile { .. })));
    }

    #[test]
    fn test_render_frame_call_sequence() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 64, 32).unwrap();
        compositor.backend_mut().clear_calls();

        compositor.render_frame(&buffer(64, 32), 1.5);

        assert_eq!(
            compositor.backend().calls,
            vec![
                GpuCall::Upload { target: 0, width: 64, height: 32 },
                GpuCall::Draw { source: 0, destination: Some(1), time: 1.5 },
                GpuCall::Draw { source: 0, destination: None, time: 1.5 },
                GpuCall::Present,
            ]
        );
    }

    #[test]
    fn test_render_frame_swaps_roles() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 64, 32).unwrap();
        let back_before = compositor.targets().back().resource.id;
        let front_before = compositor.targets().front().resource.id;

        compositor.render_frame(&buffer(64, 32), 0.0);

        assert_eq!(compositor.targets().back().resource.id, front_before);
        assert_eq!(compositor.targets().front().resource.id, back_before);
    }

    #[test]
    fn test_swap_does_not_copy() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 64, 32).unwrap();

        for frame in 0..4 {
            compositor.render_frame(&buffer(64, 32), frame as f32);
        }

        // Each target is written exactly once per frame (upload or draw),
        // never by the swap itself.
        let backend = compositor.backend();
        assert_eq!(backend.writes_to(0), 4);
        assert_eq!(backend.writes_to(1), 4);
    }

    #[test]
    fn test_feedback_pass_never_reads_its_destination() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 16, 16).unwrap();
        for frame in 0..6 {
            compositor.render_frame(&buffer(16, 16), frame as f32);
        }

        for call in &compositor.backend().calls {
            if let GpuCall::Draw {
                source,
                destination: Some(dest),
                ..
            } = call
            {
                assert_ne!(source, dest);
            }
        }
    }

    #[test]
    fn test_resize_reallocates_both_targets() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 320, 240).unwrap();
        compositor.render_frame(&buffer(320, 240), 0.0);
        compositor.backend_mut().clear_calls();

        compositor.resize(640, 480).unwrap();

        assert_eq!(
            compositor.backend().calls,
            vec![
                GpuCall::AllocateTarget { id: 2, width: 640, height: 480 },
                GpuCall::AllocateTarget { id: 3, width: 640, height: 480 },
                GpuCall::ResizeSurface { width: 640, height: 480 },
            ]
        );
        assert_eq!(compositor.targets().back().resource.id, 2);
        assert_eq!(compositor.targets().front().resource.id, 3);
        assert_eq!(compositor.targets().back().width, 640);
        assert_eq!(compositor.targets().front().height, 480);
    }

    #[test]
    fn test_mismatched_buffer_is_skipped() {
        let mut compositor = FeedbackCompositor::new(MockBackend::new(), 320, 240).unwrap();
        compositor.backend_mut().clear_calls();

        compositor.render_frame(&buffer(640, 480), 0.0);

        assert!(compositor.backend().calls.is_empty());
    }
}
