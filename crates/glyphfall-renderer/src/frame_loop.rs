//! Frame loop - drives the rain and the compositor from a frame clock
//!
//! The host is reached only through two small traits: [`SurfaceSize`]
//! reports the current surface dimensions and [`FrameScheduler`] hands out
//! frame timestamps. Size changes are picked up at the next frame
//! boundary, where the column set, the raster buffer and both offscreen
//! targets are rebuilt together.

use glyphfall_rain::{GlyphSource, RainField, RasterBuffer};

use crate::compositor::FeedbackCompositor;
use crate::error::RenderError;
use crate::traits::GpuBackend;

/// Source of the visible surface's current dimensions
pub trait SurfaceSize {
    fn dimensions(&self) -> (u32, u32);
}

impl<F: Fn() -> (u32, u32)> SurfaceSize for F {
    fn dimensions(&self) -> (u32, u32) {
        self()
    }
}

/// Frame clock yielding monotonically increasing timestamps in milliseconds
///
/// `None` ends the run loop.
pub trait FrameScheduler {
    fn next_frame(&mut self) -> Option<f64>;
}

impl<F: FnMut() -> Option<f64>> FrameScheduler for F {
    fn next_frame(&mut self) -> Option<f64> {
        self()
    }
}

/// The complete effect: generator, raster buffer and compositor
pub struct DigitalRain<B: GpuBackend> {
    field: RainField,
    buffer: RasterBuffer,
    compositor: FeedbackCompositor<B>,
    size: (u32, u32),
    frames: u64,
}

impl<B: GpuBackend> DigitalRain<B> {
    /// Build the effect at the field's current size
    pub fn new(backend: B, field: RainField, glyphs: Box<dyn GlyphSource>) -> Result<Self, RenderError> {
        let (width, height) = field.size();
        let buffer = RasterBuffer::new(width, height, glyphs);
        let compositor = FeedbackCompositor::new(backend, width, height)?;

        Ok(Self {
            field,
            buffer,
            compositor,
            size: (width, height),
            frames: 0,
        })
    }

    /// Render one frame at `timestamp_ms`.
    ///
    /// Returns `Ok(false)` when the surface has zero area and nothing was
    /// drawn.
    pub fn frame<S: SurfaceSize + ?Sized>(
        &mut self,
        surface: &S,
        timestamp_ms: f64,
    ) -> Result<bool, RenderError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            log::trace!("Surface has zero area, skipping frame");
            return Ok(false);
        }

        if (width, height) != self.size {
            self.resize(width, height)?;
        }

        self.field.advance_frame(&mut self.buffer);
        self.compositor
            .render_frame(&self.buffer, (timestamp_ms / 1000.0) as f32);
        self.frames += 1;

        Ok(true)
    }

    /// Pull frames from `scheduler` until it runs dry or `stop` returns true.
    ///
    /// `stop` receives the number of scheduler ticks consumed so far.
    /// Returns the number of frames actually rendered.
    pub fn run<S, F>(
        &mut self,
        surface: &S,
        scheduler: &mut F,
        mut stop: impl FnMut(u64) -> bool,
    ) -> Result<u64, RenderError>
    where
        S: SurfaceSize + ?Sized,
        F: FrameScheduler + ?Sized,
    {
        let mut ticks = 0;
        let mut rendered = 0;

        while !stop(ticks) {
            let Some(timestamp) = scheduler.next_frame() else {
                break;
            };
            ticks += 1;
            if self.frame(surface, timestamp)? {
                rendered += 1;
            }
        }

        log::debug!("Run loop finished after {} ticks, {} frames", ticks, rendered);
        Ok(rendered)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        log::debug!(
            "Surface resized {}x{} -> {}x{}",
            self.size.0,
            self.size.1,
            width,
            height
        );

        self.field.initialize(width, height);
        self.buffer.resize(width, height);
        self.compositor.resize(width, height)?;
        self.size = (width, height);
        Ok(())
    }

    pub fn field(&self) -> &RainField {
        &self.field
    }

    pub fn buffer(&self) -> &RasterBuffer {
        &self.buffer
    }

    pub fn compositor(&self) -> &FeedbackCompositor<B> {
        &self.compositor
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Frames rendered since construction
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{GpuCall, MockBackend};
    use glyphfall_rain::ProceduralGlyphSource;
    use std::cell::Cell;

    fn rain(width: u32, height: u32) -> DigitalRain<MockBackend> {
        DigitalRain::new(
            MockBackend::new(),
            RainField::seeded(width, height, 7),
            Box::new(ProceduralGlyphSource::new(16.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_resize() {
        let mut rain = rain(320, 240);
        let dims = Cell::new((320u32, 240u32));
        let surface = || dims.get();

        rain.frame(&surface, 16.0).unwrap();
        assert_eq!(rain.field().columns().len(), 20);
        assert_eq!(rain.compositor().targets().size(), (320, 240));

        dims.set((640, 480));
        rain.frame(&surface, 32.0).unwrap();

        assert_eq!(rain.field().columns().len(), 40);
        let targets = rain.compositor().targets();
        assert_eq!((targets.back().width, targets.back().height), (640, 480));
        assert_eq!((targets.front().width, targets.front().height), (640, 480));
        assert_eq!((rain.buffer().width(), rain.buffer().height()), (640, 480));
    }

    #[test]
    fn test_resize_is_deferred_to_frame_boundary() {
        let mut rain = rain(320, 240);
        let dims = Cell::new((320u32, 240u32));
        let surface = || dims.get();

        dims.set((480, 240));
        // Nothing changes until the next frame runs
        assert_eq!(rain.field().columns().len(), 20);
        assert_eq!(rain.compositor().backend().allocation_count(), 2);

        rain.frame(&surface, 0.0).unwrap();
        assert_eq!(rain.field().columns().len(), 30);
        assert_eq!(rain.compositor().backend().allocation_count(), 4);
    }

    #[test]
    fn test_unchanged_size_allocates_nothing() {
        let mut rain = rain(64, 64);
        let surface = || (64u32, 64u32);

        for frame in 0..5 {
            rain.frame(&surface, frame as f64 * 16.0).unwrap();
        }

        let backend = rain.compositor().backend();
        assert_eq!(backend.allocation_count(), 2);
        assert_eq!(backend.present_count(), 5);
    }

    #[test]
    fn test_zero_area_surface_skips_frame() {
        let mut rain = rain(64, 64);
        let surface = || (0u32, 480u32);

        assert!(!rain.frame(&surface, 0.0).unwrap());
        assert_eq!(rain.frames(), 0);
        assert_eq!(rain.size(), (64, 64));
        assert_eq!(rain.compositor().backend().present_count(), 0);
    }

    #[test]
    fn test_timestamp_converted_to_seconds() {
        let mut rain = rain(32, 32);
        let surface = || (32u32, 32u32);

        rain.frame(&surface, 2500.0).unwrap();

        assert_eq!(rain.compositor().backend().surface_times(), vec![2.5]);
    }

    #[test]
    fn test_run_stops_on_predicate() {
        let mut rain = rain(32, 32);
        let surface = || (32u32, 32u32);
        let mut clock = 0.0;
        let mut scheduler = || {
            clock += 16.0;
            Some(clock)
        };

        let rendered = rain.run(&surface, &mut scheduler, |ticks| ticks >= 10).unwrap();

        assert_eq!(rendered, 10);
        assert_eq!(rain.frames(), 10);
    }

    #[test]
    fn test_run_stops_when_scheduler_runs_dry() {
        let mut rain = rain(32, 32);
        let surface = || (32u32, 32u32);
        let mut remaining = vec![1500.0, 1000.0, 500.0];
        let mut scheduler = || remaining.pop();

        let rendered = rain.run(&surface, &mut scheduler, |_| false).unwrap();

        assert_eq!(rendered, 3);
        assert_eq!(
            rain.compositor().backend().surface_times(),
            vec![0.5, 1.0, 1.5]
        );
    }

    #[test]
    fn test_run_counts_only_rendered_frames() {
        let mut rain = rain(32, 32);
        let ticks = Cell::new(0u32);
        // Minimized for the first two ticks
        let surface = || if ticks.get() <= 2 { (0u32, 0u32) } else { (32, 32) };
        let mut scheduler = || {
            ticks.set(ticks.get() + 1);
            Some(ticks.get() as f64)
        };

        let rendered = rain.run(&surface, &mut scheduler, |t| t >= 5).unwrap();

        assert_eq!(rendered, 3);
    }

    #[test]
    fn test_every_frame_alternates_targets() {
        let mut rain = rain(32, 32);
        let surface = || (32u32, 32u32);

        for frame in 0..4 {
            rain.frame(&surface, frame as f64).unwrap();
        }

        let uploads: Vec<usize> = rain
            .compositor()
            .backend()
            .calls
            .iter()
            .filter_map(|c| match c {
                GpuCall::Upload { target, .. } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![0, 1, 0, 1]);
    }
}
