//! Common test utilities and harness
//!
//! Provides a headless rain harness: the full effect wired to the
//! recording mock backend, a resizable fake surface and a fixed-step clock.

use std::cell::Cell;

use glyphfall_rain::{ProceduralGlyphSource, RainField};
use glyphfall_renderer::mock::MockBackend;
use glyphfall_renderer::{DigitalRain, FrameScheduler, SurfaceSize};

/// Fake host surface whose size tests can change between frames
pub struct FakeSurface {
    size: Cell<(u32, u32)>,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Cell::new((width, height)),
        }
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
    }
}

impl SurfaceSize for FakeSurface {
    fn dimensions(&self) -> (u32, u32) {
        self.size.get()
    }
}

/// Clock advancing a fixed number of milliseconds per frame
pub struct FixedClock {
    now_ms: f64,
    step_ms: f64,
}

impl FixedClock {
    /// ~60fps clock starting at zero
    pub fn sixty_hz() -> Self {
        Self {
            now_ms: 0.0,
            step_ms: 1000.0 / 60.0,
        }
    }

    pub fn with_step(step_ms: f64) -> Self {
        Self { now_ms: 0.0, step_ms }
    }
}

impl FrameScheduler for FixedClock {
    fn next_frame(&mut self) -> Option<f64> {
        self.now_ms += self.step_ms;
        Some(self.now_ms)
    }
}

/// Headless harness around the complete effect
pub struct RainTestHarness {
    pub rain: DigitalRain<MockBackend>,
    pub surface: FakeSurface,
    pub clock: FixedClock,
}

impl RainTestHarness {
    /// Create a seeded harness at the given surface size
    pub fn new(width: u32, height: u32) -> Self {
        let rain = DigitalRain::new(
            MockBackend::new(),
            RainField::seeded(width, height, 0x5eed),
            Box::new(ProceduralGlyphSource::new(16.0)),
        )
        .expect("Mock backend never fails to build");

        Self {
            rain,
            surface: FakeSurface::new(width, height),
            clock: FixedClock::sixty_hz(),
        }
    }

    /// Run `count` frames on the fixed clock
    pub fn run_frames(&mut self, count: u64) -> u64 {
        self.rain
            .run(&self.surface, &mut self.clock, |ticks| ticks >= count)
            .expect("Frames should render")
    }

    pub fn backend(&self) -> &MockBackend {
        self.rain.compositor().backend()
    }

    pub fn column_count(&self) -> usize {
        self.rain.field().columns().len()
    }

    /// Sizes of the back and front targets
    pub fn target_sizes(&self) -> [(u32, u32); 2] {
        let targets = self.rain.compositor().targets();
        [
            (targets.back().width, targets.back().height),
            (targets.front().width, targets.front().height),
        ]
    }

    /// Count pixels with a non-zero green channel
    pub fn lit_pixels(&self) -> usize {
        self.rain
            .buffer()
            .pixels()
            .chunks_exact(4)
            .filter(|px| px[1] > 0)
            .count()
    }
}
