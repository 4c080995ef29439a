//! Drawing surface abstraction for the rain field
//!
//! The rain field only needs two operations from whatever it draws into:
//! a translucent full-surface fill and a single glyph draw. Keeping them
//! behind a trait lets tests count draw calls without rasterizing.

/// Straight-alpha color: 8-bit channels with a fractional alpha
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fill used every frame to fade previous content
    pub const FADE: Self = Self::new(0, 0, 0, 0.05);
}

/// A surface the rain field can draw onto
pub trait GlyphCanvas {
    /// Composite `color` over every pixel of the surface
    fn fade(&mut self, color: Rgba);

    /// Draw `ch` horizontally centered on `x` with its baseline at `baseline`
    fn draw_glyph(&mut self, ch: char, x: f64, baseline: f64, color: Rgba);
}

/// A glyph draw captured by [`RecordingCanvas`]
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphDraw {
    pub ch: char,
    pub x: f64,
    pub baseline: f64,
    pub color: Rgba,
}

/// Canvas that records calls instead of drawing, for tests and diagnostics
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    /// Fade fills applied, in order
    pub fades: Vec<Rgba>,
    /// Glyph draws, in order
    pub draws: Vec<GlyphDraw>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.fades.clear();
        self.draws.clear();
    }

    /// Number of glyph draws recorded
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

impl GlyphCanvas for RecordingCanvas {
    fn fade(&mut self, color: Rgba) {
        self.fades.push(color);
    }

    fn draw_glyph(&mut self, ch: char, x: f64, baseline: f64, color: Rgba) {
        self.draws.push(GlyphDraw {
            ch,
            x,
            baseline,
            color,
        });
    }
}
