//! Rain columns - the streams of glyphs that fall down the surface
//!
//! A column owns its head position, speed, trail length and a fixed
//! sequence of glyphs. Glyphs are sampled once when the column is created
//! and reused for its whole lifetime, including across recycles.

use std::sync::OnceLock;

use rand::Rng;

/// Glyph cell size in pixels (font size and trail spacing)
pub const CELL_SIZE: f64 = 16.0;

/// Number of glyphs carried by every column
pub const GLYPHS_PER_COLUMN: usize = 40;

/// Pixels per frame a column moves per unit of speed
pub const TIME_SCALE: f64 = 0.5;

/// Margin beyond the surface edges used for recycling and culling
pub const EDGE_MARGIN: f64 = 20.0;

/// Head position a recycled column restarts from
pub const RECYCLE_Y: f64 = -20.0;

/// Fall speed range `[min, min + span)`
pub const SPEED_MIN: f64 = 1.0;
pub const SPEED_SPAN: f64 = 2.0;

/// Trail length range `[min, min + span)`
pub const LENGTH_MIN: f64 = 5.0;
pub const LENGTH_SPAN: f64 = 30.0;

/// Katakana, digits and latin capitals
pub const CHARSET: &str = "アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモヤユヨラリルレロワヲン0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static CHARSET_GLYPHS: OnceLock<Vec<char>> = OnceLock::new();

/// The character set as an indexable slice
pub fn charset() -> &'static [char] {
    CHARSET_GLYPHS.get_or_init(|| CHARSET.chars().collect())
}

/// Number of columns for a surface of the given width
pub fn column_count(width: u32) -> usize {
    (width as f64 / CELL_SIZE).ceil() as usize
}

/// Alpha and brightness for trail index `i` of a trail `length` long.
///
/// Index 0 is the head and always has full brightness.
pub fn trail_intensity(i: usize, length: f64) -> (f64, f64) {
    let alpha = (length - i as f64) / length;
    let brightness = if i == 0 { 1.0 } else { 0.3 + 0.7 * alpha };
    (alpha, brightness)
}

/// A single stream of falling glyphs
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Horizontal position of the glyph centers in pixels
    pub x: f64,
    /// Baseline of the head glyph in pixels (negative while above the top edge)
    pub y: f64,
    /// Speed multiplier applied every frame
    pub speed: f64,
    /// Visible trail length in glyphs
    pub length: f64,
    /// Glyph sequence, index 0 drawn at the head
    pub glyphs: Vec<char>,
}

impl Column {
    /// Create a column with random placement somewhere above the surface
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, width: u32, height: u32) -> Self {
        let set = charset();
        let glyphs = (0..GLYPHS_PER_COLUMN)
            .map(|_| set[rng.random_range(0..set.len())])
            .collect();

        Self {
            x: rng.random::<f64>() * width as f64,
            y: -rng.random::<f64>() * height as f64,
            speed: SPEED_MIN + rng.random::<f64>() * SPEED_SPAN,
            length: LENGTH_MIN + rng.random::<f64>() * LENGTH_SPAN,
            glyphs,
        }
    }

    /// Move the head down one frame, recycling past the bottom edge.
    ///
    /// Returns true when the column was recycled.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32, height: u32) -> bool {
        self.y += self.speed * TIME_SCALE;

        if self.y > height as f64 + EDGE_MARGIN {
            self.recycle(rng, width);
            true
        } else {
            false
        }
    }

    /// Restart above the top edge at a new horizontal position and speed
    pub fn recycle<R: Rng + ?Sized>(&mut self, rng: &mut R, width: u32) {
        self.y = RECYCLE_Y;
        self.x = rng.random::<f64>() * width as f64;
        self.speed = SPEED_MIN + rng.random::<f64>() * SPEED_SPAN;
    }

    /// Number of trail glyphs considered for drawing
    pub fn trail_len(&self) -> usize {
        (self.length.ceil().max(0.0) as usize).min(self.glyphs.len())
    }

    /// Baseline of trail glyph `i`
    pub fn glyph_y(&self, i: usize) -> f64 {
        self.y - i as f64 * CELL_SIZE
    }
}
