//! Rain field generator
//!
//! Owns the column set and the RNG, advances the simulation one step per
//! frame and draws the visible part of every trail onto a [`GlyphCanvas`].

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::canvas::{GlyphCanvas, Rgba};
use crate::column::{Column, EDGE_MARGIN, column_count, trail_intensity};

/// Procedural glyph rain over a surface of fixed size
pub struct RainField {
    columns: Vec<Column>,
    width: u32,
    height: u32,
    rng: StdRng,
}

impl RainField {
    /// Create a field seeded from the operating system
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_os_rng())
    }

    /// Create a field with a fixed seed (reproducible runs and tests)
    pub fn seeded(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        let mut field = Self {
            columns: Vec::new(),
            width,
            height,
            rng,
        };
        field.initialize(width, height);
        field
    }

    /// Rebuild the whole column set for a surface of the given size
    pub fn initialize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;

        let count = column_count(width);
        self.columns.clear();
        self.columns.reserve(count);
        for _ in 0..count {
            self.columns.push(Column::spawn(&mut self.rng, width, height));
        }

        log::debug!("Rain field initialized: {}x{}, {} columns", width, height, count);
    }

    /// Advance every column one frame and draw the result.
    ///
    /// The canvas is faded first, never cleared. Trail glyphs whose
    /// baseline lies outside `[-margin, height]` are not drawn at all.
    pub fn advance_frame<C: GlyphCanvas + ?Sized>(&mut self, canvas: &mut C) {
        canvas.fade(Rgba::FADE);

        let (width, height) = (self.width, self.height);
        for column in &mut self.columns {
            column.advance(&mut self.rng, width, height);
            draw_column(column, height, canvas);
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Mutable access to the columns (used to stage scenarios)
    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Draw the visible trail glyphs of one column
fn draw_column<C: GlyphCanvas + ?Sized>(column: &Column, height: u32, canvas: &mut C) {
    let bottom = height as f64;

    for i in 0..column.trail_len() {
        let y = column.glyph_y(i);
        if y < -EDGE_MARGIN || y > bottom {
            continue;
        }

        let (alpha, brightness) = trail_intensity(i, column.length);
        let color = Rgba::new(0, (255.0 * brightness).floor() as u8, 0, alpha as f32);
        canvas.draw_glyph(column.glyphs[i], column.x, y, color);
    }
}
