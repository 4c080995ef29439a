//! Glyph coverage sources for the raster buffer
//!
//! A [`GlyphSource`] turns a character into an 8-bit coverage bitmap plus
//! the metrics needed to place it relative to a baseline. Outline fonts
//! are rasterized with swash; when no font is available a procedural
//! block glyph stands in so the effect still runs.

use std::collections::HashMap;

use swash::{
    FontRef,
    scale::{Render, ScaleContext, Source},
    zeno::Format,
};
use thiserror::Error;

/// Errors raised while preparing a glyph source
#[derive(Error, Debug)]
pub enum GlyphError {
    #[error("font data is not a readable font")]
    InvalidFont,

    #[error("font is missing glyphs for the rain character set")]
    MissingCoverage,
}

/// Rasterized glyph coverage and placement
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Offset of the bitmap's left edge from the pen position
    pub left: i32,
    /// Distance from the baseline up to the bitmap's top edge
    pub top: i32,
    /// Horizontal advance, used for centering
    pub advance: f32,
    /// Row-major coverage, `width * height` bytes
    pub coverage: Vec<u8>,
}

/// Something that can produce coverage bitmaps for characters
pub trait GlyphSource {
    /// Coverage bitmap for `ch`, or None if the source cannot draw it
    fn glyph(&mut self, ch: char) -> Option<&GlyphBitmap>;
}

/// Glyph source backed by an outline font
pub struct SwashGlyphSource {
    font_data: Vec<u8>,
    scale_context: ScaleContext,
    size: f32,
    cache: HashMap<char, Option<GlyphBitmap>>,
}

impl SwashGlyphSource {
    /// Create a source from raw font bytes at the given pixel size.
    ///
    /// Fails if the bytes do not parse or the font has no glyphs for the
    /// sample characters of the rain set.
    pub fn new(font_data: Vec<u8>, size: f32) -> Result<Self, GlyphError> {
        let font = FontRef::from_index(&font_data, 0).ok_or(GlyphError::InvalidFont)?;

        let charmap = font.charmap();
        if ['ア', '0', 'A'].iter().any(|&ch| charmap.map(ch) == 0) {
            return Err(GlyphError::MissingCoverage);
        }

        Ok(Self {
            font_data,
            scale_context: ScaleContext::new(),
            size,
            cache: HashMap::new(),
        })
    }

    /// Pixel size glyphs are rasterized at
    pub fn size(&self) -> f32 {
        self.size
    }
}

impl GlyphSource for SwashGlyphSource {
    fn glyph(&mut self, ch: char) -> Option<&GlyphBitmap> {
        if !self.cache.contains_key(&ch) {
            let bitmap = rasterize(&mut self.scale_context, &self.font_data, self.size, ch);
            if bitmap.is_none() {
                log::debug!("No outline for {:?}, glyph will be skipped", ch);
            }
            self.cache.insert(ch, bitmap);
        }
        self.cache.get(&ch).and_then(Option::as_ref)
    }
}

fn rasterize(context: &mut ScaleContext, font_data: &[u8], size: f32, ch: char) -> Option<GlyphBitmap> {
    let font = FontRef::from_index(font_data, 0)?;
    let glyph_id = font.charmap().map(ch);
    if glyph_id == 0 {
        return None;
    }

    let mut scaler = context.builder(font).size(size).hint(true).build();
    let image = Render::new(&[Source::Outline])
        .format(Format::Alpha)
        .render(&mut scaler, glyph_id)?;

    let advance = font.glyph_metrics(&[]).scale(size).advance_width(glyph_id);

    Some(GlyphBitmap {
        width: image.placement.width,
        height: image.placement.height,
        left: image.placement.left,
        top: image.placement.top,
        advance,
        coverage: image.data,
    })
}

/// Block pattern dimensions of procedural glyphs
const PATTERN_COLS: u32 = 5;
const PATTERN_ROWS: u32 = 7;

/// Deterministic block glyphs derived from a hash of the character
pub struct ProceduralGlyphSource {
    size: f32,
    cache: HashMap<char, GlyphBitmap>,
}

impl ProceduralGlyphSource {
    pub fn new(size: f32) -> Self {
        Self {
            size,
            cache: HashMap::new(),
        }
    }

    /// Murmur3 finalizer
    fn hash(mut h: u32) -> u32 {
        h ^= h >> 16;
        h = h.wrapping_mul(0x85ebca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2ae35);
        h ^= h >> 16;
        h
    }

    /// Mirrored 5x7 pattern; bit `row * 5 + col` set means a lit block
    fn pattern(ch: char) -> u64 {
        let mut bits = Self::hash(ch as u32) as u64 | ((Self::hash(ch as u32 ^ 0x9e37_79b9) as u64) << 32);
        let mut pattern = 0u64;
        for row in 0..PATTERN_ROWS {
            for col in 0..3 {
                if bits & 1 == 1 {
                    pattern |= 1 << (row * PATTERN_COLS + col);
                    pattern |= 1 << (row * PATTERN_COLS + (PATTERN_COLS - 1 - col));
                }
                bits >>= 1;
            }
        }
        // Spine so no glyph is blank
        if pattern == 0 {
            for row in 0..PATTERN_ROWS {
                pattern |= 1 << (row * PATTERN_COLS + PATTERN_COLS / 2);
            }
        }
        pattern
    }

    fn build(&self, ch: char) -> GlyphBitmap {
        let block_w = ((self.size * 0.6) / PATTERN_COLS as f32).round().max(1.0) as u32;
        let block_h = ((self.size * 0.9) / PATTERN_ROWS as f32).round().max(1.0) as u32;
        let width = block_w * PATTERN_COLS;
        let height = block_h * PATTERN_ROWS;
        let pattern = Self::pattern(ch);

        let mut coverage = vec![0u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                let bit = (y / block_h) * PATTERN_COLS + x / block_w;
                if pattern & (1 << bit) != 0 {
                    coverage[(y * width + x) as usize] = 255;
                }
            }
        }

        GlyphBitmap {
            width,
            height,
            left: 0,
            top: height as i32,
            advance: width as f32,
            coverage,
        }
    }
}

impl GlyphSource for ProceduralGlyphSource {
    fn glyph(&mut self, ch: char) -> Option<&GlyphBitmap> {
        if !self.cache.contains_key(&ch) {
            let bitmap = self.build(ch);
            self.cache.insert(ch, bitmap);
        }
        self.cache.get(&ch)
    }
}
