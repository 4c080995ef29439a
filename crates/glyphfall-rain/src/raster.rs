//! CPU-side RGBA8 pixel surface that accumulates the rain trails
//!
//! The buffer is never cleared during steady-state rendering. Each frame
//! the rain field composites a translucent black fill over it and then
//! draws glyphs on top, so older glyphs fade out over successive frames.

use crate::canvas::{GlyphCanvas, Rgba};
use crate::glyphs::GlyphSource;

/// Bytes per pixel (RGBA8)
const BYTES_PER_PIXEL: usize = 4;

/// Persistent RGBA8 pixel buffer with glyph drawing
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    glyphs: Box<dyn GlyphSource>,
}

impl RasterBuffer {
    /// Create a transparent buffer of the given size
    pub fn new(width: u32, height: u32, glyphs: Box<dyn GlyphSource>) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            glyphs,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 rows, top row first, `width * 4` bytes per row
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at a pixel, None when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Reallocate to a new size; previous content is discarded
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize * BYTES_PER_PIXEL];
    }
}

impl std::fmt::Debug for RasterBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Source-over composite of `src` scaled by `coverage` onto one RGBA8 pixel
fn blend(dst: &mut [u8], src: Rgba, coverage: f32) {
    let sa = (src.a * coverage).clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }

    let channel = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };

    dst[0] = channel(src.r, dst[0]);
    dst[1] = channel(src.g, dst[1]);
    dst[2] = channel(src.b, dst[2]);
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl GlyphCanvas for RasterBuffer {
    fn fade(&mut self, color: Rgba) {
        for px in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            blend(px, color, 1.0);
        }
    }

    fn draw_glyph(&mut self, ch: char, x: f64, baseline: f64, color: Rgba) {
        let Some(glyph) = self.glyphs.glyph(ch) else {
            return;
        };

        // Centered on x, like a canvas with center text alignment
        let origin_x = (x - glyph.advance as f64 / 2.0).round() as i64 + glyph.left as i64;
        let origin_y = baseline.round() as i64 - glyph.top as i64;

        let (width, height) = (self.width as i64, self.height as i64);
        for gy in 0..glyph.height as i64 {
            let py = origin_y + gy;
            if py < 0 || py >= height {
                continue;
            }
            for gx in 0..glyph.width as i64 {
                let px = origin_x + gx;
                if px < 0 || px >= width {
                    continue;
                }

                let coverage = glyph.coverage[(gy * glyph.width as i64 + gx) as usize];
                if coverage == 0 {
                    continue;
                }

                let i = (py * width + px) as usize * BYTES_PER_PIXEL;
                blend(
                    &mut self.pixels[i..i + BYTES_PER_PIXEL],
                    color,
                    coverage as f32 / 255.0,
                );
            }
        }
    }
}
