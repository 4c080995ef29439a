//! glyphfall rain - procedural glyph rain rasterized on the CPU
//!
//! The rain is a set of columns, each a falling stream of glyphs with a
//! bright head and a fading trail. Every frame the [`RainField`] moves the
//! columns and draws them onto a [`GlyphCanvas`]; the [`RasterBuffer`]
//! canvas keeps its content between frames and only fades it, which is
//! what gives the trails their persistence.
//!
//! ```ignore
//! let mut field = RainField::new(width, height);
//! let mut buffer = RasterBuffer::new(width, height, Box::new(ProceduralGlyphSource::new(16.0)));
//!
//! // Each frame:
//! field.advance_frame(&mut buffer);
//! upload(buffer.pixels());
//! ```

pub mod canvas;
pub mod column;
pub mod field;
pub mod glyphs;
pub mod raster;

pub use canvas::{GlyphCanvas, GlyphDraw, RecordingCanvas, Rgba};
pub use column::{CELL_SIZE, CHARSET, Column, EDGE_MARGIN, column_count, trail_intensity};
pub use field::RainField;
pub use glyphs::{GlyphBitmap, GlyphError, GlyphSource, ProceduralGlyphSource, SwashGlyphSource};
pub use raster::RasterBuffer;
