//! Font loading and discovery
//!
//! Uses fontdb to find a system font by family name with fallback support.
//! The glyph source is built from the first family that loads and covers
//! the rain's character set; otherwise procedural glyphs are used.

use crate::config::FontConfig;
use fontdb::{Database, Family, Query, Style, Weight};
use glyphfall_rain::{CELL_SIZE, GlyphSource, ProceduralGlyphSource, SwashGlyphSource};

/// Load system fonts into a fresh database
fn font_db() -> Database {
    let mut db = Database::new();
    db.load_system_fonts();
    log::info!("Loaded {} system fonts", db.faces().count());
    db
}

/// Load regular-weight font data by family name
fn load_font(db: &Database, family: &str) -> Option<Vec<u8>> {
    let query = Query {
        families: &[Family::Name(family)],
        weight: Weight::NORMAL,
        style: Style::Normal,
        ..Default::default()
    };

    let face_id = db.query(&query)?;
    let face = db.face(face_id)?;

    match &face.source {
        fontdb::Source::File(path) => std::fs::read(path).ok(),
        fontdb::Source::Binary(data) => Some(data.as_ref().as_ref().to_vec()),
        fontdb::Source::SharedFile(_path, data) => Some(data.as_ref().as_ref().to_vec()),
    }
}

/// Pick a glyph source from a family list (first usable match wins)
fn glyph_source_from_families(db: &Database, families: &[String]) -> Option<SwashGlyphSource> {
    for family in families {
        let Some(data) = load_font(db, family) else {
            log::debug!("Font family '{}' not installed", family);
            continue;
        };

        match SwashGlyphSource::new(data, CELL_SIZE as f32) {
            Ok(source) => {
                log::info!("Using font: {}", family);
                return Some(source);
            }
            Err(e) => log::warn!("Skipping font '{}': {}", family, e),
        }
    }
    None
}

/// Build the glyph source for the rain from config
pub fn load_glyph_source(config: &FontConfig) -> Box<dyn GlyphSource> {
    let db = font_db();
    match glyph_source_from_families(&db, &config.family) {
        Some(source) => Box::new(source),
        None => {
            log::info!("Using procedural glyphs (no usable system font found)");
            Box::new(ProceduralGlyphSource::new(CELL_SIZE as f32))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_family_is_skipped() {
        let db = Database::new();
        let families = vec!["Definitely Not A Font 12345".to_string()];
        assert!(glyph_source_from_families(&db, &families).is_none());
    }

    #[test]
    fn test_empty_family_list_falls_back() {
        let config = FontConfig { family: vec![] };
        let mut source = load_glyph_source(&config);
        assert!(source.glyph('A').is_some());
    }
}
