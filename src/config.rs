//! Configuration management for glyphfall
//!
//! Loads config from ~/.config/glyphfall/config.toml with sensible defaults.
//! The rain itself has no knobs; only the window and the glyph font are
//! configurable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Font configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Font family names in order of preference (fallback chain)
    /// First available font with katakana coverage is used; falls back to
    /// procedural glyphs if none is found
    pub family: Vec<String>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: vec![
                "Noto Sans Mono CJK JP".to_string(),
                "Sarasa Mono J".to_string(),
                "MS Gothic".to_string(),
                "Osaka".to_string(),
                "Hiragino Sans".to_string(),
            ],
        }
    }
}

/// Window configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial inner width in logical pixels
    pub width: u32,
    /// Initial inner height in logical pixels
    pub height: u32,
    /// Start in borderless fullscreen mode
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glyphfall".to_string(),
            width: 1280,
            height: 720,
            fullscreen: false,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub font: FontConfig,
}

impl Config {
    /// Get the config directory path (~/.config/glyphfall)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("glyphfall"))
    }

    /// Get the config file path (~/.config/glyphfall/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Load config from the default location, or return defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::info!("Could not determine config path, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from `path`; any failure falls back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[window]
width = 800
fullscreen = true
"#,
        )
        .unwrap();

        let config = Config::load_from(&path);

        assert_eq!(config.window.width, 800);
        assert!(config.window.fullscreen);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.window.title, "glyphfall");
        assert_eq!(config.font, FontConfig::default());
    }

    #[test]
    fn test_font_families_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[font]\nfamily = [\"Unifont\"]\n").unwrap();

        let config = Config::load_from(&path);

        assert_eq!(config.font.family, vec!["Unifont".to_string()]);
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[window\nwidth = ").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_wrong_type_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[window]\nwidth = \"wide\"\n").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_config_path_layout() {
        if let Some(path) = Config::config_path() {
            assert!(path.ends_with(".config/glyphfall/config.toml"));
        }
    }
}
