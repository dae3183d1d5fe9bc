//! Render configuration
//!
//! Colors, magnification and lighting options, stored as JSON. Every field has
//! a default so partial files load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::canvas::Rgb;
use crate::error::ConfigError;
use crate::sampler::TintPair;

/// Default nearest-neighbor magnification (256x144 -> 1024x576)
pub const DEFAULT_SCALE: u32 = 4;
/// Largest accepted magnification (4096x2304)
pub const MAX_SCALE: u32 = 16;

/// Sixteen-color base palette for tints
pub const PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(32, 32, 32),
    Rgb::new(64, 64, 64),
    Rgb::new(96, 96, 96),
    Rgb::new(160, 160, 160),
    Rgb::new(224, 224, 224),
    Rgb::new(255, 255, 255),
    Rgb::new(110, 74, 38),
    Rgb::new(150, 99, 60),
    Rgb::new(200, 170, 120),
    Rgb::new(30, 120, 255),
    Rgb::new(20, 200, 160),
    Rgb::new(200, 40, 40),
    Rgb::new(255, 180, 40),
    Rgb::new(255, 220, 120),
    Rgb::new(180, 80, 255),
];

fn default_scale() -> u32 {
    DEFAULT_SCALE
}

fn default_true() -> bool {
    true
}

fn default_terrain_tint() -> TintPair {
    TintPair::new(PALETTE[7], PALETTE[9])
}

fn default_background_tint() -> TintPair {
    TintPair::new(PALETTE[0], PALETTE[2])
}

fn default_entity_primary() -> Rgb {
    PALETTE[10]
}

fn default_water_color() -> Rgb {
    Rgb::new(20, 60, 140)
}

fn default_palette() -> Vec<Rgb> {
    PALETTE.to_vec()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Integer magnification factor for the display surface
    #[serde(default = "default_scale")]
    pub scale: u32,
    #[serde(default = "default_true")]
    pub vsync: bool,
    /// Trace lighting rows on the rayon pool
    #[serde(default = "default_true")]
    pub parallel_lighting: bool,
    /// Generic tile/terrain tint
    #[serde(default = "default_terrain_tint")]
    pub terrain_tint: TintPair,
    /// Darker pair so background tiles read as further away
    #[serde(default = "default_background_tint")]
    pub background_tint: TintPair,
    /// Primary of the entity tint (secondary is always red)
    #[serde(default = "default_entity_primary")]
    pub entity_primary: Rgb,
    /// Dark end of the water tint, seen where no reflection resolves
    #[serde(default = "default_water_color")]
    pub water_color: Rgb,
    #[serde(default = "default_palette")]
    pub palette: Vec<Rgb>,
}

impl RenderConfig {
    /// Entity tint pair derived from `entity_primary`
    pub fn entity_tint(&self) -> TintPair {
        TintPair::entity(self.entity_primary)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SCALE).contains(&self.scale) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            vsync: true,
            parallel_lighting: true,
            terrain_tint: default_terrain_tint(),
            background_tint: default_background_tint(),
            entity_primary: default_entity_primary(),
            water_color: default_water_color(),
            palette: default_palette(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = RenderConfig::from_json("{}").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = RenderConfig::from_json(
            r#"{ "scale": 2, "entity_primary": [0, 255, 0], "parallel_lighting": false }"#,
        )
        .unwrap();
        assert_eq!(config.scale, 2);
        assert!(!config.parallel_lighting);
        assert_eq!(config.entity_tint().secondary, Rgb::RED);
        assert_eq!(config.entity_tint().primary, Rgb::new(0, 255, 0));
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(matches!(
            RenderConfig::from_json(r#"{ "scale": 0 }"#),
            Err(ConfigError::InvalidScale(0))
        ));
    }

    #[test]
    fn test_oversized_scale_rejected() {
        assert!(matches!(
            RenderConfig::from_json(r#"{ "scale": 5000 }"#),
            Err(ConfigError::InvalidScale(5000))
        ));
        assert!(RenderConfig::from_json(&format!(r#"{{ "scale": {} }}"#, MAX_SCALE)).is_ok());
    }

    #[test]
    fn test_save_load_file() {
        let path = std::env::temp_dir().join(format!("pixelsmash-config-{}.json", std::process::id()));
        let mut config = RenderConfig::default();
        config.scale = 6;
        config.save(&path).unwrap();
        let loaded = RenderConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            RenderConfig::load("/nonexistent/pixelsmash.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
