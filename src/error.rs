//! Error types
//!
//! Most of the render core cannot fail at runtime: placement is clipped and light
//! is clamped. What can fail is asset construction (checked once at load time),
//! configuration I/O, and window presentation.

use thiserror::Error;

/// Asset configuration errors, raised when an asset is built, never mid-frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    #[error("texture has zero size ({width}x{height})")]
    EmptyTexture { width: u32, height: u32 },
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height}")]
    DataLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("animation strip width {width} is not a multiple of its height {height}")]
    AnimationStrip { width: u32, height: u32 },
    #[error("duplicate asset name '{0}'")]
    DuplicateName(String),
}

/// Configuration load/save errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("config JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("scale factor must be between 1 and {max}, got {0}", max = crate::config::MAX_SCALE)]
    InvalidScale(u32),
}

/// Presentation surface errors (SDL reports plain strings)
#[derive(Error, Debug)]
#[error("display error: {0}")]
pub struct DisplayError(pub String);

impl From<String> for DisplayError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
