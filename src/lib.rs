//! pixelsmash: a tile-based 2D software renderer with per-pixel raytraced
//! lighting on a fixed 256x144 canvas.
//!
//! A frame goes through [`FramePipeline::render`]: layered compositing with
//! four texture sampling modes, water reflection resolve, the lighting
//! raytracer, a HUD overlay at full light, and light modulation plus
//! nearest-neighbor magnification into a [`PixelBuffer`].

pub mod canvas;
pub mod compositor;
pub mod config;
pub mod demo;
pub mod display;
pub mod error;
pub mod finisher;
pub mod hud;
pub mod lighting;
pub mod pipeline;
pub mod sampler;
pub mod texture;
pub mod tilemap;
pub mod timing;

pub use canvas::{Canvas, Cell, CellType, Rgb, CANVAS_HEIGHT, CANVAS_WIDTH, TILE_SIZE};
pub use compositor::{Compositor, DrawCall, FrameScene, Layer};
pub use config::RenderConfig;
pub use display::PixelBuffer;
pub use error::{AssetError, ConfigError, DisplayError, Error, Result};
pub use hud::{GlyphSource, HudItem, TinyFont};
pub use lighting::Raytracer;
pub use pipeline::FramePipeline;
pub use sampler::{Paint, SampleParams, TintPair};
pub use texture::{Asset, AssetLibrary, SampleMode, Texture};
pub use tilemap::{MapLayer, TileMap, TileSpec};
