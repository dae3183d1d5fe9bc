//! Texture System
//!
//! Read-only texture storage plus the sampling mode each asset is declared with.
//! Textures keep RGBA texels; grayscale assets are read from the red channel and
//! an alpha of zero marks a transparent texel that must never be drawn.

use std::collections::HashMap;

use crate::error::AssetError;

/// A texture stored as RGBA pixels
#[derive(Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>, // RGBA format, 4 bytes per pixel
}

impl Texture {
    /// Create a new fully transparent texture
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        }
    }

    /// Create texture from raw RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyTexture { width, height });
        }
        let expected = (width * height * 4) as usize;
        if data.len() != expected {
            return Err(AssetError::DataLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: data,
        })
    }

    /// Create a grayscale texture from one gray byte and one alpha byte per texel
    pub fn from_gray_alpha(
        width: u32,
        height: u32,
        gray: &[u8],
        alpha: &[u8],
    ) -> Result<Self, AssetError> {
        let count = (width * height) as usize;
        if gray.len() != count || alpha.len() != count {
            return Err(AssetError::DataLength {
                width,
                height,
                expected: count,
                actual: gray.len().min(alpha.len()),
            });
        }
        let data = gray
            .iter()
            .zip(alpha)
            .flat_map(|(&v, &a)| [v, v, v, a])
            .collect();
        Self::from_rgba(width, height, data)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Set a pixel in the texture
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8, a: u8) {
        if x < self.width && y < self.height {
            let idx = ((y * self.width + x) * 4) as usize;
            self.pixels[idx] = r;
            self.pixels[idx + 1] = g;
            self.pixels[idx + 2] = b;
            self.pixels[idx + 3] = a;
        }
    }

    /// Set an opaque gray texel
    #[inline]
    pub fn set_gray(&mut self, x: u32, y: u32, v: u8) {
        self.set_pixel(x, y, v, v, v, 255);
    }

    /// Raw RGBA texel. Caller guarantees bounds.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        let idx = ((y * self.width + x) * 4) as usize;
        (
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    /// Gray value in 0.0..=1.0 (red channel), `None` for transparent texels
    #[inline]
    pub fn gray(&self, x: u32, y: u32) -> Option<f32> {
        let (r, _, _, a) = self.texel(x, y);
        (a != 0).then(|| r as f32 / 255.0)
    }

    #[inline]
    pub fn is_transparent(&self, x: u32, y: u32) -> bool {
        self.texel(x, y).3 == 0
    }
}

// ============================================================================
// Sampling modes and assets
// ============================================================================

/// How an asset's texels are interpreted, fixed when the asset is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Gray ramps between a primary and a secondary color
    Tint,
    /// Horizontal strip of square frames, each tinted like `Tint`
    Animation,
    /// Gray scales a single base color (0.5 = unchanged)
    Brightness,
    /// Water: gray steers where the cell reflects from
    Reflection,
}

/// A texture paired with its sampling mode
#[derive(Clone)]
pub struct Asset {
    texture: Texture,
    mode: SampleMode,
    frames: u32,
}

impl Asset {
    /// Validate `texture` against `mode`. Animation strips must be an integer
    /// number of square frames wide.
    pub fn new(texture: Texture, mode: SampleMode) -> Result<Self, AssetError> {
        let (w, h) = (texture.width(), texture.height());
        if w == 0 || h == 0 {
            return Err(AssetError::EmptyTexture {
                width: w,
                height: h,
            });
        }
        let frames = match mode {
            SampleMode::Animation => {
                if w % h != 0 {
                    return Err(AssetError::AnimationStrip {
                        width: w,
                        height: h,
                    });
                }
                w / h
            },
            _ => 1,
        };
        Ok(Self {
            texture,
            mode,
            frames,
        })
    }

    #[inline]
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    #[inline]
    pub fn mode(&self) -> SampleMode {
        self.mode
    }

    /// Number of animation frames (1 for non-animated assets)
    #[inline]
    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    /// Footprint of one drawn frame in cells
    #[inline]
    pub fn frame_size(&self) -> (u32, u32) {
        match self.mode {
            SampleMode::Animation => (self.texture.height(), self.texture.height()),
            _ => (self.texture.width(), self.texture.height()),
        }
    }

    /// Texel column where `frame` starts (wraps past the last frame)
    #[inline]
    pub fn frame_origin(&self, frame: u32) -> u32 {
        match self.mode {
            SampleMode::Animation => (frame % self.frames) * self.texture.height(),
            _ => 0,
        }
    }
}

/// Named asset store consulted by the tile map
#[derive(Default)]
pub struct AssetLibrary {
    assets: HashMap<String, Asset>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, asset: Asset) -> Result<(), AssetError> {
        let name = name.into();
        if self.assets.contains_key(&name) {
            return Err(AssetError::DuplicateName(name));
        }
        self.assets.insert(name, asset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

// ============================================================================
// Procedural Texture Generators
// ============================================================================

impl Texture {
    /// Opaque texture of a single gray value
    pub fn solid_gray(width: u32, height: u32, v: u8) -> Self {
        let mut tex = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                tex.set_gray(x, y, v);
            }
        }
        tex
    }

    /// Gray checkerboard alternating between `a` and `b`
    pub fn checkerboard(size: u32, tile_size: u32, a: u8, b: u8) -> Self {
        let mut tex = Self::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let checker = ((x / tile_size) + (y / tile_size)) % 2 == 0;
                tex.set_gray(x, y, if checker { a } else { b });
            }
        }
        tex
    }

    /// Filled disc on a transparent background; brighter towards the center
    pub fn disc(size: u32) -> Self {
        let mut tex = Self::new(size, size);
        let c = (size as f32 - 1.0) * 0.5;
        let radius = size as f32 * 0.5;
        for y in 0..size {
            for x in 0..size {
                let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
                if d < radius {
                    let v = (255.0 * (1.0 - d / radius * 0.6)) as u8;
                    tex.set_gray(x, y, v);
                }
            }
        }
        tex
    }
}
