//! Texture Sampler
//!
//! Stateless conversion of one source texel into a destination color, or, for
//! water, into a position redirection that is resolved once the cells above the
//! water are final.
//!
//! # Modes
//! - `Tint` - gray lerps primary -> secondary
//! - `Animation` - picks a square frame out of a strip, then tints
//! - `Brightness` - gray scales one base color, 0.5 = unchanged
//! - `Reflection` - water; samples the canvas above instead of the texture

use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Rgb};
use crate::texture::{Asset, SampleMode};

// ============================================================================
// Color rules
// ============================================================================

/// Two-color ramp used by Tint and Animation modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TintPair {
    pub primary: Rgb,
    pub secondary: Rgb,
}

impl TintPair {
    pub const fn new(primary: Rgb, secondary: Rgb) -> Self {
        Self { primary, secondary }
    }

    /// Entity variant: secondary is pinned to pure red so one gray sprite can be
    /// recolored per character through its primary alone
    pub const fn entity(primary: Rgb) -> Self {
        Self::new(primary, Rgb::RED)
    }

    /// Same pair with the secondary replaced by red
    pub const fn as_entity(self) -> Self {
        Self::entity(self.primary)
    }
}

impl Default for TintPair {
    fn default() -> Self {
        Self::new(Rgb::BLACK, Rgb::WHITE)
    }
}

/// `primary + g * (secondary - primary)` per channel
#[inline]
pub fn tint(g: f32, pair: TintPair) -> Rgb {
    let lerp = |a: u8, b: u8| {
        let v = a as f32 + g * (b as f32 - a as f32);
        v.clamp(0.0, 255.0) as u8
    };
    Rgb::new(
        lerp(pair.primary.r, pair.secondary.r),
        lerp(pair.primary.g, pair.secondary.g),
        lerp(pair.primary.b, pair.secondary.b),
    )
}

/// `color * (g * 2)` per channel, clamped
#[inline]
pub fn brightness(g: f32, color: Rgb) -> Rgb {
    let factor = g * 2.0;
    color.map_channels(|c| c * factor)
}

/// Color rule supplied by the scene for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Paint {
    Tint(TintPair),
    Brightness(Rgb),
}

impl Paint {
    #[inline]
    pub fn apply(self, g: f32) -> Rgb {
        match self {
            Paint::Tint(pair) => tint(g, pair),
            Paint::Brightness(color) => brightness(g, color),
        }
    }

    /// Force the entity tint variant. Brightness paints are left alone.
    pub fn as_entity(self) -> Self {
        match self {
            Paint::Tint(pair) => Paint::Tint(pair.as_entity()),
            other => other,
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Tint(TintPair::default())
    }
}

// ============================================================================
// Per-texel sampling
// ============================================================================

/// Per-draw sampling parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SampleParams {
    pub paint: Paint,
    /// Animation frame index (ignored by other modes)
    pub frame: u32,
    /// Mirror horizontally inside the frame (facing left)
    pub mirror: bool,
}

/// Result of sampling one opaque texel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Final color for the destination cell
    Color(Rgb),
    /// Water: fallback color now, redirect later using `gray`
    Reflect { fallback: Rgb, gray: f32 },
}

/// Sample `asset` at frame-local `(u, v)`. Returns `None` for transparent texels
/// and coordinates outside the frame.
pub fn sample(asset: &Asset, params: &SampleParams, u: u32, v: u32) -> Option<Sample> {
    let (fw, fh) = asset.frame_size();
    if u >= fw || v >= fh {
        return None;
    }
    let u = if params.mirror { fw - 1 - u } else { u };
    let tx = asset.frame_origin(params.frame) + u;
    let g = asset.texture().gray(tx, v)?;

    Some(match asset.mode() {
        SampleMode::Tint | SampleMode::Animation | SampleMode::Brightness => {
            Sample::Color(params.paint.apply(g))
        },
        SampleMode::Reflection => Sample::Reflect {
            fallback: params.paint.apply(g),
            gray: g,
        },
    })
}

// ============================================================================
// Reflection geometry
// ============================================================================

/// Outcome of a reflection scan for one water cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reflection {
    /// Rows between the water cell and the first non-water, non-floor cell
    pub distance: i32,
    /// Column offset of the reflected source
    pub dx: i32,
    /// Canvas cell whose color and light are reused
    pub source: (i32, i32),
}

/// `round((g - 0.5) * d * 2)`, halves rounding away from zero
#[inline]
pub fn reflection_offset(g: f32, distance: i32) -> i32 {
    ((g - 0.5) * distance as f32 * 2.0).round() as i32
}

/// Scan upward from water cell `(x, y)` for the reflection boundary and locate
/// the mirrored source. `None` when the scan runs off the top of the canvas or
/// the mirrored row lies above it.
pub fn reflect(canvas: &Canvas, x: i32, y: i32, g: f32) -> Option<Reflection> {
    let mut d = 1;
    loop {
        let sy = y - d;
        if sy < 0 {
            return None;
        }
        match canvas.kind_at(x, sy) {
            Some(kind) if kind.continues_reflection() => d += 1,
            _ => break,
        }
    }

    let source_y = y - 2 * d;
    if source_y < 0 {
        return None;
    }
    let dx = reflection_offset(g, d);
    let source_x = (x + dx).clamp(0, canvas.width() as i32 - 1);
    Some(Reflection {
        distance: d,
        dx,
        source: (source_x, source_y),
    })
}
