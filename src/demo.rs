//! Demo world
//!
//! Procedural grayscale assets and a small cave level with a reflecting pool,
//! lamps, coins, a wandering player and a slime. Drives the windowed binary.

use crate::canvas::{CellType, Rgb, CANVAS_WIDTH, TILE_SIZE};
use crate::compositor::{DrawCall, FrameScene, Layer};
use crate::config::RenderConfig;
use crate::error::AssetError;
use crate::hud::{font, HudItem};
use crate::sampler::{Paint, TintPair};
use crate::texture::{Asset, AssetLibrary, SampleMode, Texture};
use crate::tilemap::{MapLayer, TileMap, TileSpec};

const LEVEL_WIDTH: usize = 32;
const LEVEL_HEIGHT: usize = 9;
/// Tile row the player walks on
const GROUND_ROW: i32 = 7;
const HERO_SIZE: u32 = 12;
const HERO_FRAMES: u32 = 4;
const MAX_SPARKS: usize = 64;
const LAMP_COLUMNS: [i32; 4] = [4, 12, 19, 27];

// ============================================================================
// RNG
// ============================================================================

/// Xorshift64, deterministic so the demo replays identically
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Random f32 in [0, 1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() & 0xFFFFFF) as f32 / 0x1000000 as f32
    }

    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

// ============================================================================
// Assets
// ============================================================================

/// Strip of `frames` square walking frames: a body with legs that swing
fn walker_strip(size: u32, frames: u32) -> Texture {
    let mut tex = Texture::new(size * frames, size);
    for f in 0..frames {
        let ox = f * size;
        let stride = [0i32, 1, 0, -1][(f % 4) as usize];
        for y in 1..size * 2 / 3 {
            for x in 3..size - 3 {
                // Lighter face on the right so mirroring is visible
                let v = if x > size / 2 && y < size / 3 { 230 } else { 140 };
                tex.set_gray(ox + x, y, v);
            }
        }
        for y in size * 2 / 3..size {
            let left = (size / 2) as i32 - 2 - stride;
            let right = (size / 2) as i32 + 1 + stride;
            for leg in [left, right] {
                if leg >= 0 && (leg as u32) < size {
                    tex.set_gray(ox + leg as u32, y, 60);
                }
            }
        }
    }
    tex
}

/// Upward-pointing spikes filling the lower half of a tile
fn spikes(size: u32) -> Texture {
    let mut tex = Texture::new(size, size);
    let teeth = 4;
    let tooth = size / teeth;
    for y in size / 2..size {
        let rise = (y - size / 2) as f32 / (size / 2) as f32;
        for x in 0..size {
            let local = (x % tooth) as f32 - (tooth as f32 - 1.0) * 0.5;
            if local.abs() <= rise * tooth as f32 * 0.5 {
                tex.set_gray(x, y, (120.0 + 135.0 * (1.0 - rise)) as u8);
            }
        }
    }
    tex
}

/// Water surface: gentle diagonal ripples around mid gray
fn ripples(size: u32) -> Texture {
    let mut tex = Texture::new(size, size);
    for y in 0..size {
        for x in 0..size {
            let phase = (x + y * 2) as f32 * 0.7;
            tex.set_gray(x, y, (128.0 + phase.sin() * 48.0) as u8);
        }
    }
    tex
}

/// Every asset the demo level references
pub fn build_assets() -> Result<AssetLibrary, AssetError> {
    let ts = TILE_SIZE as u32;
    let mut lib = AssetLibrary::new();
    lib.insert("brick", Asset::new(Texture::checkerboard(ts, 4, 90, 150), SampleMode::Tint)?)?;
    lib.insert("block", Asset::new(Texture::checkerboard(ts, 8, 170, 210), SampleMode::Tint)?)?;
    lib.insert("water", Asset::new(ripples(ts), SampleMode::Reflection)?)?;
    lib.insert("spikes", Asset::new(spikes(ts), SampleMode::Tint)?)?;
    lib.insert("lamp", Asset::new(Texture::disc(6), SampleMode::Tint)?)?;
    lib.insert("coin", Asset::new(Texture::disc(7), SampleMode::Tint)?)?;
    lib.insert("hero", Asset::new(walker_strip(HERO_SIZE, HERO_FRAMES), SampleMode::Animation)?)?;
    lib.insert("slime", Asset::new(Texture::disc(10), SampleMode::Tint)?)?;
    lib.insert("spark", Asset::new(Texture::solid_gray(1, 1, 255), SampleMode::Brightness)?)?;
    lib.insert("swing", Asset::new(Texture::disc(9), SampleMode::Tint)?)?;
    Ok(lib)
}

/// Cave level lit only by its lamps, with a pool in the middle
pub fn build_level(config: &RenderConfig) -> TileMap {
    let mut map = TileMap::new(LEVEL_WIDTH, LEVEL_HEIGHT);
    let w = LEVEL_WIDTH as i32;
    let palette = |i: usize| config.palette.get(i).copied().unwrap_or(Rgb::WHITE);

    let back = TileSpec::new("brick", config.background_tint, CellType::Air);
    map.fill(MapLayer::Background, 0, 0, w, LEVEL_HEIGHT as i32, &back);

    let ground = TileSpec::new("block", config.terrain_tint, CellType::Floor);
    map.fill(MapLayer::Foreground, 0, GROUND_ROW, w, 2, &ground);
    // Cave ceiling
    map.fill(MapLayer::Foreground, 0, 0, w, 1, &ground);

    let water = TileSpec::new("water", TintPair::new(config.water_color, palette(11)), CellType::Water);
    map.fill(MapLayer::Foreground, 14, GROUND_ROW, 4, 1, &water);

    let spike = TileSpec::new("spikes", TintPair::new(palette(3), palette(5)), CellType::Hazard);
    map.fill(MapLayer::Foreground, 24, GROUND_ROW - 1, 2, 1, &spike);

    let lamp = TileSpec::new("lamp", TintPair::new(palette(13), palette(14)), CellType::Air)
        .emitting()
        .anchored(0.5, 0.0);
    for x in LAMP_COLUMNS {
        map.place(MapLayer::Foreground, x, 1, Some(lamp.clone()));
    }

    let coin = TileSpec::new("coin", TintPair::new(palette(13), palette(14)), CellType::Collectible)
        .anchored(0.5, 0.75);
    for x in [6, 16, 21, 29] {
        map.place(MapLayer::Foreground, x, GROUND_ROW - 2, Some(coin.clone()));
    }

    map
}

// ============================================================================
// World
// ============================================================================

/// A short-lived lamp ember
#[derive(Clone, Copy)]
struct Spark {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    life: f32,
}

pub struct DemoWorld {
    assets: AssetLibrary,
    map: TileMap,
    entity_paint: Paint,
    time: f32,
    player_x: f32,
    player_dir: f32,
    enemy_x: f32,
    sparks: Vec<Spark>,
    rng: Rng,
}

impl DemoWorld {
    pub fn new(config: &RenderConfig) -> Result<Self, AssetError> {
        Ok(Self {
            assets: build_assets()?,
            map: build_level(config),
            entity_paint: Paint::Tint(config.entity_tint()),
            time: 0.0,
            player_x: 40.0,
            player_dir: 1.0,
            enemy_x: 330.0,
            sparks: Vec::with_capacity(MAX_SPARKS),
            rng: Rng::new(0x5EED),
        })
    }

    pub fn assets(&self) -> &AssetLibrary {
        &self.assets
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    fn ground_y(&self) -> f32 {
        (GROUND_ROW * TILE_SIZE as i32) as f32
    }

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        self.time += dt;

        let level_px = (LEVEL_WIDTH * TILE_SIZE) as f32;
        self.player_x += self.player_dir * 40.0 * dt;
        if self.player_x < 8.0 || self.player_x > level_px - 24.0 {
            self.player_dir = -self.player_dir;
            self.player_x = self.player_x.clamp(8.0, level_px - 24.0);
        }
        self.enemy_x = 330.0 + (self.time * 0.8).sin() * 24.0;

        // Embers drift down from the lamps
        for spark in &mut self.sparks {
            spark.x += spark.vx * dt;
            spark.y += spark.vy * dt;
            spark.vy += 30.0 * dt;
            spark.life -= dt;
        }
        self.sparks.retain(|s| s.life > 0.0);
        if self.sparks.len() < MAX_SPARKS && self.rng.next_f32() < 0.5 {
            let lamp_x = LAMP_COLUMNS[(self.rng.next_u64() % LAMP_COLUMNS.len() as u64) as usize];
            self.sparks.push(Spark {
                x: (lamp_x * TILE_SIZE as i32) as f32 + 8.0,
                y: TILE_SIZE as f32 + 6.0,
                vx: self.rng.range_f32(-12.0, 12.0),
                vy: self.rng.range_f32(0.0, 10.0),
                life: self.rng.range_f32(0.5, 1.5),
            });
        }

        let cam = self.player_x as i32 - CANVAS_WIDTH as i32 / 2;
        self.map.set_camera(cam, 0);
    }

    /// Everything to draw this frame
    pub fn scene(&self) -> FrameScene<'_> {
        let mut scene = FrameScene::new();
        let (cx, cy) = self.map.camera();
        let ground = self.ground_y() as i32 - cy;

        scene.extend(self.map.draws(&self.assets));

        if let Some(spark) = self.assets.get("spark") {
            for s in &self.sparks {
                let (x, y) = self.map.to_screen(s.x as i32, s.y as i32);
                scene.push(
                    DrawCall::new(Layer::Particles, spark, x, y)
                        .with_paint(Paint::Brightness(Rgb::new(160, 110, 40))),
                );
            }
        }

        if let Some(slime) = self.assets.get("slime") {
            scene.push(DrawCall::new(Layer::Enemies, slime, self.enemy_x as i32 - cx, ground - 10).with_paint(self.entity_paint));
        }

        if let Some(hero) = self.assets.get("hero") {
            let px = self.player_x as i32 - cx;
            let frame = (self.time * 8.0) as u32;
            scene.push(
                DrawCall::new(Layer::Player, hero, px, ground - HERO_SIZE as i32)
                    .with_paint(self.entity_paint)
                    .with_frame(frame)
                    .mirrored(self.player_dir < 0.0),
            );
            // Swing for a third of every two seconds
            if self.time % 2.0 < 0.66 {
                if let Some(swing) = self.assets.get("swing") {
                    let sx = if self.player_dir < 0.0 { px - 8 } else { px + HERO_SIZE as i32 - 1 };
                    scene.push(
                        DrawCall::new(Layer::WeaponSwing, swing, sx, ground - HERO_SIZE as i32)
                            .with_paint(Paint::Tint(TintPair::new(Rgb::new(120, 120, 140), Rgb::WHITE))),
                    );
                }
            }
        }

        scene
    }

    /// Overlay: fps counter and a frame-time bar
    pub fn hud(&self, fps: f32, frame_ms: f32) -> Vec<HudItem<'_>> {
        let label = format!("FPS {}", fps.round() as u32);
        let bar = (frame_ms * 4.0).clamp(1.0, 60.0) as u32;
        vec![
            HudItem::Rect {
                x: 2,
                y: 2,
                w: font::text_width(&label) + 2,
                h: font::GLYPH_HEIGHT + 2,
                color: Rgb::BLACK,
            },
            HudItem::text(3, 3, label, Rgb::new(255, 220, 120)),
            HudItem::Rect {
                x: 2,
                y: 10,
                w: bar,
                h: 1,
                color: if frame_ms > 16.7 { Rgb::RED } else { Rgb::new(20, 200, 160) },
            },
        ]
    }
}
