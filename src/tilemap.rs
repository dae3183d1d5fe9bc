//! Tile map
//!
//! A two-layer grid of tile specs (background behind, foreground in front)
//! viewed through a pixel camera. Each frame the visible tiles are turned into
//! draw calls for the compositor.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::canvas::{CellType, Rgb, CANVAS_HEIGHT, CANVAS_WIDTH, GRID_HEIGHT, GRID_WIDTH, TILE_SIZE};
use crate::compositor::{DrawCall, Layer};
use crate::sampler::{Paint, TintPair};
use crate::texture::{AssetLibrary, SampleMode};

/// Default level size in tiles (4x4 screens)
pub const LEVEL_DEFAULT_WIDTH: usize = 64;
pub const LEVEL_DEFAULT_HEIGHT: usize = 36;

fn default_kind() -> CellType {
    CellType::Floor
}

fn default_anchor() -> (f32, f32) {
    (0.5, 0.5)
}

/// What occupies one grid slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Asset library key
    pub sprite: String,
    pub primary: Rgb,
    pub secondary: Rgb,
    #[serde(default = "default_kind")]
    pub kind: CellType,
    #[serde(default)]
    pub emits_light: bool,
    /// Sprite placement inside the tile, 0..1 on each axis
    #[serde(default = "default_anchor")]
    pub anchor: (f32, f32),
}

impl TileSpec {
    pub fn new(sprite: impl Into<String>, pair: TintPair, kind: CellType) -> Self {
        Self {
            sprite: sprite.into(),
            primary: pair.primary,
            secondary: pair.secondary,
            kind,
            emits_light: false,
            anchor: default_anchor(),
        }
    }

    pub fn emitting(mut self) -> Self {
        self.emits_light = true;
        self
    }

    pub fn anchored(mut self, ax: f32, ay: f32) -> Self {
        self.anchor = (ax.clamp(0.0, 1.0), ay.clamp(0.0, 1.0));
        self
    }

    pub fn tint(&self) -> TintPair {
        TintPair::new(self.primary, self.secondary)
    }

    /// Compositor layer for this tile on `map_layer`. Foreground air is
    /// scenery and joins the background tiles. Entities are not tiles and get
    /// no layer.
    pub fn draw_layer(&self, map_layer: MapLayer) -> Option<Layer> {
        if map_layer == MapLayer::Background {
            return Some(Layer::BackgroundTiles);
        }
        if self.emits_light {
            return Some(Layer::Lightbulbs);
        }
        match self.kind {
            CellType::Floor | CellType::Hazard | CellType::Water => Some(Layer::Terrain),
            CellType::Collectible => Some(Layer::Collectibles),
            CellType::Particle => Some(Layer::Particles),
            CellType::Air => Some(Layer::BackgroundTiles),
            CellType::Entity => None,
        }
    }
}

/// Which of the two tile grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapLayer {
    Background,
    Foreground,
}

impl MapLayer {
    fn index(self) -> usize {
        match self {
            MapLayer::Background => 0,
            MapLayer::Foreground => 1,
        }
    }
}

/// Sprite offset inside a tile along one axis
#[inline]
pub fn anchor_offset(sprite_px: u32, anchor: f32) -> i32 {
    ((TILE_SIZE as f32 - sprite_px as f32) * anchor) as i32
}

pub struct TileMap {
    width: usize,
    height: usize,
    layers: [Vec<Option<TileSpec>>; 2],
    /// Camera position in cells (top-left of the viewport)
    camera: (i32, i32),
}

impl TileMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layers: [vec![None; width * height], vec![None; width * height]],
            camera: (0, 0),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Put (or with `None`, remove) a tile; out-of-range slots are ignored
    pub fn place(&mut self, layer: MapLayer, x: i32, y: i32, tile: Option<TileSpec>) {
        if let Some(i) = self.index(x, y) {
            self.layers[layer.index()][i] = tile;
        }
    }

    pub fn get(&self, layer: MapLayer, x: i32, y: i32) -> Option<&TileSpec> {
        self.index(x, y)
            .and_then(|i| self.layers[layer.index()][i].as_ref())
    }

    /// Fill a rectangle of slots with copies of `tile`
    pub fn fill(&mut self, layer: MapLayer, x: i32, y: i32, w: i32, h: i32, tile: &TileSpec) {
        for ty in y..y + h {
            for tx in x..x + w {
                self.place(layer, tx, ty, Some(tile.clone()));
            }
        }
    }

    /// Change the grid size, keeping tiles in the overlapping region
    pub fn resize(&mut self, width: usize, height: usize) {
        let mut layers = [vec![None; width * height], vec![None; width * height]];
        for (old, new) in self.layers.iter_mut().zip(layers.iter_mut()) {
            for y in 0..self.height.min(height) {
                for x in 0..self.width.min(width) {
                    new[y * width + x] = old[y * self.width + x].take();
                }
            }
        }
        self.layers = layers;
        self.width = width;
        self.height = height;
        self.set_camera(self.camera.0, self.camera.1);
    }

    pub fn camera(&self) -> (i32, i32) {
        self.camera
    }

    /// Move the camera, clamped so the viewport stays inside the level
    pub fn set_camera(&mut self, x: i32, y: i32) {
        let max_x = (self.width as i32 * TILE_SIZE as i32 - CANVAS_WIDTH as i32).max(0);
        let max_y = (self.height as i32 * TILE_SIZE as i32 - CANVAS_HEIGHT as i32).max(0);
        self.camera = (x.clamp(0, max_x), y.clamp(0, max_y));
    }

    /// Level cell position to canvas position
    pub fn to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.camera.0, y - self.camera.1)
    }

    /// Draw calls for every tile touching the viewport, background first.
    /// Tiles whose sprite is missing from `assets` are skipped.
    pub fn draws<'a>(&self, assets: &'a AssetLibrary) -> Vec<DrawCall<'a>> {
        let ts = TILE_SIZE as i32;
        let (cx, cy) = self.camera;
        let x0 = cx.div_euclid(ts);
        let y0 = cy.div_euclid(ts);
        // One extra column/row when the camera is not tile aligned
        let x1 = x0 + GRID_WIDTH as i32 + i32::from(cx.rem_euclid(ts) != 0);
        let y1 = y0 + GRID_HEIGHT as i32 + i32::from(cy.rem_euclid(ts) != 0);

        let mut calls = Vec::new();
        for map_layer in [MapLayer::Background, MapLayer::Foreground] {
            for ty in y0..y1 {
                for tx in x0..x1 {
                    let Some(tile) = self.get(map_layer, tx, ty) else {
                        continue;
                    };
                    let Some(layer) = tile.draw_layer(map_layer) else {
                        warn!("tile ({}, {}) has kind {:?}, which no tile layer draws", tx, ty, tile.kind);
                        continue;
                    };
                    let Some(asset) = assets.get(&tile.sprite) else {
                        warn!("tile ({}, {}) uses unknown sprite '{}'", tx, ty, tile.sprite);
                        continue;
                    };
                    let (sw, sh) = asset.frame_size();
                    let x = tx * ts - cx + anchor_offset(sw, tile.anchor.0);
                    let y = ty * ts - cy + anchor_offset(sh, tile.anchor.1);
                    let paint = match asset.mode() {
                        SampleMode::Brightness => Paint::Brightness(tile.primary),
                        _ => Paint::Tint(tile.tint()),
                    };
                    let mut call = DrawCall::new(layer, asset, x, y).with_paint(paint);
                    if layer == Layer::Terrain {
                        call.kind = Some(tile.kind);
                    }
                    calls.push(call);
                }
            }
        }
        calls
    }
}

impl Default for TileMap {
    fn default() -> Self {
        Self::new(LEVEL_DEFAULT_WIDTH, LEVEL_DEFAULT_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::{Asset, Texture};

    fn library() -> AssetLibrary {
        let mut lib = AssetLibrary::new();
        lib.insert(
            "block",
            Asset::new(Texture::solid_gray(16, 16, 128), SampleMode::Tint).unwrap(),
        )
        .unwrap();
        lib.insert(
            "gem",
            Asset::new(Texture::solid_gray(8, 8, 255), SampleMode::Tint).unwrap(),
        )
        .unwrap();
        lib
    }

    fn tile(sprite: &str, kind: CellType) -> TileSpec {
        TileSpec::new(sprite, TintPair::default(), kind)
    }

    #[test]
    fn test_place_get_out_of_range() {
        let mut map = TileMap::new(4, 3);
        map.place(MapLayer::Foreground, 1, 2, Some(tile("block", CellType::Floor)));
        map.place(MapLayer::Foreground, 9, 9, Some(tile("block", CellType::Floor)));
        assert!(map.get(MapLayer::Foreground, 1, 2).is_some());
        assert!(map.get(MapLayer::Background, 1, 2).is_none());
        assert!(map.get(MapLayer::Foreground, -1, 0).is_none());
    }

    #[test]
    fn test_resize_keeps_overlap() {
        let mut map = TileMap::new(4, 4);
        map.place(MapLayer::Background, 1, 1, Some(tile("block", CellType::Air)));
        map.place(MapLayer::Background, 3, 3, Some(tile("block", CellType::Air)));
        map.resize(2, 5);
        assert_eq!((map.width(), map.height()), (2, 5));
        assert!(map.get(MapLayer::Background, 1, 1).is_some());
        assert!(map.get(MapLayer::Background, 3, 3).is_none());
    }

    #[test]
    fn test_anchor_offset() {
        assert_eq!(anchor_offset(16, 0.5), 0);
        assert_eq!(anchor_offset(8, 0.5), 4);
        assert_eq!(anchor_offset(8, 1.0), 8);
        assert_eq!(anchor_offset(5, 0.5), 5);
    }

    #[test]
    fn test_camera_clamped_to_level() {
        let mut map = TileMap::new(20, 10);
        map.set_camera(-5, 1000);
        assert_eq!(map.camera(), (0, 16));
        map.set_camera(30, 3);
        assert_eq!(map.camera(), (30, 3));
    }

    #[test]
    fn test_draw_layers_and_placement() {
        let lib = library();
        let mut map = TileMap::new(20, 10);
        map.place(MapLayer::Background, 0, 0, Some(tile("block", CellType::Air)));
        map.place(MapLayer::Foreground, 1, 0, Some(tile("block", CellType::Water)));
        map.place(MapLayer::Foreground, 2, 0, Some(tile("block", CellType::Floor).emitting()));
        map.place(
            MapLayer::Foreground,
            3,
            1,
            Some(tile("gem", CellType::Collectible).anchored(0.5, 1.0)),
        );

        let calls = map.draws(&lib);
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].layer, Layer::BackgroundTiles);
        assert_eq!(calls[1].layer, Layer::Terrain);
        assert_eq!(calls[1].kind(), CellType::Water);
        assert_eq!(calls[2].layer, Layer::Lightbulbs);
        assert_eq!(calls[3].layer, Layer::Collectibles);
        assert_eq!((calls[3].x, calls[3].y), (48 + 4, 16 + 8));
    }

    #[test_log::test]
    fn test_foreground_kinds_route_to_matching_layers() {
        let lib = library();
        let mut map = TileMap::new(8, 2);
        map.place(MapLayer::Foreground, 0, 0, Some(tile("block", CellType::Air)));
        map.place(MapLayer::Foreground, 1, 0, Some(tile("gem", CellType::Particle)));
        map.place(MapLayer::Foreground, 2, 0, Some(tile("block", CellType::Entity)));
        map.place(MapLayer::Foreground, 3, 0, Some(tile("block", CellType::Hazard)));

        let calls = map.draws(&lib);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].layer, Layer::BackgroundTiles);
        assert_eq!(calls[0].kind(), CellType::Air);
        assert_eq!(calls[1].layer, Layer::Particles);
        assert_eq!(calls[1].kind(), CellType::Particle);
        assert_eq!(calls[2].layer, Layer::Terrain);
        assert_eq!(calls[2].kind(), CellType::Hazard);
        assert!(calls.iter().all(|c| c.kind() != CellType::Entity));
        assert_eq!(tile("block", CellType::Entity).draw_layer(MapLayer::Foreground), None);
    }

    #[test]
    fn test_only_visible_tiles_emitted() {
        let lib = library();
        let mut map = TileMap::new(40, 20);
        let block = tile("block", CellType::Floor);
        map.fill(MapLayer::Foreground, 0, 0, 40, 20, &block);

        assert_eq!(map.draws(&lib).len(), GRID_WIDTH * GRID_HEIGHT);

        map.set_camera(8, 8);
        let calls = map.draws(&lib);
        assert_eq!(calls.len(), (GRID_WIDTH + 1) * (GRID_HEIGHT + 1));
        assert_eq!((calls[0].x, calls[0].y), (-8, -8));
    }

    #[test_log::test]
    fn test_unknown_sprite_skipped() {
        let lib = library();
        let mut map = TileMap::new(4, 4);
        map.place(MapLayer::Foreground, 0, 0, Some(tile("missing", CellType::Floor)));
        map.place(MapLayer::Foreground, 1, 0, Some(tile("block", CellType::Hazard)));
        let calls = map.draws(&lib);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind(), CellType::Hazard);
    }

    #[test]
    fn test_tile_spec_json_defaults() {
        let tile: TileSpec =
            serde_json::from_str(r#"{ "sprite": "block", "primary": [1, 2, 3], "secondary": [4, 5, 6] }"#)
                .unwrap();
        assert_eq!(tile.kind, CellType::Floor);
        assert!(!tile.emits_light);
        assert_eq!(tile.anchor, (0.5, 0.5));
        assert_eq!(tile.tint().secondary, Rgb::new(4, 5, 6));
    }
}
