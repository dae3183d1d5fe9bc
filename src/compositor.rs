//! Layer Compositor
//!
//! Draws a frame's content into the canvas in a fixed layer order. Each layer
//! decides the cell type it writes and what happens to the light channel;
//! transparent texels never touch the destination. Water drawn with a
//! reflection asset leaves a site behind that is resolved after every world
//! layer is down, so the reflected cells are already final.

use log::trace;

use crate::canvas::{Canvas, Cell, CellType, CANVAS_HEIGHT, CANVAS_WIDTH, FULL_LIGHT};
use crate::sampler::{self, Sample, SampleParams};
use crate::texture::Asset;

// ============================================================================
// Layers
// ============================================================================

/// What a layer does to the light channel of the cells it writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightPolicy {
    /// Set to full light; excluded from raytracing
    Force,
    /// Set to zero so the raytracer lights it
    Reset,
    /// Leave whatever earlier layers wrote
    Keep,
}

/// Draw order of a frame. Variants are listed back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    BackgroundImage,
    BackgroundTiles,
    Lightbulbs,
    Terrain,
    Collectibles,
    Particles,
    Enemies,
    Player,
    WeaponSwing,
}

impl Layer {
    pub const ALL: [Layer; 9] = [
        Layer::BackgroundImage,
        Layer::BackgroundTiles,
        Layer::Lightbulbs,
        Layer::Terrain,
        Layer::Collectibles,
        Layer::Particles,
        Layer::Enemies,
        Layer::Player,
        Layer::WeaponSwing,
    ];

    /// Cell type written when the draw call does not pick one
    pub fn default_kind(self) -> CellType {
        match self {
            Layer::BackgroundImage | Layer::BackgroundTiles | Layer::Lightbulbs => CellType::Air,
            Layer::Terrain => CellType::Floor,
            Layer::Collectibles => CellType::Collectible,
            Layer::Particles => CellType::Particle,
            Layer::Enemies | Layer::Player | Layer::WeaponSwing => CellType::Entity,
        }
    }

    pub fn light_policy(self) -> LightPolicy {
        match self {
            Layer::BackgroundImage | Layer::Lightbulbs | Layer::WeaponSwing => LightPolicy::Force,
            Layer::BackgroundTiles => LightPolicy::Reset,
            _ => LightPolicy::Keep,
        }
    }

    /// Characters share one gray sprite set recolored through the entity tint
    pub fn uses_entity_tint(self) -> bool {
        matches!(self, Layer::Enemies | Layer::Player)
    }
}

// ============================================================================
// Draw calls
// ============================================================================

/// One textured rectangle placed by the scene provider
#[derive(Clone, Copy)]
pub struct DrawCall<'a> {
    pub layer: Layer,
    pub asset: &'a Asset,
    /// Top-left destination cell; may lie partly or fully off-canvas
    pub x: i32,
    pub y: i32,
    pub params: SampleParams,
    /// Overrides the layer's default type (terrain: Floor, Hazard or Water)
    pub kind: Option<CellType>,
}

impl<'a> DrawCall<'a> {
    pub fn new(layer: Layer, asset: &'a Asset, x: i32, y: i32) -> Self {
        Self {
            layer,
            asset,
            x,
            y,
            params: SampleParams::default(),
            kind: None,
        }
    }

    /// Terrain draw of a specific type
    pub fn terrain(kind: CellType, asset: &'a Asset, x: i32, y: i32) -> Self {
        Self {
            kind: Some(kind),
            ..Self::new(Layer::Terrain, asset, x, y)
        }
    }

    pub fn with_params(mut self, params: SampleParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_paint(mut self, paint: sampler::Paint) -> Self {
        self.params.paint = paint;
        self
    }

    pub fn with_frame(mut self, frame: u32) -> Self {
        self.params.frame = frame;
        self
    }

    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.params.mirror = mirror;
        self
    }

    #[inline]
    pub fn kind(&self) -> CellType {
        self.kind.unwrap_or_else(|| self.layer.default_kind())
    }
}

/// Everything the scene provider wants drawn this frame
#[derive(Default)]
pub struct FrameScene<'a> {
    draws: Vec<DrawCall<'a>>,
}

impl<'a> FrameScene<'a> {
    pub fn new() -> Self {
        Self { draws: Vec::new() }
    }

    pub fn push(&mut self, call: DrawCall<'a>) {
        self.draws.push(call);
    }

    pub fn extend(&mut self, calls: impl IntoIterator<Item = DrawCall<'a>>) {
        self.draws.extend(calls);
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Draw calls in layer order; submission order is kept within a layer
    pub fn ordered(&self) -> Vec<&DrawCall<'a>> {
        let mut calls: Vec<_> = self.draws.iter().collect();
        calls.sort_by_key(|c| c.layer);
        calls
    }
}

// ============================================================================
// Compositor
// ============================================================================

/// Counters from the last composite, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    pub draws: usize,
    pub cells_written: usize,
    pub reflection_sites: usize,
    pub reflections_resolved: usize,
}

/// Rasterizes draw calls into a canvas and tracks pending water reflections
pub struct Compositor {
    /// Water gray per cell for cells last written by a reflection asset
    reflection_sites: Vec<Option<f32>>,
    stats: CompositeStats,
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            reflection_sites: vec![None; CANVAS_WIDTH * CANVAS_HEIGHT],
            stats: CompositeStats::default(),
        }
    }

    /// Forget the previous frame's reflection sites and counters
    pub fn reset(&mut self) {
        self.reflection_sites.fill(None);
        self.stats = CompositeStats::default();
    }

    pub fn stats(&self) -> CompositeStats {
        self.stats
    }

    /// Draw every call of `scene` in layer order
    pub fn composite(&mut self, canvas: &mut Canvas, scene: &FrameScene) {
        for call in scene.ordered() {
            self.draw(canvas, call);
        }
    }

    /// Draw one call, clipped to the canvas
    pub fn draw(&mut self, canvas: &mut Canvas, call: &DrawCall) {
        self.stats.draws += 1;

        let (fw, fh) = call.asset.frame_size();
        let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
        let u0 = (-call.x).max(0);
        let v0 = (-call.y).max(0);
        let u1 = (fw as i32).min(cw - call.x);
        let v1 = (fh as i32).min(ch - call.y);
        if u0 >= u1 || v0 >= v1 {
            trace!("{:?} draw at ({}, {}) is fully off-canvas", call.layer, call.x, call.y);
            return;
        }
        if u0 > 0 || v0 > 0 || u1 < fw as i32 || v1 < fh as i32 {
            trace!("{:?} draw at ({}, {}) clipped", call.layer, call.x, call.y);
        }

        let kind = call.kind();
        let policy = call.layer.light_policy();
        let mut params = call.params;
        if call.layer.uses_entity_tint() {
            params.paint = params.paint.as_entity();
        }

        for v in v0..v1 {
            let y = call.y + v;
            for u in u0..u1 {
                let x = call.x + u;
                let Some(sample) = sampler::sample(call.asset, &params, u as u32, v as u32) else {
                    continue;
                };
                let idx = y as usize * canvas.width() + x as usize;
                let (color, site) = match sample {
                    Sample::Color(color) => (color, None),
                    Sample::Reflect { fallback, gray } => (fallback, Some(gray)),
                };
                let cell = &mut canvas.cells_mut()[idx];
                let light = match policy {
                    LightPolicy::Force => FULL_LIGHT,
                    LightPolicy::Reset => 0,
                    LightPolicy::Keep => cell.light,
                };
                *cell = Cell {
                    color,
                    light,
                    kind: Some(kind),
                };
                self.reflection_sites[idx] = site;
                self.stats.cells_written += 1;
            }
        }
    }

    /// Redirect every water cell drawn with a reflection asset to its mirrored
    /// source. Rows are processed top-down so a reflected source is itself final.
    /// Cells overdrawn by a later non-water layer are skipped.
    pub fn resolve_reflections(&mut self, canvas: &mut Canvas) {
        let width = canvas.width();
        for idx in 0..self.reflection_sites.len() {
            let Some(gray) = self.reflection_sites[idx] else {
                continue;
            };
            self.stats.reflection_sites += 1;
            let (x, y) = ((idx % width) as i32, (idx / width) as i32);
            if canvas.kind_at(x, y) != Some(CellType::Water) {
                continue;
            }
            let Some(reflection) = sampler::reflect(canvas, x, y, gray) else {
                continue;
            };
            let (sx, sy) = reflection.source;
            if let Some(&source) = canvas.get(sx, sy) {
                if let Some(cell) = canvas.get_mut(x, y) {
                    cell.color = source.color;
                    cell.light = source.light;
                }
                self.stats.reflections_resolved += 1;
            }
        }
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Rgb;
    use crate::sampler::{Paint, TintPair};
    use crate::texture::{SampleMode, Texture};

    fn solid(size: u32, gray: u8, mode: SampleMode) -> Asset {
        Asset::new(Texture::solid_gray(size, size, gray), mode).unwrap()
    }

    #[test]
    fn test_layers_are_ordered_back_to_front() {
        let mut sorted = Layer::ALL;
        sorted.sort();
        assert_eq!(sorted, Layer::ALL);
        assert!(Layer::BackgroundImage < Layer::Terrain);
        assert!(Layer::Player < Layer::WeaponSwing);
    }

    #[test]
    fn test_scene_orders_by_layer_and_keeps_submission_order() {
        let a = solid(1, 0, SampleMode::Tint);
        let mut scene = FrameScene::new();
        scene.push(DrawCall::new(Layer::Player, &a, 1, 0));
        scene.push(DrawCall::new(Layer::BackgroundImage, &a, 2, 0));
        scene.push(DrawCall::new(Layer::Player, &a, 3, 0));
        let xs: Vec<i32> = scene.ordered().iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![2, 1, 3]);
    }

    #[test]
    fn test_light_policies() {
        let a = solid(2, 255, SampleMode::Tint);
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();

        comp.draw(&mut canvas, &DrawCall::new(Layer::BackgroundImage, &a, 0, 0));
        assert_eq!(canvas.light_at(0, 0), FULL_LIGHT);
        assert_eq!(canvas.kind_at(0, 0), Some(CellType::Air));

        // Terrain keeps the light already present
        comp.draw(&mut canvas, &DrawCall::terrain(CellType::Hazard, &a, 0, 0));
        assert_eq!(canvas.light_at(1, 1), FULL_LIGHT);
        assert_eq!(canvas.kind_at(1, 1), Some(CellType::Hazard));

        // Background tiles drop back to unlit air
        comp.draw(&mut canvas, &DrawCall::new(Layer::BackgroundTiles, &a, 0, 0));
        assert_eq!(canvas.light_at(1, 1), 0);
        assert_eq!(canvas.kind_at(1, 1), Some(CellType::Air));

        comp.draw(&mut canvas, &DrawCall::new(Layer::WeaponSwing, &a, 0, 0));
        assert_eq!(canvas.light_at(0, 1), FULL_LIGHT);
        assert_eq!(canvas.kind_at(0, 1), Some(CellType::Entity));
    }

    #[test]
    fn test_transparent_texture_leaves_cell_untouched() {
        let clear = Asset::new(Texture::new(4, 4), SampleMode::Tint).unwrap();
        let mut canvas = Canvas::new();
        let before = Cell {
            color: Rgb::new(9, 8, 7),
            light: 77,
            kind: Some(CellType::Collectible),
        };
        canvas.set(1, 1, before);

        let mut comp = Compositor::new();
        comp.draw(&mut canvas, &DrawCall::new(Layer::WeaponSwing, &clear, 0, 0));
        assert_eq!(*canvas.get(1, 1).unwrap(), before);
        assert_eq!(comp.stats().cells_written, 0);
    }

    #[test]
    fn test_draw_clips_at_canvas_edges() {
        let a = solid(16, 128, SampleMode::Tint);
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();
        comp.draw(&mut canvas, &DrawCall::new(Layer::Particles, &a, -8, 140));
        // 8 columns x 4 rows survive
        assert_eq!(comp.stats().cells_written, 32);
        assert_eq!(canvas.kind_at(7, 143), Some(CellType::Particle));
        assert_eq!(canvas.kind_at(8, 143), None);

        comp.draw(&mut canvas, &DrawCall::new(Layer::Particles, &a, 300, 0));
        assert_eq!(comp.stats().cells_written, 32);
    }

    #[test]
    fn test_entity_layers_force_red_secondary() {
        let a = solid(1, 255, SampleMode::Tint);
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();
        let paint = Paint::Tint(TintPair::new(Rgb::new(0, 0, 200), Rgb::WHITE));

        comp.draw(&mut canvas, &DrawCall::new(Layer::Enemies, &a, 0, 0).with_paint(paint));
        comp.draw(&mut canvas, &DrawCall::new(Layer::Collectibles, &a, 1, 0).with_paint(paint));
        assert_eq!(canvas.get(0, 0).unwrap().color, Rgb::RED);
        assert_eq!(canvas.get(1, 0).unwrap().color, Rgb::WHITE);
    }

    #[test]
    fn test_reflection_copies_color_and_light() {
        let sky = solid(1, 255, SampleMode::Tint);
        let water = Asset::new(
            Texture::from_gray_alpha(1, 1, &[128], &[255]).unwrap(),
            SampleMode::Reflection,
        )
        .unwrap();
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();

        let marker = Cell {
            color: Rgb::new(1, 2, 3),
            light: FULL_LIGHT,
            kind: Some(CellType::Air),
        };
        for y in 0..20 {
            comp.draw(&mut canvas, &DrawCall::new(Layer::BackgroundTiles, &sky, 10, y));
        }
        canvas.set(10, 4, marker);
        for y in 8..=10 {
            comp.draw(&mut canvas, &DrawCall::terrain(CellType::Water, &water, 10, y));
        }
        comp.resolve_reflections(&mut canvas);

        // gray 128/255 is just above 0.5, offset rounds to 0 for d = 3
        let cell = canvas.get(10, 10).unwrap();
        assert_eq!(cell.color, marker.color);
        assert_eq!(cell.light, FULL_LIGHT);
        assert_eq!(cell.kind, Some(CellType::Water));
        assert_eq!(comp.stats().reflection_sites, 3);
    }

    #[test]
    fn test_reflection_falls_back_at_top_edge() {
        let water = Asset::new(Texture::solid_gray(1, 4, 0), SampleMode::Reflection).unwrap();
        let base = Rgb::new(0, 60, 120);
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();
        comp.draw(
            &mut canvas,
            &DrawCall::terrain(CellType::Water, &water, 0, 0).with_paint(Paint::Brightness(base)),
        );
        comp.resolve_reflections(&mut canvas);
        assert_eq!(canvas.get(0, 3).unwrap().color, Rgb::BLACK);
        assert_eq!(canvas.light_at(0, 3), 0);
        assert_eq!(comp.stats().reflections_resolved, 0);
    }

    #[test]
    fn test_overdrawn_water_is_not_reflected() {
        let sky = solid(1, 255, SampleMode::Tint);
        let water = Asset::new(Texture::solid_gray(1, 1, 128), SampleMode::Reflection).unwrap();
        let crab = solid(1, 0, SampleMode::Tint);
        let mut canvas = Canvas::new();
        let mut comp = Compositor::new();
        for y in 0..10 {
            comp.draw(&mut canvas, &DrawCall::new(Layer::BackgroundImage, &sky, 0, y));
        }
        comp.draw(&mut canvas, &DrawCall::terrain(CellType::Water, &water, 0, 9));
        comp.draw(&mut canvas, &DrawCall::new(Layer::Enemies, &crab, 0, 9));
        comp.resolve_reflections(&mut canvas);
        assert_eq!(canvas.kind_at(0, 9), Some(CellType::Entity));
        assert_eq!(comp.stats().reflections_resolved, 0);
    }
}
