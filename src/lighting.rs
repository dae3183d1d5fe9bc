//! Lighting Raytracer
//!
//! Fills in light for every cell the compositor left unlit. A cell gathers
//! `128 - distance` from each full-light air cell within 128 cells that it can
//! see. Seeing a source takes two phases along the line from the cell to the
//! source: first escape into air (cells buried in solid material must reach
//! open space), then travel the rest of the way without meeting Floor, Entity
//! or Hazard.
//!
//! Sources are bucketed per tile so a cell only visits buckets that overlap
//! its radius. Rows can be traced in parallel: workers read a frozen canvas and
//! each writes only its own row of light values.

use log::debug;
use rayon::prelude::*;

use crate::canvas::{Canvas, CellType, CANVAS_HEIGHT, CANVAS_WIDTH, TILE_SIZE};

/// Reach of a light source in cells
pub const LIGHT_RADIUS: f32 = 128.0;

const BUCKET_SIZE: i32 = TILE_SIZE as i32;
const BUCKETS_X: usize = CANVAS_WIDTH.div_ceil(TILE_SIZE);
const BUCKETS_Y: usize = CANVAS_HEIGHT.div_ceil(TILE_SIZE);

// ============================================================================
// Source index
// ============================================================================

/// Light sources bucketed by tile
pub struct LightIndex {
    buckets: Vec<Vec<(i32, i32)>>,
    count: usize,
}

impl LightIndex {
    /// Collect every light-source cell of `canvas`
    pub fn build(canvas: &Canvas) -> Self {
        let mut buckets = vec![Vec::new(); BUCKETS_X * BUCKETS_Y];
        let mut count = 0;
        for (x, y) in canvas.light_sources() {
            let b = (y / BUCKET_SIZE) as usize * BUCKETS_X + (x / BUCKET_SIZE) as usize;
            buckets[b].push((x, y));
            count += 1;
        }
        Self { buckets, count }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Call `f(sx, sy, distance)` for every source strictly within the radius
    pub fn for_each_in_range(&self, x: i32, y: i32, mut f: impl FnMut(i32, i32, f32)) {
        let reach = LIGHT_RADIUS as i32;
        let bx0 = ((x - reach).max(0) / BUCKET_SIZE) as usize;
        let by0 = ((y - reach).max(0) / BUCKET_SIZE) as usize;
        let bx1 = (((x + reach) / BUCKET_SIZE) as usize).min(BUCKETS_X - 1);
        let by1 = (((y + reach) / BUCKET_SIZE) as usize).min(BUCKETS_Y - 1);
        let r2 = LIGHT_RADIUS * LIGHT_RADIUS;

        for by in by0..=by1 {
            for bx in bx0..=bx1 {
                for &(sx, sy) in &self.buckets[by * BUCKETS_X + bx] {
                    let dx = (sx - x) as f32;
                    let dy = (sy - y) as f32;
                    let d2 = dx * dx + dy * dy;
                    if d2 < r2 {
                        f(sx, sy, d2.sqrt());
                    }
                }
            }
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

/// Walk from target `(tx, ty)` toward source `(sx, sy)` and decide whether the
/// source lights the target. Positions are sampled at `max(|dx|, |dy|)` evenly
/// spaced steps and rounded to the nearest cell.
pub fn source_visible(canvas: &Canvas, tx: i32, ty: i32, sx: i32, sy: i32) -> bool {
    let dx = sx - tx;
    let dy = sy - ty;
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        return false;
    }

    // Phase 1 is already over when the target itself is open air
    let mut escaped = canvas.kind_at(tx, ty) == Some(CellType::Air);
    let inv = 1.0 / steps as f32;

    for i in 1..steps {
        let t = i as f32 * inv;
        let px = tx + (dx as f32 * t).round() as i32;
        let py = ty + (dy as f32 * t).round() as i32;
        let Some(cell) = canvas.get(px, py) else {
            return false;
        };
        if !escaped {
            escaped = cell.is(CellType::Air);
        } else if cell.occludes() {
            return false;
        }
    }

    // Reaching the source still inside solid material is not an escape
    escaped
}

/// Light gathered by one cell, clamped into 0..=255
pub fn gather(canvas: &Canvas, index: &LightIndex, x: i32, y: i32) -> u8 {
    let mut total = 0.0f32;
    index.for_each_in_range(x, y, |sx, sy, dist| {
        if source_visible(canvas, x, y, sx, sy) {
            total += LIGHT_RADIUS - dist;
        }
    });
    total.clamp(0.0, 255.0) as u8
}

// ============================================================================
// Raytracer pass
// ============================================================================

/// Counters from the last lighting pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightingStats {
    pub sources: usize,
    pub cells_traced: usize,
    pub cells_lit: usize,
}

/// Per-frame lighting pass
pub struct Raytracer {
    parallel: bool,
    stats: LightingStats,
}

impl Raytracer {
    pub fn new(parallel: bool) -> Self {
        Self {
            parallel,
            stats: LightingStats::default(),
        }
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    pub fn stats(&self) -> LightingStats {
        self.stats
    }

    /// Light every cell whose light is still zero. Cells lit by the compositor
    /// are left as they are; only the light channel is ever written.
    pub fn light(&mut self, canvas: &mut Canvas) {
        let index = LightIndex::build(canvas);
        let mut lights: Vec<u8> = canvas.cells().iter().map(|c| c.light).collect();

        if !index.is_empty() {
            let frozen: &Canvas = canvas;
            let trace_row = |(y, row): (usize, &mut [u8])| {
                for (x, light) in row.iter_mut().enumerate() {
                    if *light == 0 {
                        *light = gather(frozen, &index, x as i32, y as i32);
                    }
                }
            };
            if self.parallel {
                lights.par_chunks_mut(CANVAS_WIDTH).enumerate().for_each(trace_row);
            } else {
                lights.chunks_mut(CANVAS_WIDTH).enumerate().for_each(trace_row);
            }
        }

        let mut stats = LightingStats {
            sources: index.len(),
            ..Default::default()
        };
        for (cell, &light) in canvas.cells_mut().iter_mut().zip(&lights) {
            if cell.light == 0 {
                stats.cells_traced += 1;
                if light > 0 {
                    stats.cells_lit += 1;
                }
                cell.light = light;
            }
        }
        debug!(
            "lighting: {} sources, {} cells traced, {} lit",
            stats.sources, stats.cells_traced, stats.cells_lit
        );
        self.stats = stats;
    }
}

impl Default for Raytracer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Cell, Rgb, FULL_LIGHT};

    fn cell(kind: CellType, light: u8) -> Cell {
        Cell {
            color: Rgb::WHITE,
            light,
            kind: Some(kind),
        }
    }

    fn air_canvas() -> Canvas {
        let mut canvas = Canvas::new();
        for c in canvas.cells_mut() {
            *c = cell(CellType::Air, 0);
        }
        canvas
    }

    #[test]
    fn test_single_source_contribution() {
        let mut canvas = air_canvas();
        canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
        Raytracer::new(false).light(&mut canvas);
        assert_eq!(canvas.light_at(60, 50), 118);
        assert_eq!(canvas.light_at(50, 50), FULL_LIGHT);
        // Beyond the radius
        assert_eq!(canvas.light_at(50 + 130, 50), 0);
    }

    #[test]
    fn test_stacked_sources_clamp_at_255() {
        let mut canvas = air_canvas();
        for x in 100..104 {
            canvas.set(x, 20, cell(CellType::Air, FULL_LIGHT));
        }
        Raytracer::new(false).light(&mut canvas);
        // Four sources within a few cells each contribute ~125
        assert_eq!(canvas.light_at(102, 23), 255);
    }

    #[test]
    fn test_floor_occludes() {
        let mut canvas = air_canvas();
        canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
        canvas.set(55, 50, cell(CellType::Floor, 0));
        Raytracer::new(false).light(&mut canvas);
        assert_eq!(canvas.light_at(60, 50), 0);
        // The wall itself sees the source directly after escaping into air
        assert!(canvas.light_at(55, 50) > 0);
    }

    #[test]
    fn test_non_occluders_let_light_through() {
        for kind in [CellType::Water, CellType::Collectible, CellType::Particle] {
            let mut canvas = air_canvas();
            canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
            canvas.set(55, 50, cell(kind, 0));
            Raytracer::new(false).light(&mut canvas);
            assert_eq!(canvas.light_at(60, 50), 118, "{:?} should not occlude", kind);
        }
    }

    #[test]
    fn test_entity_and_hazard_occlude() {
        for kind in [CellType::Entity, CellType::Hazard] {
            let mut canvas = air_canvas();
            canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
            canvas.set(55, 50, cell(kind, 0));
            Raytracer::new(false).light(&mut canvas);
            assert_eq!(canvas.light_at(60, 50), 0, "{:?} should occlude", kind);
        }
    }

    #[test]
    fn test_floor_adjacent_to_source_cannot_escape() {
        let mut canvas = Canvas::new();
        for c in canvas.cells_mut() {
            *c = cell(CellType::Floor, 0);
        }
        canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
        Raytracer::new(false).light(&mut canvas);
        assert_eq!(canvas.light_at(51, 50), 0);
        assert_eq!(canvas.light_at(50, 49), 0);
    }

    #[test]
    fn test_buried_cell_escapes_through_air() {
        let mut canvas = Canvas::new();
        for c in canvas.cells_mut() {
            *c = cell(CellType::Floor, 0);
        }
        canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
        // Floor target with one air cell between it and the source
        canvas.set(51, 50, cell(CellType::Air, 0));
        Raytracer::new(false).light(&mut canvas);
        assert_eq!(canvas.light_at(52, 50), 126);
        assert!(source_visible(&canvas, 52, 50, 50, 50));

        // Escaping into an air pocket does not help when floor follows it
        canvas.set(47, 50, cell(CellType::Air, 0));
        assert!(!source_visible(&canvas, 44, 50, 50, 50));
    }

    #[test]
    fn test_prelit_cells_untouched() {
        let mut canvas = air_canvas();
        canvas.set(50, 50, cell(CellType::Air, FULL_LIGHT));
        canvas.set(52, 50, cell(CellType::Floor, 7));
        Raytracer::new(false).light(&mut canvas);
        assert_eq!(canvas.light_at(52, 50), 7);
    }

    #[test]
    fn test_no_sources_leaves_canvas_dark() {
        let mut canvas = air_canvas();
        let mut tracer = Raytracer::new(true);
        tracer.light(&mut canvas);
        assert!(canvas.cells().iter().all(|c| c.light == 0));
        assert_eq!(tracer.stats().sources, 0);
        assert_eq!(tracer.stats().cells_lit, 0);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let build = || {
            let mut canvas = air_canvas();
            for x in 0..CANVAS_WIDTH as i32 {
                if x % 7 != 0 {
                    canvas.set(x, 90, cell(CellType::Floor, 0));
                }
            }
            canvas.set(30, 20, cell(CellType::Air, FULL_LIGHT));
            canvas.set(200, 60, cell(CellType::Air, FULL_LIGHT));
            canvas.set(120, 130, cell(CellType::Air, FULL_LIGHT));
            canvas
        };
        let mut serial = build();
        let mut parallel = build();
        Raytracer::new(false).light(&mut serial);
        Raytracer::new(true).light(&mut parallel);
        assert_eq!(serial.cells(), parallel.cells());
    }

    #[test]
    fn test_index_radius_filter() {
        let mut canvas = Canvas::new();
        canvas.set(0, 0, cell(CellType::Air, FULL_LIGHT));
        canvas.set(255, 143, cell(CellType::Air, FULL_LIGHT));
        let index = LightIndex::build(&canvas);
        assert_eq!(index.len(), 2);

        let mut seen = Vec::new();
        index.for_each_in_range(10, 0, |sx, sy, d| seen.push((sx, sy, d)));
        assert_eq!(seen, vec![(0, 0, 10.0)]);

        // Exactly 128 away is outside
        seen.clear();
        index.for_each_in_range(128, 0, |sx, sy, d| seen.push((sx, sy, d)));
        assert!(seen.is_empty());
    }
}
