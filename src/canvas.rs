//! Pixel Canvas
//!
//! The per-frame cell grid: 256x144 cells, each carrying an RGB color, an 8-bit
//! light value and a semantic cell type. Everything the compositor draws lands
//! here, the raytracer fills in light, and the finisher turns it into pixels.

use serde::{Deserialize, Serialize};

/// Logical canvas width in cells
pub const CANVAS_WIDTH: usize = 256;
/// Logical canvas height in cells
pub const CANVAS_HEIGHT: usize = 144;
/// Edge length of one level tile in cells
pub const TILE_SIZE: usize = 16;
/// Viewport size in tiles (16x9)
pub const GRID_WIDTH: usize = CANVAS_WIDTH / TILE_SIZE;
pub const GRID_HEIGHT: usize = CANVAS_HEIGHT / TILE_SIZE;

/// Light value used for forced-lit cells and emitters
pub const FULL_LIGHT: u8 = 255;

// ============================================================================
// Color
// ============================================================================

/// 8-bit RGB color, serialized as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "(u8, u8, u8)", into = "(u8, u8, u8)")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply `f` to each channel as f32 and clamp back into 0..=255 (truncating)
    #[inline]
    pub fn map_channels(self, f: impl Fn(f32) -> f32) -> Self {
        let c = |v: u8| f(v as f32).clamp(0.0, 255.0) as u8;
        Self::new(c(self.r), c(self.g), c(self.b))
    }

    #[inline]
    pub fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for (u8, u8, u8) {
    fn from(c: Rgb) -> Self {
        c.as_tuple()
    }
}

// ============================================================================
// Cell Type
// ============================================================================

/// Semantic category of a cell, driving occlusion and reflection rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Floor,
    Air,
    Water,
    Entity,
    Collectible,
    Hazard,
    Particle,
}

impl CellType {
    /// Floor, Entity and Hazard block light in the line-of-sight phase
    #[inline]
    pub fn occludes(self) -> bool {
        matches!(self, CellType::Floor | CellType::Entity | CellType::Hazard)
    }

    /// Water and Floor continue a reflection scan
    #[inline]
    pub fn continues_reflection(self) -> bool {
        matches!(self, CellType::Water | CellType::Floor)
    }
}

// ============================================================================
// Cell
// ============================================================================

/// One canvas element. `kind` is `None` until something is drawn over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub color: Rgb,
    pub light: u8,
    pub kind: Option<CellType>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        color: Rgb::BLACK,
        light: 0,
        kind: None,
    };

    #[inline]
    pub fn is(&self, kind: CellType) -> bool {
        self.kind == Some(kind)
    }

    /// An Air cell at full light acts as a raytrace emitter
    #[inline]
    pub fn is_light_source(&self) -> bool {
        self.is(CellType::Air) && self.light == FULL_LIGHT
    }

    #[inline]
    pub fn occludes(&self) -> bool {
        self.kind.is_some_and(CellType::occludes)
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// Fixed-size 256x144 cell grid, row-major
pub struct Canvas {
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            cells: vec![Cell::EMPTY; CANVAS_WIDTH * CANVAS_HEIGHT],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        CANVAS_WIDTH
    }

    #[inline]
    pub fn height(&self) -> usize {
        CANVAS_HEIGHT
    }

    /// Reset every cell: black, unlit, untyped
    pub fn clear(&mut self) {
        self.cells.fill(Cell::EMPTY);
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < CANVAS_WIDTH as i32 && y >= 0 && y < CANVAS_HEIGHT as i32
    }

    #[inline]
    fn index(x: usize, y: usize) -> usize {
        y * CANVAS_WIDTH + x
    }

    /// Read a cell (bounds checked)
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            Some(&self.cells[Self::index(x as usize, y as usize)])
        } else {
            None
        }
    }

    /// Mutable cell access (bounds checked)
    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            Some(&mut self.cells[Self::index(x as usize, y as usize)])
        } else {
            None
        }
    }

    /// Cell type at (x, y); `None` when out of bounds or never drawn
    #[inline]
    pub fn kind_at(&self, x: i32, y: i32) -> Option<CellType> {
        self.get(x, y).and_then(|c| c.kind)
    }

    /// Light at (x, y), 0 when out of bounds
    #[inline]
    pub fn light_at(&self, x: i32, y: i32) -> u8 {
        self.get(x, y).map_or(0, |c| c.light)
    }

    /// Overwrite a whole cell (bounds checked)
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if let Some(c) = self.get_mut(x, y) {
            *c = cell;
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Iterate all light-source coordinates
    pub fn light_sources(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().enumerate().filter_map(|(i, c)| {
            c.is_light_source()
                .then(|| ((i % CANVAS_WIDTH) as i32, (i / CANVAS_WIDTH) as i32))
        })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}
