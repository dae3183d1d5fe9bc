//! HUD / Overlay Pass
//!
//! Drawn after lighting. Every HUD write sets the cell's color and forces its
//! light to full, so overlay content never goes through the raytracer. Cell
//! types are left alone; the HUD is presentation, not world state.

pub mod font;

pub use font::TinyFont;

use crate::canvas::{Canvas, Rgb, CANVAS_HEIGHT, CANVAS_WIDTH, FULL_LIGHT};
use crate::texture::Texture;

/// Supplier of glyph bitmaps for HUD text
pub trait GlyphSource {
    /// Glyph cell size (width, height). Rows are 8-bit masks, so columns
    /// past the eighth are never drawn.
    fn glyph_size(&self) -> (u32, u32);

    /// Horizontal cursor advance per character
    fn advance(&self) -> u32;

    /// One bitmask per glyph row, leftmost column in bit `width - 1`.
    /// `None` for characters the font cannot draw (they still advance).
    fn glyph_rows(&self, ch: char) -> Option<&[u8]>;
}

/// One piece of overlay content
#[derive(Clone)]
pub enum HudItem<'a> {
    /// Text drawn through a glyph source
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Rgb,
    },
    /// Pre-rendered color region; transparent texels are skipped
    Image { x: i32, y: i32, image: &'a Texture },
    /// Solid rectangle (bars, backdrops)
    Rect {
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: Rgb,
    },
}

impl<'a> HudItem<'a> {
    pub fn text(x: i32, y: i32, text: impl Into<String>, color: Rgb) -> Self {
        HudItem::Text {
            x,
            y,
            text: text.into(),
            color,
        }
    }
}

/// Write a fully lit colored cell, leaving its type alone
#[inline]
fn put(canvas: &mut Canvas, x: i32, y: i32, color: Rgb) {
    if let Some(cell) = canvas.get_mut(x, y) {
        cell.color = color;
        cell.light = FULL_LIGHT;
    }
}

/// Draw `text` with its top-left at `(x, y)`
pub fn draw_text(canvas: &mut Canvas, font: &dyn GlyphSource, x: i32, y: i32, text: &str, color: Rgb) {
    let gw = font.glyph_size().0.min(u8::BITS);
    let mut cursor_x = x;
    for ch in text.chars() {
        if let Some(rows) = font.glyph_rows(ch) {
            for (row, &bits) in rows.iter().enumerate() {
                for col in 0..gw {
                    if bits & (1 << (gw - 1 - col)) != 0 {
                        put(canvas, cursor_x.saturating_add(col as i32), y.saturating_add(row as i32), color);
                    }
                }
            }
        }
        cursor_x = cursor_x.saturating_add(font.advance() as i32);
    }
}

/// Draw all `items` in order
pub fn draw_hud(canvas: &mut Canvas, font: &dyn GlyphSource, items: &[HudItem]) {
    for item in items {
        match item {
            HudItem::Text { x, y, text, color } => draw_text(canvas, font, *x, *y, text, *color),
            HudItem::Image { x, y, image } => {
                for v in 0..image.height() {
                    for u in 0..image.width() {
                        let (r, g, b, a) = image.texel(u, v);
                        if a != 0 {
                            put(canvas, x.saturating_add(u as i32), y.saturating_add(v as i32), Rgb::new(r, g, b));
                        }
                    }
                }
            },
            HudItem::Rect { x, y, w, h, color } => {
                let x1 = x.saturating_add(i32::try_from(*w).unwrap_or(i32::MAX));
                let y1 = y.saturating_add(i32::try_from(*h).unwrap_or(i32::MAX));
                for py in (*y).max(0)..y1.min(CANVAS_HEIGHT as i32) {
                    for px in (*x).max(0)..x1.min(CANVAS_WIDTH as i32) {
                        put(canvas, px, py, *color);
                    }
                }
            },
        }
    }
}
