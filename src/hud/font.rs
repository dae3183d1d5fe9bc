//! Built-in 3x5 bitmap font for HUD counters and labels
//!
//! Each glyph row is a 3-bit mask, leftmost column in the high bit.
//! Lowercase letters render with their uppercase glyphs.

use super::GlyphSource;

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;
/// Horizontal advance including one column of spacing
pub const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

type Glyph = [u8; GLYPH_HEIGHT as usize];

const DIGITS: [Glyph; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

const LETTERS: [Glyph; 26] = [
    [0b010, 0b101, 0b111, 0b101, 0b101], // A
    [0b110, 0b101, 0b110, 0b101, 0b110], // B
    [0b011, 0b100, 0b100, 0b100, 0b011], // C
    [0b110, 0b101, 0b101, 0b101, 0b110], // D
    [0b111, 0b100, 0b110, 0b100, 0b111], // E
    [0b111, 0b100, 0b110, 0b100, 0b100], // F
    [0b011, 0b100, 0b101, 0b101, 0b011], // G
    [0b101, 0b101, 0b111, 0b101, 0b101], // H
    [0b111, 0b010, 0b010, 0b010, 0b111], // I
    [0b001, 0b001, 0b001, 0b101, 0b010], // J
    [0b101, 0b101, 0b110, 0b101, 0b101], // K
    [0b100, 0b100, 0b100, 0b100, 0b111], // L
    [0b101, 0b111, 0b111, 0b101, 0b101], // M
    [0b110, 0b101, 0b101, 0b101, 0b101], // N
    [0b010, 0b101, 0b101, 0b101, 0b010], // O
    [0b110, 0b101, 0b110, 0b100, 0b100], // P
    [0b010, 0b101, 0b101, 0b110, 0b011], // Q
    [0b110, 0b101, 0b110, 0b101, 0b101], // R
    [0b011, 0b100, 0b010, 0b001, 0b110], // S
    [0b111, 0b010, 0b010, 0b010, 0b010], // T
    [0b101, 0b101, 0b101, 0b101, 0b111], // U
    [0b101, 0b101, 0b101, 0b101, 0b010], // V
    [0b101, 0b101, 0b111, 0b111, 0b101], // W
    [0b101, 0b101, 0b010, 0b101, 0b101], // X
    [0b101, 0b101, 0b010, 0b010, 0b010], // Y
    [0b111, 0b001, 0b010, 0b100, 0b111], // Z
];

const SPACE: Glyph = [0; 5];
const COLON: Glyph = [0b000, 0b010, 0b000, 0b010, 0b000];
const DASH: Glyph = [0b000, 0b000, 0b111, 0b000, 0b000];
const DOT: Glyph = [0b000, 0b000, 0b000, 0b000, 0b010];
const SLASH: Glyph = [0b001, 0b001, 0b010, 0b100, 0b100];
const BANG: Glyph = [0b010, 0b010, 0b010, 0b000, 0b010];

/// Look up the bitmap for `ch`
pub fn get_glyph(ch: char) -> Option<&'static Glyph> {
    match ch {
        '0'..='9' => Some(&DIGITS[ch as usize - '0' as usize]),
        'A'..='Z' => Some(&LETTERS[ch as usize - 'A' as usize]),
        'a'..='z' => Some(&LETTERS[ch as usize - 'a' as usize]),
        ' ' => Some(&SPACE),
        ':' => Some(&COLON),
        '-' => Some(&DASH),
        '.' => Some(&DOT),
        '/' => Some(&SLASH),
        '!' => Some(&BANG),
        _ => None,
    }
}

/// Width in cells of `text` drawn with the tiny font
pub fn text_width(text: &str) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        n * GLYPH_ADVANCE - 1
    }
}

/// The built-in font as a glyph source
#[derive(Debug, Clone, Copy, Default)]
pub struct TinyFont;

impl GlyphSource for TinyFont {
    fn glyph_size(&self) -> (u32, u32) {
        (GLYPH_WIDTH, GLYPH_HEIGHT)
    }

    fn advance(&self) -> u32 {
        GLYPH_ADVANCE
    }

    fn glyph_rows(&self, ch: char) -> Option<&[u8]> {
        get_glyph(ch).map(|g| &g[..])
    }
}
