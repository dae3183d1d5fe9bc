use log::warn;

use crate::canvas::{Rgb, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::config::MAX_SCALE;

// ============================================================================
// Utility Functions
// ============================================================================

/// Write ABGR pixel to slice (RGBA8888 little-endian byte order)
#[inline]
fn write_pixel(dest: &mut [u8], r: u8, g: u8, b: u8) {
    dest[0] = 255; // A
    dest[1] = b; // B
    dest[2] = g; // G
    dest[3] = r; // R
}

// ============================================================================
// PixelBuffer
// ============================================================================

/// Bytes needed for a `width` x `height` RGBA8888 buffer, `None` on overflow
#[inline]
fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)?.checked_mul(4)
}

/// RGBA8888 pixel buffer the finished frame is magnified into.
/// Byte order matches an SDL `RGBA8888` streaming texture.
#[derive(Clone)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Buffer sized for the canvas magnified by `scale`, clamped to
    /// `1..=MAX_SCALE`
    pub fn for_scale(scale: u32) -> Self {
        let scale = scale.clamp(1, MAX_SCALE);
        let width = CANVAS_WIDTH as u32 * scale;
        let height = CANVAS_HEIGHT as u32 * scale;
        Self {
            pixels: vec![0; CANVAS_WIDTH * CANVAS_HEIGHT * 4 * (scale * scale) as usize],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocate if the size differs; contents are unspecified afterwards.
    /// Returns false, leaving the buffer untouched, when the size overflows.
    fn ensure_size(&mut self, width: u32, height: u32) -> bool {
        if self.width == width && self.height == height {
            return true;
        }
        let Some(len) = byte_len(width, height) else {
            return false;
        };
        self.pixels = vec![0; len];
        self.width = width;
        self.height = height;
        true
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    /// Calculate byte offset for pixel at (x, y)
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Read a pixel from the buffer (bounds checked)
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<(u8, u8, u8)> {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            Some((
                self.pixels[idx + 3], // R
                self.pixels[idx + 2], // G
                self.pixels[idx + 1], // B
            ))
        } else {
            None
        }
    }

    /// Nearest-neighbor magnify a `src_w` x `src_h` color grid by an integer
    /// `scale`, clamped to `1..=MAX_SCALE`. Each source color becomes a solid
    /// `scale` x `scale` block; the first output row of a block is written
    /// once and copied for the rest. The buffer is resized to
    /// `src_w * scale` x `src_h * scale`; a size that does not fit leaves the
    /// buffer unchanged.
    pub fn magnify_from(&mut self, src: &[Rgb], src_w: usize, src_h: usize, scale: u32) {
        debug_assert_eq!(src.len(), src_w * src_h);
        let scale = scale.clamp(1, MAX_SCALE) as usize;
        let dim = |n: usize| n.checked_mul(scale).and_then(|v| u32::try_from(v).ok());
        let fits = dim(src_w)
            .zip(dim(src_h))
            .is_some_and(|(w, h)| self.ensure_size(w, h));
        if !fits {
            warn!("cannot magnify {}x{} by {}: output too large", src_w, src_h, scale);
            return;
        }
        if src_w == 0 {
            return;
        }

        let stride = src_w * scale * 4;
        for (sy, row) in src.chunks_exact(src_w).enumerate() {
            let block_start = sy * scale * stride;
            {
                let line = &mut self.pixels[block_start..block_start + stride];
                for (sx, c) in row.iter().enumerate() {
                    for k in 0..scale {
                        let idx = (sx * scale + k) * 4;
                        write_pixel(&mut line[idx..idx + 4], c.r, c.g, c.b);
                    }
                }
            }
            for k in 1..scale {
                let dst = block_start + k * stride;
                self.pixels.copy_within(block_start..block_start + stride, dst);
            }
        }
    }

    /// Raw bytes for SDL texture upload
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::for_scale(1)
    }
}
