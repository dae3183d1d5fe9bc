//! Frame Finisher
//!
//! Turns the lit canvas into display pixels: every channel is scaled by
//! `light / 128 + 0.5` (unlit cells show at half brightness, full light at
//! about 2.5x, clamped), then the 256x144 grid is magnified with
//! nearest-neighbor sampling so pixel edges stay hard.

use crate::canvas::{Canvas, Rgb, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::display::PixelBuffer;

/// `channel * (light / 128 + 0.5)`, clamped per channel
#[inline]
pub fn modulate(color: Rgb, light: u8) -> Rgb {
    let factor = light as f32 / 128.0 + 0.5;
    color.map_channels(|c| c * factor)
}

/// Light-modulated colors of the whole canvas, row-major
pub fn shade(canvas: &Canvas) -> Vec<Rgb> {
    canvas
        .cells()
        .iter()
        .map(|cell| modulate(cell.color, cell.light))
        .collect()
}

/// Modulate `canvas` and magnify it by `scale` into `surface`
pub fn finish(canvas: &Canvas, surface: &mut PixelBuffer, scale: u32) {
    let shaded = shade(canvas);
    surface.magnify_from(&shaded, CANVAS_WIDTH, CANVAS_HEIGHT, scale);
}
