//! Burn rim around punched holes.
use image::{GrayImage, RgbaImage};

use crate::raster::{blur, subtract};

/// Edge band just outside the hole mask: blur by `width`, remove the hole itself,
/// then soften by half the width.
pub fn rim_band(hole_mask: &GrayImage, width: u32) -> GrayImage {
    if width == 0 {
        return GrayImage::new(hole_mask.width(), hole_mask.height());
    }
    let spread = blur(hole_mask, width as f32);
    let ring = subtract(&spread, hole_mask);
    blur(&ring, (width / 2).max(1) as f32)
}

/// Darkens color around hole edges in place. Alpha is left untouched.
///
/// Each pixel is blended toward black with weight `band / 255 * darkness`.
/// A zero width or darkness is a no-op.
pub fn add_burn_rim(img: &mut RgbaImage, hole_mask: &GrayImage, width: u32, darkness: f32) {
    let darkness = if darkness.is_nan() {
        0.0
    } else {
        darkness.clamp(0.0, 1.0)
    };
    if width == 0 || darkness <= 0.0 {
        return;
    }
    debug_assert_eq!(img.dimensions(), hole_mask.dimensions());

    let band = rim_band(hole_mask, width);
    for (px, b) in img.chunks_exact_mut(4).zip(band.iter()) {
        if *b == 0 {
            continue;
        }
        let keep = 1.0 - (*b as f32 / 255.0) * darkness;
        for c in &mut px[..3] {
            *c = (*c as f32 * keep).round().clamp(0.0, 255.0) as u8;
        }
    }
}
