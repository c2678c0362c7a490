//! Alpha-over compositing on straight-alpha RGBA buffers.
use image::RgbaImage;

/// Composites `src` over `dst` with its top-left corner at `(x, y)`.
///
/// The placement may lie partly or fully outside `dst`; out-of-bounds pixels are
/// clipped. Fully transparent source pixels leave `dst` untouched and fully opaque
/// ones replace it.
pub fn alpha_over(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    let (sw, sh) = (src.width() as i64, src.height() as i64);

    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + sw).min(dw);
    let y_end = (y + sh).min(dh);
    if x_start >= x_end || y_start >= y_end {
        return;
    }

    for dy in y_start..y_end {
        for dx in x_start..x_end {
            let s = src.get_pixel((dx - x) as u32, (dy - y) as u32);
            let sa = s[3];
            if sa == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            if sa == 255 {
                *d = *s;
                continue;
            }

            let sa_f = sa as f32 / 255.0;
            let da_f = d[3] as f32 / 255.0;
            let out_a = sa_f + da_f * (1.0 - sa_f);
            for c in 0..3 {
                let v = (s[c] as f32 * sa_f + d[c] as f32 * da_f * (1.0 - sa_f)) / out_a;
                d[c] = v.round().clamp(0.0, 255.0) as u8;
            }
            d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Multiplies every alpha value by `factor` in [0, 1], truncating.
pub fn scale_alpha(img: &mut RgbaImage, factor: f32) {
    let factor = factor.clamp(0.0, 1.0);
    if factor >= 1.0 {
        return;
    }
    for px in img.chunks_exact_mut(4) {
        px[3] = (px[3] as f32 * factor) as u8;
    }
}

/// `true` when at least one pixel has non-zero alpha.
pub fn has_visible_pixels(img: &RgbaImage) -> bool {
    img.chunks_exact(4).any(|px| px[3] > 0)
}
