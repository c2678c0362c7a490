//! Geometric transforms and blur for stencil tiles, stamps and masks.
use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

use crate::sampling::cell::QuarterTurn;

/// Rotates an image by a right angle. Four quarter turns are pixel-exact identity.
pub fn rotate_quarter(img: &RgbaImage, turn: QuarterTurn) -> RgbaImage {
    match turn {
        QuarterTurn::R0 => img.clone(),
        QuarterTurn::R90 => imageops::rotate90(img),
        QuarterTurn::R180 => imageops::rotate180(img),
        QuarterTurn::R270 => imageops::rotate270(img),
    }
}

/// Crops the top-left `width × height` region, clamped to the image size.
pub fn crop_to(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let w = width.min(img.width());
    let h = height.min(img.height());
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    imageops::crop_imm(img, 0, 0, w, h).to_image()
}

/// Resizes by `factor` with a Lanczos3 filter; each side is at least one pixel.
pub fn scale_by(img: &RgbaImage, factor: f32) -> RgbaImage {
    let nw = ((img.width() as f32 * factor) as u32).max(1);
    let nh = ((img.height() as f32 * factor) as u32).max(1);
    if (nw, nh) == img.dimensions() {
        return img.clone();
    }
    imageops::resize(img, nw, nh, FilterType::Lanczos3)
}

/// Gaussian blur of a mask; `radius` is the standard deviation in pixels.
pub fn blur(mask: &GrayImage, radius: f32) -> GrayImage {
    if radius <= 0.0 {
        return mask.clone();
    }
    imageops::blur(mask, radius)
}

/// Rotates by `degrees` counter-clockwise about the center, growing the canvas so
/// no corner is clipped. Sampling is bilinear on premultiplied color.
pub fn rotate_expand(img: &RgbaImage, degrees: f32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || degrees.rem_euclid(360.0).abs() < 1e-4 {
        return img.clone();
    }

    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let (wf, hf) = (w as f32, h as f32);
    // Shave float noise so exact right angles don't grow by a pixel.
    let nw = ((wf * cos.abs() + hf * sin.abs()) - 1e-3).ceil().max(1.0) as u32;
    let nh = ((wf * sin.abs() + hf * cos.abs()) - 1e-3).ceil().max(1.0) as u32;

    let src_center = Vec2::new(wf * 0.5, hf * 0.5);
    let dst_center = Vec2::new(nw as f32 * 0.5, nh as f32 * 0.5);
    // Image rows grow downward, so a visual counter-clockwise turn is a negative
    // angle in pixel space; the inverse map therefore rotates by +theta.
    let inverse = Vec2::from_angle(theta);

    let mut out = RgbaImage::new(nw, nh);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - dst_center;
        let s = inverse.rotate(d) + src_center - Vec2::splat(0.5);
        *px = sample_bilinear(img, s);
    }
    out
}

fn sample_bilinear(img: &RgbaImage, p: Vec2) -> Rgba<u8> {
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let fx = p.x - x0;
    let fy = p.y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let mut acc = [0.0f32; 4];
    for (dx, dy, wgt) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        if wgt <= 0.0 {
            continue;
        }
        let (sx, sy) = (x0 + dx, y0 + dy);
        if sx < 0 || sy < 0 || sx >= img.width() as i64 || sy >= img.height() as i64 {
            continue;
        }
        let Rgba([r, g, b, a]) = *img.get_pixel(sx as u32, sy as u32);
        let af = a as f32 * wgt;
        acc[0] += r as f32 * af;
        acc[1] += g as f32 * af;
        acc[2] += b as f32 * af;
        acc[3] += af;
    }

    if acc[3] <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let unpremul = |c: f32| (c / acc[3]).round().clamp(0.0, 255.0) as u8;
    Rgba([
        unpremul(acc[0]),
        unpremul(acc[1]),
        unpremul(acc[2]),
        acc[3].round().clamp(0.0, 255.0) as u8,
    ])
}
