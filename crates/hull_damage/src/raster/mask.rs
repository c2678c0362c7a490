//! Single-channel mask operations.
use image::{GrayImage, RgbaImage};

use super::mul255;

/// Extracts the alpha channel of an RGBA image.
pub fn alpha_of(img: &RgbaImage) -> GrayImage {
    let data: Vec<u8> = img.as_raw().chunks_exact(4).map(|px| px[3]).collect();
    GrayImage::from_raw(img.width(), img.height(), data)
        .unwrap_or_else(|| GrayImage::new(img.width(), img.height()))
}

/// Binarizes a mask: `255` where `v >= cutoff`, `0` elsewhere.
pub fn threshold(mask: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = mask.clone();
    for v in out.iter_mut() {
        *v = if *v >= cutoff { 255 } else { 0 };
    }
    out
}

/// `dst = dst * other / 255`, pixel-wise.
pub fn multiply_in_place(dst: &mut GrayImage, other: &GrayImage) {
    debug_assert_eq!(dst.dimensions(), other.dimensions());
    for (d, o) in dst.iter_mut().zip(other.iter()) {
        *d = mul255(*d, *o);
    }
}

/// `dst = max(dst, other)`, pixel-wise.
pub fn lighter_in_place(dst: &mut GrayImage, other: &GrayImage) {
    debug_assert_eq!(dst.dimensions(), other.dimensions());
    for (d, o) in dst.iter_mut().zip(other.iter()) {
        *d = (*d).max(*o);
    }
}

/// Saturating `a - b`, pixel-wise.
pub fn subtract(a: &GrayImage, b: &GrayImage) -> GrayImage {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let mut out = a.clone();
    for (d, o) in out.iter_mut().zip(b.iter()) {
        *d = d.saturating_sub(*o);
    }
    out
}

/// Multiplies the alpha channel of `img` by `mask / 255`.
pub fn multiply_alpha(img: &mut RgbaImage, mask: &GrayImage) {
    debug_assert_eq!(img.dimensions(), mask.dimensions());
    for (px, m) in img.chunks_exact_mut(4).zip(mask.iter()) {
        px[3] = mul255(px[3], *m);
    }
}

/// Erases alpha where `hole` is set: `alpha *= (255 - hole) / 255`.
pub fn soft_erase(img: &mut RgbaImage, hole: &GrayImage) {
    debug_assert_eq!(img.dimensions(), hole.dimensions());
    for (px, h) in img.chunks_exact_mut(4).zip(hole.iter()) {
        px[3] = mul255(px[3], 255 - *h);
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, Rgba};

    use super::*;

    #[test]
    fn alpha_of_reads_fourth_channel() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([1, 2, 3, 40]));
        img.put_pixel(1, 0, Rgba([1, 2, 3, 255]));
        let a = alpha_of(&img);
        assert_eq!(a.as_raw(), &vec![40, 255]);
    }

    #[test]
    fn threshold_is_binary() {
        let m = GrayImage::from_raw(4, 1, vec![0, 7, 8, 200]).unwrap();
        assert_eq!(threshold(&m, 8).as_raw(), &vec![0, 0, 255, 255]);
        assert_eq!(threshold(&m, 1).as_raw(), &vec![0, 255, 255, 255]);
    }

    #[test]
    fn lighter_takes_maximum() {
        let mut a = GrayImage::from_raw(3, 1, vec![0, 255, 10]).unwrap();
        let b = GrayImage::from_raw(3, 1, vec![255, 0, 20]).unwrap();
        lighter_in_place(&mut a, &b);
        assert_eq!(a.as_raw(), &vec![255, 255, 20]);
    }

    #[test]
    fn soft_erase_clears_only_marked_pixels() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([9, 9, 9, 255]));
        let mut hole = GrayImage::new(2, 1);
        hole.put_pixel(1, 0, Luma([255]));
        soft_erase(&mut img, &hole);
        assert_eq!(img.get_pixel(0, 0)[3], 255);
        assert_eq!(img.get_pixel(1, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 0)[0], 9);
    }

    #[test]
    fn subtract_saturates_at_zero() {
        let a = GrayImage::from_raw(2, 1, vec![100, 10]).unwrap();
        let b = GrayImage::from_raw(2, 1, vec![40, 50]).unwrap();
        assert_eq!(subtract(&a, &b).as_raw(), &vec![60, 0]);
    }

    #[test]
    fn multiply_alpha_with_binary_mask() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([1, 1, 1, 200]));
        let mask = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        multiply_alpha(&mut img, &mask);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 0)[3], 200);
    }
}
