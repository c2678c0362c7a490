//! Raster primitives over RGBA images and 8-bit masks.
//!
//! The compositor works on [`image::RgbaImage`] buffers and single-channel
//! [`image::GrayImage`] masks of the same size. Operations here are explicit
//! slice passes (threshold, multiply, max, over) instead of per-pixel callbacks.
pub mod composite;
pub mod mask;
pub mod transform;

pub use composite::{alpha_over, has_visible_pixels, scale_alpha};
pub use mask::{
    alpha_of, lighter_in_place, multiply_alpha, multiply_in_place, soft_erase, subtract, threshold,
};
pub use transform::{blur, crop_to, rotate_expand, rotate_quarter, scale_by};

/// Multiplies two 8-bit coverage values as fractions of 255, rounding to nearest.
#[inline]
pub(crate) fn mul255(a: u8, b: u8) -> u8 {
    ((a as u16 * b as u16 + 127) / 255) as u8
}
