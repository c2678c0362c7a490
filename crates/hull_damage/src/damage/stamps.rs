//! Seeded decal scatter (scorch marks, shrapnel).
use std::borrow::Borrow;

use image::{GrayImage, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::damage::params::DecalParams;
use crate::raster::{
    alpha_over, multiply_alpha, rotate_expand, scale_alpha, scale_by, threshold,
};
use crate::sampling::{rand_index, rand_int_inclusive, rand_uniform};

/// Restriction masks are binarized at this value before use.
pub const RESTRICT_CUTOFF: u8 = 128;

/// Settings for one scatter pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampSpec {
    /// Number of stamps to draw.
    pub count: usize,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Stamps turn by a uniform angle in `[-max_rotation, max_rotation]` degrees.
    pub max_rotation: f32,
    /// Alpha multiplier in [0, 1].
    pub severity: f32,
    pub seed: u64,
}

impl StampSpec {
    pub fn from_decal(params: &DecalParams, count: usize, seed: u64) -> Self {
        Self {
            count,
            min_scale: params.min_scale,
            max_scale: params.max_scale,
            max_rotation: params.max_rotation,
            severity: params.severity,
            seed,
        }
    }
}

/// Scatters `spec.count` stamps onto a transparent `size` layer.
///
/// Every stamp draws, in order from a single stream seeded with `spec.seed`: its
/// source index, scale, rotation, then x and y. Placement spans
/// `[-w/2, W - w/2]` using the scaled, unrotated size. Where `restrict` is given,
/// the layer alpha is cut to the pixels where the mask is at least 128.
///
/// Returns a fully transparent layer when `stamps` is empty, the count is zero or
/// the severity is zero.
pub fn stamp_layer<S: Borrow<RgbaImage>>(
    size: (u32, u32),
    stamps: &[S],
    spec: &StampSpec,
    restrict: Option<&GrayImage>,
) -> RgbaImage {
    let (w, h) = size;
    let mut layer = RgbaImage::new(w, h);
    if stamps.is_empty() || spec.count == 0 || spec.severity <= 0.0 {
        return layer;
    }

    let lo = spec.min_scale.min(spec.max_scale);
    let hi = spec.min_scale.max(spec.max_scale);
    let mut rng = StdRng::seed_from_u64(spec.seed);

    for _ in 0..spec.count {
        let src: &RgbaImage = stamps[rand_index(&mut rng, stamps.len())].borrow();
        let factor = rand_uniform(&mut rng, lo, hi).clamp(lo, hi).min(1.0);
        let scaled = scale_by(src, factor);
        let angle = rand_uniform(&mut rng, -spec.max_rotation, spec.max_rotation);
        let (nw, nh) = (scaled.width() as i64, scaled.height() as i64);
        let x = rand_int_inclusive(&mut rng, -(nw / 2), w as i64 - nw / 2);
        let y = rand_int_inclusive(&mut rng, -(nh / 2), h as i64 - nh / 2);

        let mut stamp = rotate_expand(&scaled, angle);
        scale_alpha(&mut stamp, spec.severity);
        alpha_over(&mut layer, &stamp, x, y);
    }

    if let Some(mask) = restrict {
        debug_assert_eq!(mask.dimensions(), size);
        multiply_alpha(&mut layer, &threshold(mask, RESTRICT_CUTOFF));
    }
    layer
}
