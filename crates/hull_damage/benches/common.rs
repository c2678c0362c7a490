use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, Throughput};
use hull_damage::prelude::{DamageAssets, StencilPair, StencilSet, StencilTier};
use image::{Rgba, RgbaImage};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

#[allow(dead_code)]
pub fn hull_sprite(size: u32) -> RgbaImage {
    let c = size as f32 * 0.5;
    RgbaImage::from_fn(size, size, |x, y| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
        if d < c * 0.9 {
            Rgba([120, 126, 134, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// In-memory assets with a few stencil keys per tier and one stamp of each kind.
#[allow(dead_code)]
pub fn synthetic_assets(tile: u32) -> DamageAssets {
    let ring = |r: f32| {
        let c = tile as f32 * 0.5;
        RgbaImage::from_fn(tile, tile, move |x, y| {
            let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
            Rgba([40, 30, 20, if d < c * r { 255 } else { 0 }])
        })
    };
    let mut light = StencilSet::new(StencilTier::Light);
    let mut heavy = StencilSet::new(StencilTier::Heavy);
    for (i, r) in [0.4, 0.6, 0.8].into_iter().enumerate() {
        light.insert(format!("L{i}"), StencilPair::new(ring(r * 0.7), ring(r)));
        heavy.insert(format!("H{i}"), StencilPair::new(ring(r), ring(r)));
    }
    DamageAssets::new(tile)
        .with_stencils(light)
        .with_stencils(heavy)
        .with_scorches(vec![Arc::new(ring(0.9))])
        .with_shrapnel(vec![Arc::new(ring(0.3))])
}
