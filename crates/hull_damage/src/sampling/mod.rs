//! Seeded sampling over the stencil grid.
//!
//! This module holds the grid geometry ([`grid`]), the per-cell deterministic
//! sampler ([`cell`]) and the uniform draw helpers shared with the stamp scatter.
use rand::Rng;

pub mod cell;
pub mod grid;

pub use cell::{seed_for_cell, CellDecision, CellSampler, QuarterTurn};
pub use grid::{CellGrid, CellRect};

/// Generate a random float in the range [0, 1) from the top 24 bits of one draw.
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f32 {
    ((rng.next_u32() >> 8) as f32) * (1.0 / 16_777_216.0)
}

/// Uniform index in `0..len`. `len` must be non-zero.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn Rng, len: usize) -> usize {
    debug_assert!(len > 0, "rand_index on an empty range");
    ((rand01(rng) * len as f32) as usize).min(len - 1)
}

/// Uniform float in `[lo, hi]`.
#[inline]
pub(crate) fn rand_uniform(rng: &mut dyn Rng, lo: f32, hi: f32) -> f32 {
    lo + rand01(rng) * (hi - lo)
}

/// Uniform integer in the inclusive range `[lo, hi]`.
#[inline]
pub(crate) fn rand_int_inclusive(rng: &mut dyn Rng, lo: i64, hi: i64) -> i64 {
    if hi <= lo {
        return lo;
    }
    let span = (hi - lo + 1) as u64;
    lo + (rng.next_u64() % span) as i64
}
