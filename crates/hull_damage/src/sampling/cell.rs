//! Per-cell deterministic decisions for stencil holes.
//!
//! Each grid cell `(gx, gy)` owns a private random stream derived from the run
//! seed and its coordinates, so a decision never depends on evaluation order.
//! The inclusion draw comes first and is compared with `u < density`; raising
//! the density can only add cells, never reshuffle the ones already included.
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::sampling::{rand01, rand_index};

/// Odd multiplier mixed into the cell seed for the column index.
pub const CELL_MUL_X: u64 = 73_856_093;
/// Odd multiplier mixed into the cell seed for the row index.
pub const CELL_MUL_Y: u64 = 19_349_663;

/// Creates a deterministic stream seed for a grid cell from a base seed.
pub fn seed_for_cell(base_seed: u32, gx: u32, gy: u32) -> u64 {
    let mixed = ((base_seed as u64) << 20)
        ^ (gx as u64).wrapping_mul(CELL_MUL_X)
        ^ (gy as u64).wrapping_mul(CELL_MUL_Y);
    mix_u64(mixed)
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// One of the four right-angle orientations of a stencil tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum QuarterTurn {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl QuarterTurn {
    pub const ALL: [QuarterTurn; 4] = [
        QuarterTurn::R0,
        QuarterTurn::R90,
        QuarterTurn::R180,
        QuarterTurn::R270,
    ];

    /// Maps `k` quarter turns (mod 4) to an orientation.
    pub fn from_index(k: usize) -> Self {
        Self::ALL[k % 4]
    }

    pub fn degrees(self) -> u32 {
        match self {
            QuarterTurn::R0 => 0,
            QuarterTurn::R90 => 90,
            QuarterTurn::R180 => 180,
            QuarterTurn::R270 => 270,
        }
    }
}

/// Outcome for an included cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellDecision {
    /// Index into the ascending-sorted stencil key list.
    pub key_index: usize,
    /// Orientation applied to both punch and cover tile.
    pub rotation: QuarterTurn,
}

/// Seeded per-cell sampler for one hole pass.
#[derive(Clone, Copy, Debug)]
pub struct CellSampler {
    pub seed: u32,
    pub density: f32,
}

impl CellSampler {
    /// Create a sampler; density is clamped to [0, 1].
    pub fn new(seed: u32, density: f32) -> Self {
        let density = if density.is_nan() {
            0.0
        } else {
            density.clamp(0.0, 1.0)
        };
        Self { seed, density }
    }

    /// Decides whether cell `(gx, gy)` gets a hole and, if so, which key and rotation.
    ///
    /// Returns `None` when the cell is excluded or when `key_count` is zero.
    pub fn decide(&self, gx: u32, gy: u32, key_count: usize) -> Option<CellDecision> {
        let mut rng = StdRng::seed_from_u64(seed_for_cell(self.seed, gx, gy));
        if rand01(&mut rng) >= self.density || key_count == 0 {
            return None;
        }
        let key_index = rand_index(&mut rng, key_count);
        let rotation = QuarterTurn::from_index(rand_index(&mut rng, 4));
        Some(CellDecision {
            key_index,
            rotation,
        })
    }
}
