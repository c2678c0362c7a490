//! Stencil hole pass: punch transparent holes on a cell grid and build the matching
//! cover layer.
//!
//! The image is tiled into `tile_size` cells. Each cell independently decides, from
//! its own seeded stream, whether it receives a hole, which stencil key and which
//! quarter turn (see [`CellSampler`]). The punch tile marks the hole, restricted to
//! pixels that were opaque in the *initial* alpha; the cover tile is kept only
//! inside that hole and collected on a separate layer for later compositing.
use image::{GrayImage, Luma, Rgba, RgbaImage};
use tracing::debug;

use crate::error::Result;
use crate::library::StencilSet;
use crate::raster::{alpha_over, crop_to, multiply_alpha, rotate_quarter, soft_erase, threshold};
use crate::sampling::{CellGrid, CellSampler};

use super::rim::add_burn_rim;

/// Punch alpha at or above this marks a hole pixel.
pub const PUNCH_ALPHA_CUTOFF: u8 = 8;

/// Settings for one hole pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoleSpec {
    /// Cell edge in pixels, normally the stencil tile width.
    pub tile_size: u32,
    /// Probability in [0, 1] that a cell receives a hole.
    pub density: f32,
    pub seed: u32,
    pub rim_width: u32,
    pub rim_darkness: f32,
}

impl HoleSpec {
    pub fn new(tile_size: u32, density: f32, seed: u32) -> Self {
        Self {
            tile_size,
            density,
            seed,
            rim_width: 0,
            rim_darkness: 0.0,
        }
    }

    pub fn with_rim(mut self, width: u32, darkness: f32) -> Self {
        self.rim_width = width;
        self.rim_darkness = darkness;
        self
    }
}

/// Result of a hole pass.
#[derive(Clone, Debug)]
pub struct HoleOutcome {
    /// Input image with holes erased and the rim applied.
    pub image: RgbaImage,
    /// Binary mask (0/255) of punched pixels.
    pub hole_mask: GrayImage,
    /// Cover art positioned at the holes; transparent elsewhere.
    pub cover_layer: RgbaImage,
    /// Number of cells that received a stencil.
    pub holes_punched: usize,
}

impl HoleOutcome {
    /// An outcome that leaves `image` untouched.
    pub fn untouched(image: RgbaImage) -> Self {
        let (w, h) = image.dimensions();
        Self {
            image,
            hole_mask: GrayImage::new(w, h),
            cover_layer: RgbaImage::new(w, h),
            holes_punched: 0,
        }
    }
}

/// Runs one hole pass over `image`.
///
/// `initial_alpha` is the alpha of the original, undamaged image; holes and covers
/// never reach pixels where it is zero. An empty stencil set returns the input
/// unchanged. Stencil decode failures are returned as errors.
pub fn apply_stencil_holes(
    image: &RgbaImage,
    initial_alpha: &GrayImage,
    stencils: &StencilSet,
    spec: &HoleSpec,
) -> Result<HoleOutcome> {
    let (w, h) = image.dimensions();
    debug_assert_eq!(initial_alpha.dimensions(), (w, h));

    let keys = stencils.keys();
    if keys.is_empty() || spec.tile_size == 0 {
        debug!("No {} stencils; skipping hole pass.", stencils.tier);
        return Ok(HoleOutcome::untouched(image.clone()));
    }

    let eligible = threshold(initial_alpha, 1);
    let grid = CellGrid::new(w, h, spec.tile_size);
    let sampler = CellSampler::new(spec.seed, spec.density);

    let mut hole_mask = GrayImage::new(w, h);
    let mut cover_layer = RgbaImage::new(w, h);
    let mut holes_punched = 0usize;
    let mut tiles: Vec<Option<(RgbaImage, RgbaImage)>> = vec![None; keys.len()];

    for (gx, gy, rect) in grid.cells() {
        let Some(decision) = sampler.decide(gx, gy, keys.len()) else {
            continue;
        };
        let key = keys[decision.key_index];
        let Some(pair) = stencils.get(key) else {
            continue;
        };
        if tiles[decision.key_index].is_none() {
            tiles[decision.key_index] = Some((pair.punch.load()?, pair.cover.load()?));
        }
        let Some((punch, cover)) = &tiles[decision.key_index] else {
            continue;
        };

        let punch = crop_to(&rotate_quarter(punch, decision.rotation), rect.width, rect.height);
        let cover = crop_to(&rotate_quarter(cover, decision.rotation), rect.width, rect.height);

        let mut cover_tile = RgbaImage::new(punch.width(), punch.height());
        for (tx, ty, p) in punch.enumerate_pixels() {
            let (px, py) = (rect.x + tx, rect.y + ty);
            let hole = p[3] >= PUNCH_ALPHA_CUTOFF && eligible.get_pixel(px, py)[0] == 255;
            hole_mask.put_pixel(px, py, Luma([if hole { 255 } else { 0 }]));
            if hole && tx < cover.width() && ty < cover.height() {
                cover_tile.put_pixel(tx, ty, *cover.get_pixel(tx, ty));
            } else {
                cover_tile.put_pixel(tx, ty, Rgba([0, 0, 0, 0]));
            }
        }
        alpha_over(&mut cover_layer, &cover_tile, rect.x as i64, rect.y as i64);
        holes_punched += 1;
    }

    let mut out = image.clone();
    soft_erase(&mut out, &hole_mask);
    add_burn_rim(&mut out, &hole_mask, spec.rim_width, spec.rim_darkness);
    multiply_alpha(&mut cover_layer, &eligible);

    debug!(
        "Punched {} of {} {} cells (density {:.2}, seed {}).",
        holes_punched,
        grid.cell_count(),
        stencils.tier,
        sampler.density,
        spec.seed
    );

    Ok(HoleOutcome {
        image: out,
        hole_mask,
        cover_layer,
        holes_punched,
    })
}
