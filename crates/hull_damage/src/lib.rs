#![forbid(unsafe_code)]
//! hull_damage: Deterministic damage compositing for ship-part sprites.
//!
//! Modules:
//! - library: discover stencil pairs and decal stamps under an assets root
//! - sampling: per-cell seeded decisions over the stencil grid
//! - raster: mask, transform and alpha-over primitives on RGBA buffers
//! - damage: hole/cover compositing, stamp scatter and the pipeline that orders them
//!
//! For the command-line shell, see the `hull_damage_cli` crate.
pub mod damage;
pub mod error;
pub mod library;
pub mod raster;
pub mod sampling;

/// Convenient re-exports for common types. Import with `use hull_damage::prelude::*;`.
pub mod prelude {
    pub use crate::damage::events::{
        EventSink, FnSink, MultiSink, PipelineEvent, PipelineEventKind, VecSink,
    };
    pub use crate::damage::holes::{apply_stencil_holes, HoleOutcome, HoleSpec};
    pub use crate::damage::params::{
        reroll_seed, DamageLevel, DamageParams, DecalParams, HoleParams,
    };
    pub use crate::damage::pipeline::{
        decal_count, render_damage, render_damage_with_events, DamageAssets, DamageRender, Stage,
    };
    pub use crate::damage::stamps::{stamp_layer, StampSpec};
    pub use crate::error::{Error, Result};
    pub use crate::library::{
        format_set_label, AssetLibrary, AssetSelection, StencilPair, StencilSet, StencilTier,
        TileSource, DEFAULT_SET_LABEL,
    };
    pub use crate::sampling::cell::{seed_for_cell, CellDecision, CellSampler, QuarterTurn};
    pub use crate::sampling::grid::{CellGrid, CellRect};
}
