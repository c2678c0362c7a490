//! Argument definitions for the `hull-damage` command line.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hull_damage::prelude::{DamageLevel, DEFAULT_SET_LABEL};

/// Deterministic damage compositing for ship-part sprites
#[derive(Parser)]
#[command(name = "hull-damage")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Render a damaged copy of a sprite
    Render(RenderArgs),

    /// List cover sets, shrapnel sets and stencil keys under an assets root
    Sets {
        /// Assets root containing hole_punch/, hole_covers/, scorches/, shrapnel/
        #[arg(short, long, default_value = "assets")]
        assets: PathBuf,

        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub(crate) struct RenderArgs {
    /// Undamaged sprite to read (PNG, JPEG or BMP)
    #[arg(short, long)]
    pub base: PathBuf,

    /// Assets root containing hole_punch/, hole_covers/, scorches/, shrapnel/
    #[arg(short, long, default_value = "assets")]
    pub assets: PathBuf,

    /// Output directory (default: next to the base image)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Damage level: 33, 50 or 66
    #[arg(short, long)]
    pub level: Option<DamageLevel>,

    /// Render all three levels with the same seed
    #[arg(long, conflicts_with = "level")]
    pub all_levels: bool,

    /// Random seed
    #[arg(short, long)]
    pub seed: Option<u32>,

    /// Derive a fresh seed from the clock before rendering
    #[arg(long)]
    pub reroll: bool,

    /// JSON file with damage parameters; flags below override it
    #[arg(short, long)]
    pub params: Option<PathBuf>,

    /// Skip stencil holes and covers
    #[arg(long)]
    pub no_holes: bool,

    /// Skip scorch marks
    #[arg(long)]
    pub no_scorches: bool,

    /// Scatter shrapnel (off by default)
    #[arg(long)]
    pub shrapnel: bool,

    /// Named cover set from hole_covers/
    #[arg(long, default_value = DEFAULT_SET_LABEL)]
    pub cover_set: String,

    /// Named shrapnel set from shrapnel/
    #[arg(long, default_value = DEFAULT_SET_LABEL)]
    pub shrapnel_set: String,

    /// Hole density in [0, 1]
    #[arg(long)]
    pub hole_density: Option<f32>,

    /// Burn rim width in pixels
    #[arg(long)]
    pub rim_width: Option<u32>,

    /// Burn rim darkness in [0, 1]
    #[arg(long)]
    pub rim_darkness: Option<f32>,

    /// Print the effective parameters as JSON before rendering
    #[arg(long)]
    pub print_params: bool,
}
