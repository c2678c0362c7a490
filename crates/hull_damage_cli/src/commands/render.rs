//! `render` subcommand.
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use hull_damage::prelude::{
    render_damage_with_events, reroll_seed, AssetLibrary, AssetSelection, DamageLevel,
    DamageParams, FnSink,
};
use tracing::{debug, info, warn};

use crate::cli_args::RenderArgs;

pub(crate) fn run(args: &RenderArgs) -> Result<()> {
    let base = image::open(&args.base)
        .with_context(|| format!("Failed to read base image: {}", args.base.display()))?
        .to_rgba8();

    let file_params = match &args.params {
        Some(path) => Some(read_params(path)?),
        None => None,
    };

    let mut seed = args
        .seed
        .or(file_params.map(|p| p.seed))
        .unwrap_or(DamageParams::default().seed);
    if args.reroll {
        seed = reroll_seed(seed, clock_entropy());
        info!("Rerolled seed: {}", seed);
    }

    let levels: Vec<DamageLevel> = if args.all_levels {
        DamageLevel::ALL.to_vec()
    } else {
        vec![args
            .level
            .or(file_params.map(|p| p.level))
            .unwrap_or_default()]
    };

    let library = AssetLibrary::scan(&args.assets);
    let selection = AssetSelection::default()
        .with_cover_set(&args.cover_set)
        .with_shrapnel_set(&args.shrapnel_set);
    let assets = library.resolve(&selection);

    let out_dir = output_dir(&args.base, args.out.as_deref());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    for level in levels {
        let params = effective_params(args, file_params, level, seed);
        if let Err(e) = params.validate() {
            warn!("{}; out-of-range values will be clamped.", e);
        }
        if args.print_params {
            println!("{}", serde_json::to_string_pretty(&params.clamped())?);
        }

        let mut sink = FnSink::new(|event| debug!("{:?}", event));
        let render = render_damage_with_events(&base, &assets, &params, &mut sink)
            .with_context(|| format!("Failed to render level {level}"))?;

        let path = out_dir.join(output_name(&args.base, level));
        render
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Wrote {} ({} holes, {} shrapnel, {} scorches)",
            path.display(),
            render.holes_punched,
            render.shrapnel_stamps,
            render.scorch_stamps
        );
    }

    Ok(())
}

fn read_params(path: &Path) -> Result<DamageParams> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse params file: {}", path.display()))
}

/// Level preset (or params file) with command-line overrides applied.
fn effective_params(
    args: &RenderArgs,
    file_params: Option<DamageParams>,
    level: DamageLevel,
    seed: u32,
) -> DamageParams {
    let mut params = match file_params {
        Some(p) => p.with_level(level),
        None => DamageParams::preset(level),
    }
    .with_seed(seed);

    if args.no_holes {
        params.holes.enabled = false;
    }
    if args.no_scorches {
        params.scorch.enabled = false;
    }
    if args.shrapnel {
        params.shrapnel.enabled = true;
    }
    if let Some(d) = args.hole_density {
        params.holes.density = d;
    }
    if let Some(w) = args.rim_width {
        params.holes.rim_width = w;
    }
    if let Some(d) = args.rim_darkness {
        params.holes.rim_darkness = d;
    }
    params
}

fn output_dir(base: &Path, out: Option<&Path>) -> PathBuf {
    match out {
        Some(dir) => dir.to_path_buf(),
        None => base
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// `<stem>_<level>.png`
fn output_name(base: &Path, level: DamageLevel) -> String {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    format!("{stem}_{level}.png")
}

fn clock_entropy() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
