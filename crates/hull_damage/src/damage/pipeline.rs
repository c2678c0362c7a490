//! The damage pipeline: holes, shrapnel, scorches, then covers.
//!
//! [`render_damage`] takes an undamaged sprite, an immutable [`DamageAssets`] bundle
//! and [`DamageParams`], and returns a new image. The input is never modified and the
//! output depends only on those three inputs.
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use image::{GrayImage, ImageFormat, RgbaImage};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::damage::events::{EventSink, PipelineEvent, PipelineEventKind};
use crate::damage::holes::{apply_stencil_holes, HoleOutcome, HoleSpec};
use crate::damage::params::{DamageParams, DecalParams};
use crate::damage::stamps::{stamp_layer, StampSpec};
use crate::error::Result;
use crate::library::assets::DEFAULT_TILE_SIZE;
use crate::library::{StencilSet, StencilTier};
use crate::raster::{alpha_of, alpha_over, has_visible_pixels, lighter_in_place, threshold};

/// Seed flip for the light-tier run of the mixed level.
pub const MIXED_LIGHT_SEED_XOR: u32 = 0x33;
/// Seed flip for the heavy-tier run of the mixed level.
pub const MIXED_HEAVY_SEED_XOR: u32 = 0x66;
pub const SHRAPNEL_SEED_XOR: u32 = 0x222;
pub const SCORCH_SEED_XOR: u32 = 0x444;

/// Decal counts scale with area in units of 128×128 pixels.
pub const DECAL_AREA_UNIT: u64 = 128 * 128;
pub const DECAL_COUNT_PER_UNIT: f32 = 10.0;

/// Pipeline stages, in execution order.
///
/// Setup and hand-off are reported as [`PipelineEvent::RunStarted`] and
/// [`PipelineEvent::RunFinished`] rather than as stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Holes,
    Shrapnel,
    Scorches,
    CoverOverlay,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Holes => "holes",
            Stage::Shrapnel => "shrapnel",
            Stage::Scorches => "scorches",
            Stage::CoverOverlay => "cover overlay",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable asset bundle for one render.
#[derive(Clone, Debug)]
pub struct DamageAssets {
    pub light: StencilSet,
    pub heavy: StencilSet,
    pub scorches: Vec<Arc<RgbaImage>>,
    pub shrapnel: Vec<Arc<RgbaImage>>,
    /// Stencil grid cell edge in pixels.
    pub tile_size: u32,
}

impl Default for DamageAssets {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_SIZE)
    }
}

impl DamageAssets {
    pub fn new(tile_size: u32) -> Self {
        Self {
            light: StencilSet::new(StencilTier::Light),
            heavy: StencilSet::new(StencilTier::Heavy),
            scorches: Vec::new(),
            shrapnel: Vec::new(),
            tile_size: tile_size.max(1),
        }
    }

    /// Installs `set` in the slot matching its tier.
    pub fn with_stencils(mut self, set: StencilSet) -> Self {
        match set.tier {
            StencilTier::Light => self.light = set,
            StencilTier::Heavy => self.heavy = set,
        }
        self
    }

    pub fn with_scorches(mut self, scorches: Vec<Arc<RgbaImage>>) -> Self {
        self.scorches = scorches;
        self
    }

    pub fn with_shrapnel(mut self, shrapnel: Vec<Arc<RgbaImage>>) -> Self {
        self.shrapnel = shrapnel;
        self
    }

    pub fn stencils(&self, tier: StencilTier) -> &StencilSet {
        match tier {
            StencilTier::Light => &self.light,
            StencilTier::Heavy => &self.heavy,
        }
    }
}

/// Output of a render.
#[derive(Clone, Debug)]
pub struct DamageRender {
    /// The damaged sprite, same size as the input.
    pub image: RgbaImage,
    /// Union of all punched pixels (0/255).
    pub hole_mask: GrayImage,
    /// Cover art that was composited into the holes.
    pub cover_layer: RgbaImage,
    pub holes_punched: usize,
    pub shrapnel_stamps: usize,
    pub scorch_stamps: usize,
}

impl DamageRender {
    /// Writes the damaged image to `path` as PNG.
    ///
    /// The image is encoded into a temporary file in the same directory and then
    /// renamed over `path`. If any step fails, an existing file at `path` is left
    /// as it was and the temporary file is removed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.image.write_to(&mut writer, ImageFormat::Png)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        debug!("Saved {}.", path.display());
        Ok(())
    }
}

/// Number of stamps for a decal density on a `width × height` image:
/// `floor(density * 10 * max(1, floor(W*H / 128²)))`.
pub fn decal_count(density: f32, width: u32, height: u32) -> usize {
    let area_scale = (width as u64 * height as u64 / DECAL_AREA_UNIT).max(1);
    let count = density.max(0.0) * DECAL_COUNT_PER_UNIT * area_scale as f32;
    count as usize
}

/// Renders damage onto `base` without observing events.
pub fn render_damage(
    base: &RgbaImage,
    assets: &DamageAssets,
    params: &DamageParams,
) -> Result<DamageRender> {
    let mut sink = ();
    render_damage_with_events(base, assets, params, &mut sink)
}

/// Renders damage onto `base`, reporting progress to `sink`.
///
/// Parameters are clamped to their documented ranges first. Stage order is holes,
/// shrapnel, scorches, cover overlay. A stencil that fails to decode aborts the
/// render with [`crate::error::Error::Stage`].
pub fn render_damage_with_events(
    base: &RgbaImage,
    assets: &DamageAssets,
    params: &DamageParams,
    sink: &mut dyn EventSink,
) -> Result<DamageRender> {
    let params = params.clamped();
    let (w, h) = base.dimensions();

    if sink.wants(PipelineEventKind::RunStarted) {
        sink.send(PipelineEvent::RunStarted {
            size: (w, h),
            level: params.level,
            seed: params.seed,
        });
    }
    debug!(
        "Rendering {}x{} at level {} with seed {}.",
        w, h, params.level, params.seed
    );

    let holes = if params.holes.enabled {
        start(sink, Stage::Holes);
        let outcome = punch_holes(base, assets, &params).map_err(|e| e.in_stage(Stage::Holes))?;
        finish(sink, Stage::Holes, outcome.holes_punched);
        outcome
    } else {
        skip(sink, Stage::Holes, "disabled");
        HoleOutcome::untouched(base.clone())
    };

    let HoleOutcome {
        image: mut result,
        hole_mask,
        cover_layer,
        holes_punched,
    } = holes;

    let stamp_mask = threshold(&alpha_of(&result), 1);

    let shrapnel_stamps = decal_stage(
        &mut result,
        Stage::Shrapnel,
        &params.shrapnel,
        &assets.shrapnel,
        params.seed ^ SHRAPNEL_SEED_XOR,
        &stamp_mask,
        sink,
    );
    let scorch_stamps = decal_stage(
        &mut result,
        Stage::Scorches,
        &params.scorch,
        &assets.scorches,
        params.seed ^ SCORCH_SEED_XOR,
        &stamp_mask,
        sink,
    );

    if has_visible_pixels(&cover_layer) {
        start(sink, Stage::CoverOverlay);
        alpha_over(&mut result, &cover_layer, 0, 0);
        finish(sink, Stage::CoverOverlay, holes_punched);
    } else {
        skip(sink, Stage::CoverOverlay, "no covers");
    }

    info!(
        "Damage level {}: {} holes, {} shrapnel, {} scorches.",
        params.level, holes_punched, shrapnel_stamps, scorch_stamps
    );
    if sink.wants(PipelineEventKind::RunFinished) {
        sink.send(PipelineEvent::RunFinished {
            holes_punched,
            shrapnel_stamps,
            scorch_stamps,
        });
    }

    Ok(DamageRender {
        image: result,
        hole_mask,
        cover_layer,
        holes_punched,
        shrapnel_stamps,
        scorch_stamps,
    })
}

/// Runs the hole stage for `params.level`.
///
/// Light and heavy levels run one pass with their tier. The mixed level runs the
/// light tier at half density with `seed ^ 0x33`, then the heavy tier at half density
/// with `seed ^ 0x66` and no rim on the light pass output; masks are merged by
/// maximum and cover layers stacked light first. Both passes restrict holes to the
/// alpha of `base`. Tiers without stencils are skipped.
pub fn punch_holes(
    base: &RgbaImage,
    assets: &DamageAssets,
    params: &DamageParams,
) -> Result<HoleOutcome> {
    let initial_alpha = alpha_of(base);
    let holes = &params.holes;
    let tile = assets.tile_size;

    match params.level.tier() {
        Some(tier) => {
            let spec = HoleSpec::new(tile, holes.density, params.seed)
                .with_rim(holes.rim_width, holes.rim_darkness);
            apply_stencil_holes(base, &initial_alpha, assets.stencils(tier), &spec)
        }
        None => {
            let half = holes.density * 0.5;
            let light_spec = HoleSpec::new(tile, half, params.seed ^ MIXED_LIGHT_SEED_XOR)
                .with_rim(holes.rim_width, holes.rim_darkness);
            let heavy_spec = HoleSpec::new(tile, half, params.seed ^ MIXED_HEAVY_SEED_XOR);

            let first = apply_stencil_holes(base, &initial_alpha, &assets.light, &light_spec)?;
            let second =
                apply_stencil_holes(&first.image, &initial_alpha, &assets.heavy, &heavy_spec)?;

            let mut hole_mask = first.hole_mask;
            lighter_in_place(&mut hole_mask, &second.hole_mask);
            let mut cover_layer = first.cover_layer;
            alpha_over(&mut cover_layer, &second.cover_layer, 0, 0);

            Ok(HoleOutcome {
                image: second.image,
                hole_mask,
                cover_layer,
                holes_punched: first.holes_punched + second.holes_punched,
            })
        }
    }
}

fn decal_stage(
    result: &mut RgbaImage,
    stage: Stage,
    params: &DecalParams,
    stamps: &[Arc<RgbaImage>],
    seed: u32,
    restrict: &GrayImage,
    sink: &mut dyn EventSink,
) -> usize {
    if !params.enabled {
        skip(sink, stage, "disabled");
        return 0;
    }
    if stamps.is_empty() {
        warn!("No {} stamps available; skipping.", stage);
        if sink.wants(PipelineEventKind::Warning) {
            sink.send(PipelineEvent::Warning {
                context: stage.to_string(),
                message: "no stamps available".into(),
            });
        }
        skip(sink, stage, "no stamps");
        return 0;
    }
    let count = decal_count(params.density, result.width(), result.height());
    if count == 0 || params.severity <= 0.0 {
        skip(sink, stage, "nothing to draw");
        return 0;
    }

    start(sink, stage);
    let spec = StampSpec::from_decal(params, count, seed as u64);
    let layer = stamp_layer(result.dimensions(), stamps, &spec, Some(restrict));
    alpha_over(result, &layer, 0, 0);
    finish(sink, stage, count);
    count
}

fn start(sink: &mut dyn EventSink, stage: Stage) {
    if sink.wants(PipelineEventKind::StageStarted) {
        sink.send(PipelineEvent::StageStarted { stage });
    }
}

fn finish(sink: &mut dyn EventSink, stage: Stage, items: usize) {
    debug!("Stage {} finished with {} items.", stage, items);
    if sink.wants(PipelineEventKind::StageFinished) {
        sink.send(PipelineEvent::StageFinished { stage, items });
    }
}

fn skip(sink: &mut dyn EventSink, stage: Stage, reason: &str) {
    debug!("Stage {} skipped: {}.", stage, reason);
    if sink.wants(PipelineEventKind::StageSkipped) {
        sink.send(PipelineEvent::StageSkipped {
            stage,
            reason: reason.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::Rgba;

    use super::*;
    use crate::damage::events::VecSink;
    use crate::damage::params::{DamageLevel, HoleParams};
    use crate::error::Error;
    use crate::library::StencilPair;

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    fn sprite(size: u32) -> RgbaImage {
        // Opaque hull with a transparent margin.
        RgbaImage::from_fn(size, size, |x, y| {
            if x < 8 || y < 8 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([110, 120, 130, 255])
            }
        })
    }

    fn assets() -> DamageAssets {
        let light = StencilSet::new(StencilTier::Light)
            .with_pair(
                "A",
                StencilPair::new(solid(32, 32, [0, 0, 0, 255]), solid(32, 32, [200, 0, 0, 255])),
            )
            .with_pair(
                "B",
                StencilPair::new(solid(32, 16, [0, 0, 0, 255]), solid(32, 32, [0, 200, 0, 255])),
            );
        let heavy = StencilSet::new(StencilTier::Heavy).with_pair(
            "C",
            StencilPair::new(solid(32, 32, [0, 0, 0, 255]), solid(32, 32, [0, 0, 200, 255])),
        );
        DamageAssets::new(32)
            .with_stencils(light)
            .with_stencils(heavy)
            .with_scorches(vec![Arc::new(solid(24, 24, [10, 10, 10, 220]))])
            .with_shrapnel(vec![Arc::new(solid(12, 12, [90, 90, 90, 255]))])
    }

    fn quiet(level: DamageLevel) -> DamageParams {
        DamageParams::preset(level)
            .with_scorch(DecalParams::scorch(0.0))
            .with_shrapnel(DecalParams::shrapnel(0.0))
    }

    #[test]
    fn decal_count_scales_with_area() {
        assert_eq!(decal_count(0.2, 64, 64), 2);
        assert_eq!(decal_count(0.2, 128, 128), 2);
        assert_eq!(decal_count(0.2, 256, 256), 8);
        assert_eq!(decal_count(0.5, 300, 100), 5);
        assert_eq!(decal_count(0.0, 1024, 1024), 0);
        assert_eq!(decal_count(0.2, 0, 0), 2);
    }

    #[test]
    fn all_stages_off_is_identity() {
        let base = sprite(96);
        let params = DamageParams::default()
            .with_holes(HoleParams::default().with_enabled(false))
            .with_scorch(DecalParams::scorch(0.0));
        let out = render_damage(&base, &assets(), &params).unwrap();
        assert_eq!(out.image, base);
        assert_eq!(out.holes_punched + out.shrapnel_stamps + out.scorch_stamps, 0);
    }

    #[test]
    fn zero_hole_density_is_identity() {
        let base = sprite(96);
        let params = quiet(DamageLevel::Heavy)
            .with_holes(HoleParams::default().with_density(0.0).with_rim(6, 1.0));
        let out = render_damage(&base, &assets(), &params).unwrap();
        assert_eq!(out.image, base);
    }

    #[test]
    fn output_is_deterministic_and_input_untouched() {
        let base = sprite(160);
        let before = base.clone();
        let params = DamageParams::preset(DamageLevel::Mixed)
            .with_seed(99)
            .with_shrapnel(DecalParams::shrapnel(0.3).with_enabled(true))
            .with_holes(HoleParams::default().with_density(0.5).with_rim(3, 0.5));
        let a = render_damage(&base, &assets(), &params).unwrap();
        let b = render_damage(&base, &assets(), &params).unwrap();
        assert_eq!(a.image, b.image);
        assert_eq!(a.hole_mask, b.hole_mask);
        assert_eq!(base, before);
        assert_eq!(a.image.dimensions(), base.dimensions());
    }

    #[test]
    fn transparent_pixels_stay_transparent() {
        let base = sprite(128);
        let params = DamageParams::preset(DamageLevel::Heavy)
            .with_holes(HoleParams::default().with_density(1.0))
            .with_shrapnel(DecalParams::shrapnel(1.0).with_enabled(true))
            .with_scorch(DecalParams::scorch(1.0));
        let out = render_damage(&base, &assets(), &params).unwrap();
        for (x, y, p) in out.image.enumerate_pixels() {
            if base.get_pixel(x, y)[3] == 0 {
                assert_eq!(p[3], 0, "pixel ({x}, {y}) became visible");
            }
        }
    }

    #[test]
    fn full_density_covers_fill_the_hull() {
        let base = sprite(128);
        let params = quiet(DamageLevel::Heavy)
            .with_holes(HoleParams::default().with_density(1.0));
        let out = render_damage(&base, &assets(), &params).unwrap();
        assert_eq!(out.holes_punched, 16);
        assert_eq!(*out.image.get_pixel(64, 64), Rgba([0, 0, 200, 255]));
        assert_eq!(out.image.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn mixed_level_matches_independent_tier_runs() {
        let base = sprite(256);
        let assets = assets();
        let params = quiet(DamageLevel::Mixed)
            .with_seed(4242)
            .with_holes(HoleParams::default().with_density(0.8));
        let out = render_damage(&base, &assets, &params).unwrap();

        let alpha = alpha_of(&base);
        let light = apply_stencil_holes(
            &base,
            &alpha,
            &assets.light,
            &HoleSpec::new(32, 0.4, 4242 ^ MIXED_LIGHT_SEED_XOR),
        )
        .unwrap();
        let heavy = apply_stencil_holes(
            &base,
            &alpha,
            &assets.heavy,
            &HoleSpec::new(32, 0.4, 4242 ^ MIXED_HEAVY_SEED_XOR),
        )
        .unwrap();
        let mut merged = light.hole_mask.clone();
        lighter_in_place(&mut merged, &heavy.hole_mask);

        assert_eq!(out.hole_mask, merged);
        assert_eq!(out.holes_punched, light.holes_punched + heavy.holes_punched);
        assert!(out.holes_punched > 0);
    }

    fn pinned_assets() -> DamageAssets {
        let light = StencilSet::new(StencilTier::Light).with_pair(
            "A",
            StencilPair::new(solid(64, 64, [0, 0, 0, 255]), solid(64, 64, [200, 0, 0, 255])),
        );
        let heavy = StencilSet::new(StencilTier::Heavy).with_pair(
            "C",
            StencilPair::new(solid(64, 64, [0, 0, 0, 255]), solid(64, 64, [0, 0, 200, 255])),
        );
        DamageAssets::new(64).with_stencils(light).with_stencils(heavy)
    }

    #[test]
    fn light_level_render_is_pinned() {
        let base = solid(256, 256, [120, 130, 140, 255]);
        let params = quiet(DamageLevel::Light)
            .with_seed(1337)
            .with_holes(HoleParams::default().with_density(0.2));
        let out = render_damage(&base, &pinned_assets(), &params).unwrap();

        assert_eq!(out.holes_punched, 5);
        let covered = [(2, 0), (0, 1), (3, 1), (0, 3), (2, 3)];
        for (x, y, p) in out.image.enumerate_pixels() {
            let expected = if covered.contains(&(x / 64, y / 64)) {
                Rgba([200, 0, 0, 255])
            } else {
                *base.get_pixel(x, y)
            };
            assert_eq!(*p, expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn mixed_level_render_is_pinned() {
        let base = solid(256, 256, [120, 130, 140, 255]);
        let params = quiet(DamageLevel::Mixed)
            .with_seed(1337)
            .with_holes(HoleParams::default().with_density(0.5));
        let out = render_damage(&base, &pinned_assets(), &params).unwrap();

        // (3, 3) is hit by both tiers; the heavy cover lands on top.
        assert_eq!(out.holes_punched, 8);
        let light = [(0, 0), (3, 0), (2, 1)];
        let heavy = [(0, 1), (0, 2), (3, 2), (3, 3)];
        for (x, y, p) in out.image.enumerate_pixels() {
            let cell = (x / 64, y / 64);
            let expected = if heavy.contains(&cell) {
                Rgba([0, 0, 200, 255])
            } else if light.contains(&cell) {
                Rgba([200, 0, 0, 255])
            } else {
                *base.get_pixel(x, y)
            };
            assert_eq!(*p, expected, "pixel ({x}, {y})");
        }
        let punched = out.hole_mask.iter().filter(|v| **v == 255).count();
        assert_eq!(punched, 7 * 64 * 64);
    }

    #[test]
    fn events_follow_stage_order() {
        let base = sprite(128);
        let params = DamageParams::preset(DamageLevel::Light)
            .with_holes(HoleParams::default().with_density(1.0));
        let mut sink = VecSink::new();
        render_damage_with_events(&base, &assets(), &params, &mut sink).unwrap();

        let stages: Vec<(Stage, bool)> = sink
            .as_slice()
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::StageFinished { stage, .. } => Some((*stage, true)),
                PipelineEvent::StageSkipped { stage, .. } => Some((*stage, false)),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                (Stage::Holes, true),
                (Stage::Shrapnel, false),
                (Stage::Scorches, true),
                (Stage::CoverOverlay, true),
            ]
        );
        assert!(matches!(
            sink.as_slice().first(),
            Some(PipelineEvent::RunStarted { .. })
        ));
        assert!(matches!(
            sink.as_slice().last(),
            Some(PipelineEvent::RunFinished { .. })
        ));
    }

    #[test]
    fn missing_stamps_warn_and_skip() {
        let base = sprite(64);
        let assets = assets().with_scorches(Vec::new());
        let mut sink = VecSink::only([PipelineEventKind::Warning]);
        let params = quiet(DamageLevel::Light).with_scorch(DecalParams::scorch(0.5));
        let out = render_damage_with_events(&base, &assets, &params, &mut sink).unwrap();
        assert_eq!(out.scorch_stamps, 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn save_replaces_existing_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate_33.png");
        std::fs::write(&path, b"stale bytes from an earlier run").unwrap();

        let out = render_damage(&sprite(64), &assets(), &quiet(DamageLevel::Light)).unwrap();
        out.save(&path).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written, out.image);
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("plate_33.png")]);
    }

    #[test]
    fn save_into_missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plate_33.png");
        let out = render_damage(&sprite(32), &assets(), &quiet(DamageLevel::Light)).unwrap();
        let err = out.save(&path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn broken_stencil_fails_hole_stage() {
        let base = sprite(64);
        let light = StencilSet::new(StencilTier::Light).with_pair(
            "X",
            StencilPair::new(
                PathBuf::from("/nonexistent/X_33.png"),
                PathBuf::from("/nonexistent/X_33.png"),
            ),
        );
        let assets = DamageAssets::new(32).with_stencils(light);
        let params = quiet(DamageLevel::Light).with_holes(HoleParams::default().with_density(1.0));
        let err = render_damage(&base, &assets, &params).unwrap_err();
        assert!(matches!(
            err,
            Error::Stage {
                stage: Stage::Holes,
                ..
            }
        ));
    }
}
