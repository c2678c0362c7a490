//! Assets-root snapshot and selection of named cover/shrapnel sets.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::damage::pipeline::DamageAssets;
use crate::library::stamps::{load_stamp_dir, STAMP_TILE_SIZES};
use crate::library::stencil::{group_stencils_by_suffix, StencilSet, StencilTier, TileSource};
use crate::library::{
    format_set_label, scan_subdirs, COVER_DIR, DEFAULT_SET_LABEL, PUNCH_DIR, SCORCH_DIR,
    SHRAPNEL_DIR,
};

/// Stencil tile edge used when no punch stencil can be measured.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// Which named asset subsets to blend in on top of the root-level assets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssetSelection {
    pub cover_set: String,
    pub shrapnel_set: String,
}

impl Default for AssetSelection {
    fn default() -> Self {
        Self {
            cover_set: DEFAULT_SET_LABEL.to_owned(),
            shrapnel_set: DEFAULT_SET_LABEL.to_owned(),
        }
    }
}

impl AssetSelection {
    pub fn with_cover_set(mut self, label: impl Into<String>) -> Self {
        self.cover_set = label.into();
        self
    }

    pub fn with_shrapnel_set(mut self, label: impl Into<String>) -> Self {
        self.shrapnel_set = label.into();
        self
    }
}

#[derive(Clone, Debug, Default)]
struct TierFiles {
    light: BTreeMap<String, PathBuf>,
    heavy: BTreeMap<String, PathBuf>,
}

impl TierFiles {
    fn scan(folder: &Path) -> Self {
        Self {
            light: group_stencils_by_suffix(folder, StencilTier::Light),
            heavy: group_stencils_by_suffix(folder, StencilTier::Heavy),
        }
    }

    fn get(&self, tier: StencilTier) -> &BTreeMap<String, PathBuf> {
        match tier {
            StencilTier::Light => &self.light,
            StencilTier::Heavy => &self.heavy,
        }
    }

    fn overlay(&mut self, other: &TierFiles) {
        self.light
            .extend(other.light.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.heavy
            .extend(other.heavy.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// Snapshot of an assets root: stencil file maps, named sets and decoded stamps.
pub struct AssetLibrary {
    root: PathBuf,
    punch: TierFiles,
    covers: TierFiles,
    cover_sets: BTreeMap<String, TierFiles>,
    scorches: Vec<Arc<RgbaImage>>,
    shrapnel: Vec<Arc<RgbaImage>>,
    shrapnel_sets: BTreeMap<String, Vec<Arc<RgbaImage>>>,
}

impl AssetLibrary {
    /// Enumerates the four asset folders under `root`. Missing folders are empty;
    /// stamp files that fail to decode are skipped. Shrapnel files are sliced as
    /// tile sheets, scorch files are kept whole.
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let punch = TierFiles::scan(&root.join(PUNCH_DIR));

        let cover_root = root.join(COVER_DIR);
        let covers = TierFiles::scan(&cover_root);
        let cover_sets: BTreeMap<_, _> = scan_subdirs(&cover_root)
            .into_iter()
            .filter_map(|dir| {
                let label = format_set_label(dir.file_name()?.to_str()?);
                Some((label, TierFiles::scan(&dir)))
            })
            .collect();

        let scorches = load_stamp_dir(&root.join(SCORCH_DIR), &[]);

        let shrapnel_root = root.join(SHRAPNEL_DIR);
        let shrapnel = load_stamp_dir(&shrapnel_root, &STAMP_TILE_SIZES);
        let shrapnel_sets: BTreeMap<_, _> = scan_subdirs(&shrapnel_root)
            .into_iter()
            .filter_map(|dir| {
                let label = format_set_label(dir.file_name()?.to_str()?);
                let tiles = load_stamp_dir(&dir, &STAMP_TILE_SIZES);
                (!tiles.is_empty()).then_some((label, tiles))
            })
            .collect();

        info!(
            "Scanned assets '{}' | punch 33/66: {}/{} | cover sets: {} | scorches: {} | shrapnel: {} (+{} sets).",
            root.display(),
            punch.light.len(),
            punch.heavy.len(),
            cover_sets.len(),
            scorches.len(),
            shrapnel.len(),
            shrapnel_sets.len(),
        );

        Self {
            root,
            punch,
            covers,
            cover_sets,
            scorches,
            shrapnel,
            shrapnel_sets,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `Default` followed by the named cover sets in case-insensitive order.
    pub fn cover_set_labels(&self) -> Vec<String> {
        labels_with_default(self.cover_sets.keys())
    }

    /// `Default` followed by the named shrapnel sets in case-insensitive order.
    pub fn shrapnel_set_labels(&self) -> Vec<String> {
        labels_with_default(self.shrapnel_sets.keys())
    }

    /// Punch stencil keys of a tier, ascending.
    pub fn punch_keys(&self, tier: StencilTier) -> Vec<&str> {
        self.punch.get(tier).keys().map(String::as_str).collect()
    }

    /// Stencil tile edge: width of the first measurable punch stencil, 33 before 66.
    pub fn tile_size(&self) -> u32 {
        for tier in StencilTier::ALL {
            for path in self.punch.get(tier).values() {
                match TileSource::File(path.clone()).dimensions() {
                    Ok((w, _)) if w > 0 => return w,
                    Ok(_) => {}
                    Err(e) => warn!("Cannot measure punch stencil: {}.", e),
                }
            }
        }
        DEFAULT_TILE_SIZE
    }

    /// Resolves a selection into the immutable bundle consumed by a render.
    /// Unknown set labels fall back to the root-level assets.
    pub fn resolve(&self, selection: &AssetSelection) -> DamageAssets {
        let mut covers = self.covers.clone();
        if selection.cover_set != DEFAULT_SET_LABEL {
            match self.cover_sets.get(&selection.cover_set) {
                Some(set) => covers.overlay(set),
                None => warn!(
                    "Unknown cover set '{}'; using '{}'.",
                    selection.cover_set, DEFAULT_SET_LABEL
                ),
            }
        }

        let mut shrapnel = self.shrapnel.clone();
        if selection.shrapnel_set != DEFAULT_SET_LABEL {
            match self.shrapnel_sets.get(&selection.shrapnel_set) {
                Some(tiles) => shrapnel.extend(tiles.iter().cloned()),
                None => warn!(
                    "Unknown shrapnel set '{}'; using '{}'.",
                    selection.shrapnel_set, DEFAULT_SET_LABEL
                ),
            }
        }

        let light = StencilSet::from_files(
            StencilTier::Light,
            self.punch.get(StencilTier::Light),
            covers.get(StencilTier::Light),
        );
        let heavy = StencilSet::from_files(
            StencilTier::Heavy,
            self.punch.get(StencilTier::Heavy),
            covers.get(StencilTier::Heavy),
        );
        debug!(
            "Resolved cover '{}' / shrapnel '{}': {} + {} stencil pairs, {} shrapnel tiles.",
            selection.cover_set,
            selection.shrapnel_set,
            light.len(),
            heavy.len(),
            shrapnel.len()
        );

        DamageAssets::new(self.tile_size())
            .with_stencils(light)
            .with_stencils(heavy)
            .with_scorches(self.scorches.clone())
            .with_shrapnel(shrapnel)
    }
}

fn labels_with_default<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut labels: Vec<String> = names.cloned().collect();
    labels.sort_by_key(|l| l.to_lowercase());
    labels.insert(0, DEFAULT_SET_LABEL.to_owned());
    labels
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    fn write_tile(path: &Path, size: u32, color: [u8; 4]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(size, size, Rgba(color))
            .save(path)
            .unwrap();
    }

    fn build_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let r = dir.path();
        write_tile(&r.join("hole_punch/A_33.png"), 32, [0, 0, 0, 255]);
        write_tile(&r.join("hole_punch/B_33.png"), 32, [0, 0, 0, 255]);
        write_tile(&r.join("hole_punch/A_66.png"), 32, [0, 0, 0, 255]);
        write_tile(&r.join("hole_covers/A_33.png"), 32, [10, 10, 10, 255]);
        write_tile(&r.join("hole_covers/rusty_steel/B_33.png"), 32, [20, 0, 0, 255]);
        write_tile(&r.join("hole_covers/rusty_steel/A_33.png"), 32, [30, 0, 0, 255]);
        write_tile(&r.join("scorches/burn.png"), 128, [0, 0, 0, 200]);
        write_tile(&r.join("shrapnel/sheet.png"), 128, [50, 50, 50, 255]);
        write_tile(&r.join("shrapnel/bolts/bolt.png"), 64, [60, 60, 60, 255]);
        dir
    }

    #[test]
    fn default_selection_uses_root_assets_only() {
        let root = build_root();
        let lib = AssetLibrary::scan(root.path());
        assert_eq!(lib.tile_size(), 32);
        assert_eq!(lib.punch_keys(StencilTier::Light), vec!["A", "B"]);

        let assets = lib.resolve(&AssetSelection::default());
        assert_eq!(assets.stencils(StencilTier::Light).keys(), vec!["A"]);
        assert!(assets.stencils(StencilTier::Heavy).is_empty());
        assert_eq!(assets.scorches.len(), 1);
        assert_eq!(assets.scorches[0].dimensions(), (128, 128));
        assert_eq!(assets.shrapnel.len(), 4);
        assert_eq!(assets.tile_size, 32);
    }

    #[test]
    fn named_sets_override_and_extend() {
        let root = build_root();
        let lib = AssetLibrary::scan(root.path());
        assert_eq!(lib.cover_set_labels(), vec!["Default", "Rusty Steel"]);
        assert_eq!(lib.shrapnel_set_labels(), vec!["Default", "Bolts"]);

        let selection = AssetSelection::default()
            .with_cover_set("Rusty Steel")
            .with_shrapnel_set("Bolts");
        let assets = lib.resolve(&selection);
        let light = assets.stencils(StencilTier::Light);
        assert_eq!(light.keys(), vec!["A", "B"]);
        let cover_a = light.get("A").unwrap().cover.path().unwrap();
        assert!(cover_a.ends_with("rusty_steel/A_33.png"));
        assert_eq!(assets.shrapnel.len(), 5);
    }

    #[test]
    fn unknown_labels_fall_back_to_default() {
        let root = build_root();
        let lib = AssetLibrary::scan(root.path());
        let selection = AssetSelection::default()
            .with_cover_set("Nope")
            .with_shrapnel_set("Nope");
        let assets = lib.resolve(&selection);
        assert_eq!(assets.stencils(StencilTier::Light).keys(), vec!["A"]);
        assert_eq!(assets.shrapnel.len(), 4);
    }

    #[test]
    fn empty_root_resolves_to_empty_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let lib = AssetLibrary::scan(dir.path());
        let assets = lib.resolve(&AssetSelection::default());
        assert_eq!(assets.tile_size, DEFAULT_TILE_SIZE);
        assert!(assets.stencils(StencilTier::Light).is_empty());
        assert!(assets.scorches.is_empty());
        assert_eq!(lib.cover_set_labels(), vec!["Default"]);
    }
}
