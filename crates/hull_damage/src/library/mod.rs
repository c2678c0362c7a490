//! Asset discovery for stencils and decal stamps.
//!
//! An assets root holds four folders:
//! - `hole_punch/`: `<key>_33.<ext>` / `<key>_66.<ext>` punch stencils (opaque = hole)
//! - `hole_covers/`: cover stencils with the same names; sub-directories are named cover sets
//! - `scorches/`: scorch stamps or tile sheets
//! - `shrapnel/`: shrapnel stamps or tile sheets; sub-directories are named shrapnel sets
//!
//! [`AssetLibrary::scan`] enumerates these once and
//! [`AssetLibrary::resolve`] turns a selection into the immutable
//! [`crate::damage::pipeline::DamageAssets`] bundle used by a render.
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

pub mod assets;
pub mod stamps;
pub mod stencil;

pub use assets::{AssetLibrary, AssetSelection};
pub use stamps::{load_stamp_dir, load_stamp_file, slice_sheet, STAMP_TILE_SIZES};
pub use stencil::{group_stencils_by_suffix, StencilPair, StencilSet, StencilTier, TileSource};

pub const PUNCH_DIR: &str = "hole_punch";
pub const COVER_DIR: &str = "hole_covers";
pub const SCORCH_DIR: &str = "scorches";
pub const SHRAPNEL_DIR: &str = "shrapnel";

/// Label that selects only the root-level assets of a folder.
pub const DEFAULT_SET_LABEL: &str = "Default";

/// File extensions recognized as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Returns `true` if the path has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Lists image files directly inside `folder`, sorted by file name.
/// A missing folder yields an empty list.
pub fn scan_folder_images(folder: &Path) -> Vec<PathBuf> {
    direct_children(folder)
        .into_iter()
        .filter(|p| p.is_file() && is_image_file(p))
        .collect()
}

/// Lists sub-directories directly inside `folder`, sorted by name.
pub fn scan_subdirs(folder: &Path) -> Vec<PathBuf> {
    direct_children(folder)
        .into_iter()
        .filter(|p| p.is_dir())
        .collect()
}

fn direct_children(folder: &Path) -> Vec<PathBuf> {
    if !folder.is_dir() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(e) => out.push(e.into_path()),
            Err(err) => warn!("Skipping unreadable entry in '{}': {}.", folder.display(), err),
        }
    }
    out
}

/// Turns a directory name into a set label: `_`/`-` become spaces, then title case.
pub fn format_set_label(name: &str) -> String {
    let cleaned = name.replace(['_', '-'], " ");
    let cleaned = cleaned.trim();
    title_case(if cleaned.is_empty() { name } else { cleaned })
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_labels_are_title_cased() {
        assert_eq!(format_set_label("rusty_steel"), "Rusty Steel");
        assert_eq!(format_set_label("  blue-ALLOY "), "Blue Alloy");
        assert_eq!(format_set_label("mk2plate"), "Mk2Plate");
        assert_eq!(format_set_label("__"), "__");
    }

    #[test]
    fn image_extensions_ignore_case() {
        assert!(is_image_file(Path::new("a/B_33.PNG")));
        assert!(is_image_file(Path::new("x.jpeg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn missing_folder_scans_empty() {
        assert!(scan_folder_images(Path::new("/definitely/not/here")).is_empty());
        assert!(scan_subdirs(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn scan_lists_only_direct_image_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.BMP"), b"x").unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("steel")).unwrap();
        std::fs::write(dir.path().join("steel").join("c.png"), b"x").unwrap();

        let files: Vec<_> = scan_folder_images(dir.path())
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a.BMP", "b.png"]);

        let dirs = scan_subdirs(dir.path());
        assert_eq!(dirs.len(), 1);
        assert!(dirs[0].ends_with("steel"));
    }
}
