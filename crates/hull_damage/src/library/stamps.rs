//! Decal stamp loading and tile-sheet slicing.
use std::path::Path;
use std::sync::Arc;

use image::imageops;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::library::scan_folder_images;

/// Tile sizes a stamp sheet may be sliced into, in order of preference.
pub const STAMP_TILE_SIZES: [u32; 2] = [64, 128];

/// Slices a sheet into row-major square tiles of the first size in `tile_sizes`
/// that divides both dimensions; otherwise returns the sheet whole.
pub fn slice_sheet(sheet: RgbaImage, tile_sizes: &[u32]) -> Vec<RgbaImage> {
    let (w, h) = sheet.dimensions();
    let chosen = tile_sizes
        .iter()
        .copied()
        .find(|&s| s > 0 && w >= s && h >= s && w % s == 0 && h % s == 0);

    let Some(size) = chosen else {
        return vec![sheet];
    };
    if (w, h) == (size, size) {
        return vec![sheet];
    }

    let mut tiles = Vec::with_capacity(((w / size) * (h / size)) as usize);
    for top in (0..h).step_by(size as usize) {
        for left in (0..w).step_by(size as usize) {
            tiles.push(imageops::crop_imm(&sheet, left, top, size, size).to_image());
        }
    }
    tiles
}

/// Loads one stamp file as RGBA and slices it with `tile_sizes`; an empty list
/// keeps the file whole.
pub fn load_stamp_file(path: &Path, tile_sizes: &[u32]) -> Result<Vec<RgbaImage>> {
    let sheet = image::open(path)
        .map_err(|source| Error::AssetLoad {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Ok(slice_sheet(sheet, tile_sizes))
}

/// Loads every stamp file directly inside `folder`. Files that fail to decode are
/// logged and skipped.
pub fn load_stamp_dir(folder: &Path, tile_sizes: &[u32]) -> Vec<Arc<RgbaImage>> {
    let mut stamps = Vec::new();
    for path in scan_folder_images(folder) {
        match load_stamp_file(&path, tile_sizes) {
            Ok(tiles) => {
                debug!("Loaded {} stamp tile(s) from '{}'.", tiles.len(), path.display());
                stamps.extend(tiles.into_iter().map(Arc::new));
            }
            Err(e) => warn!("Skipping stamp: {}.", e),
        }
    }
    stamps
}
