//! Punch/cover stencil pairs grouped by key and damage tier.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use image::RgbaImage;

use crate::error::{Error, Result};
use crate::library::scan_folder_images;

/// Damage tier of a stencil file, taken from its `_33` / `_66` name suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StencilTier {
    #[cfg_attr(feature = "serde", serde(rename = "33"))]
    Light,
    #[cfg_attr(feature = "serde", serde(rename = "66"))]
    Heavy,
}

impl StencilTier {
    pub const ALL: [StencilTier; 2] = [StencilTier::Light, StencilTier::Heavy];

    pub fn suffix(self) -> &'static str {
        match self {
            StencilTier::Light => "33",
            StencilTier::Heavy => "66",
        }
    }
}

impl fmt::Display for StencilTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for StencilTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "33" => Ok(StencilTier::Light),
            "66" => Ok(StencilTier::Heavy),
            other => Err(Error::InvalidConfig(format!(
                "unknown stencil tier '{other}' (expected 33 or 66)"
            ))),
        }
    }
}

/// Where a stencil tile comes from.
#[derive(Clone, Debug)]
pub enum TileSource {
    /// Decoded on demand from disk.
    File(PathBuf),
    /// Already in memory.
    Image(Arc<RgbaImage>),
}

impl TileSource {
    /// Returns the tile as RGBA, decoding it if it lives on disk.
    pub fn load(&self) -> Result<RgbaImage> {
        match self {
            TileSource::File(path) => image::open(path)
                .map(|img| img.to_rgba8())
                .map_err(|source| Error::AssetLoad {
                    path: path.clone(),
                    source,
                }),
            TileSource::Image(img) => Ok(img.as_ref().clone()),
        }
    }

    /// Pixel dimensions without decoding the full image when possible.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        match self {
            TileSource::File(path) => {
                image::image_dimensions(path).map_err(|source| Error::AssetLoad {
                    path: path.clone(),
                    source,
                })
            }
            TileSource::Image(img) => Ok(img.dimensions()),
        }
    }

    /// Path of a file-backed tile.
    pub fn path(&self) -> Option<&Path> {
        match self {
            TileSource::File(p) => Some(p),
            TileSource::Image(_) => None,
        }
    }
}

impl From<RgbaImage> for TileSource {
    fn from(img: RgbaImage) -> Self {
        TileSource::Image(Arc::new(img))
    }
}

impl From<PathBuf> for TileSource {
    fn from(path: PathBuf) -> Self {
        TileSource::File(path)
    }
}

/// Punch and cover halves of one stencil key.
#[derive(Clone, Debug)]
pub struct StencilPair {
    pub punch: TileSource,
    pub cover: TileSource,
}

impl StencilPair {
    pub fn new(punch: impl Into<TileSource>, cover: impl Into<TileSource>) -> Self {
        Self {
            punch: punch.into(),
            cover: cover.into(),
        }
    }
}

/// All usable stencil pairs of one tier, keyed and iterated in ascending key order.
#[derive(Clone, Debug)]
pub struct StencilSet {
    pub tier: StencilTier,
    pairs: BTreeMap<String, StencilPair>,
}

impl StencilSet {
    /// Creates an empty set.
    pub fn new(tier: StencilTier) -> Self {
        Self {
            tier,
            pairs: BTreeMap::new(),
        }
    }

    /// Builds a set from punch and cover file maps; only keys present in both are kept.
    pub fn from_files(
        tier: StencilTier,
        punch: &BTreeMap<String, PathBuf>,
        cover: &BTreeMap<String, PathBuf>,
    ) -> Self {
        let pairs = punch
            .iter()
            .filter_map(|(key, p)| {
                cover
                    .get(key)
                    .map(|c| (key.clone(), StencilPair::new(p.clone(), c.clone())))
            })
            .collect();
        Self { tier, pairs }
    }

    /// Adds or replaces a pair.
    pub fn insert(&mut self, key: impl Into<String>, pair: StencilPair) -> &mut Self {
        self.pairs.insert(key.into(), pair);
        self
    }

    /// Builder variant of [`StencilSet::insert`].
    pub fn with_pair(mut self, key: impl Into<String>, pair: StencilPair) -> Self {
        self.insert(key, pair);
        self
    }

    pub fn get(&self, key: &str) -> Option<&StencilPair> {
        self.pairs.get(key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<&str> {
        self.pairs.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StencilPair)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Maps `key -> path` for files in `folder` whose stem ends with `_<tier>`.
pub fn group_stencils_by_suffix(folder: &Path, tier: StencilTier) -> BTreeMap<String, PathBuf> {
    let tail = format!("_{}", tier.suffix());
    scan_folder_images(folder)
        .into_iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_str()?;
            let key = stem.strip_suffix(tail.as_str())?;
            Some((key.to_owned(), path.clone()))
        })
        .collect()
}
