//! Tunable parameters for a damage render.
//!
//! [`DamageParams`] is a fixed-schema record with builder-style setters. Values
//! outside the documented ranges are clamped by [`DamageParams::clamped`], which the
//! pipeline applies at its boundary; [`DamageParams::validate`] reports them instead
//! for callers that prefer to reject.
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::library::StencilTier;

pub const MIN_DECAL_SCALE: f32 = 0.05;
pub const MAX_DECAL_SCALE: f32 = 1.0;
pub const MAX_DECAL_ROTATION: f32 = 180.0;
pub const MAX_RIM_WIDTH: u32 = 64;
pub const DEFAULT_SEED: u32 = 1337;

/// Named damage preset selecting the stencil tier(s) used for holes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageLevel {
    /// `"33"`: light stencils only.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "33"))]
    Light,
    /// `"50"`: light and heavy stencils at half density each.
    #[cfg_attr(feature = "serde", serde(rename = "50"))]
    Mixed,
    /// `"66"`: heavy stencils only.
    #[cfg_attr(feature = "serde", serde(rename = "66"))]
    Heavy,
}

impl DamageLevel {
    pub const ALL: [DamageLevel; 3] = [DamageLevel::Light, DamageLevel::Mixed, DamageLevel::Heavy];

    pub fn as_str(self) -> &'static str {
        match self {
            DamageLevel::Light => "33",
            DamageLevel::Mixed => "50",
            DamageLevel::Heavy => "66",
        }
    }

    /// Stencil tier for single-tier levels; `None` for the mixed level.
    pub fn tier(self) -> Option<StencilTier> {
        match self {
            DamageLevel::Light => Some(StencilTier::Light),
            DamageLevel::Mixed => None,
            DamageLevel::Heavy => Some(StencilTier::Heavy),
        }
    }
}

impl fmt::Display for DamageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DamageLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "33" => Ok(DamageLevel::Light),
            "50" => Ok(DamageLevel::Mixed),
            "66" => Ok(DamageLevel::Heavy),
            other => Err(Error::InvalidConfig(format!(
                "unknown damage level '{other}' (expected 33, 50 or 66)"
            ))),
        }
    }
}

/// Stencil hole settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HoleParams {
    pub enabled: bool,
    /// Probability in [0, 1] that a grid cell receives a hole.
    pub density: f32,
    /// Rim blur radius in pixels, [0, 64]; 0 disables the rim.
    pub rim_width: u32,
    /// Rim blend factor in [0, 1]; 0 disables the rim.
    pub rim_darkness: f32,
}

impl Default for HoleParams {
    fn default() -> Self {
        Self {
            enabled: true,
            density: 0.20,
            rim_width: 0,
            rim_darkness: 0.0,
        }
    }
}

impl HoleParams {
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_rim(mut self, width: u32, darkness: f32) -> Self {
        self.rim_width = width;
        self.rim_darkness = darkness;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn clamped(&self) -> Self {
        Self {
            enabled: self.enabled,
            density: clamp01(self.density),
            rim_width: self.rim_width.min(MAX_RIM_WIDTH),
            rim_darkness: clamp01(self.rim_darkness),
        }
    }

    fn validate(&self) -> Result<()> {
        check_unit("holes.density", self.density)?;
        check_unit("holes.rim_darkness", self.rim_darkness)?;
        if self.rim_width > MAX_RIM_WIDTH {
            return Err(Error::InvalidConfig(format!(
                "holes.rim_width must be <= {MAX_RIM_WIDTH}, got {}",
                self.rim_width
            )));
        }
        Ok(())
    }
}

/// Settings for one decal kind (scorch or shrapnel).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecalParams {
    pub enabled: bool,
    /// Count driver in [0, 1].
    pub density: f32,
    /// Opacity multiplier in [0, 1].
    pub severity: f32,
    /// Smallest stamp scale factor, [0.05, 1.0].
    pub min_scale: f32,
    /// Largest stamp scale factor, [0.05, 1.0].
    pub max_scale: f32,
    /// Rotation bound in degrees, [0, 180]; stamps turn by up to ± this.
    pub max_rotation: f32,
}

impl Default for DecalParams {
    fn default() -> Self {
        Self::scorch(0.20)
    }
}

impl DecalParams {
    /// Scorch defaults for a given density.
    pub fn scorch(density: f32) -> Self {
        Self {
            enabled: true,
            density,
            severity: 0.90,
            min_scale: 0.50,
            max_scale: 1.00,
            max_rotation: 180.0,
        }
    }

    /// Shrapnel defaults for a given density; disabled unless switched on.
    pub fn shrapnel(density: f32) -> Self {
        Self {
            enabled: false,
            density,
            severity: 0.85,
            min_scale: 0.05,
            max_scale: 1.00,
            max_rotation: 180.0,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_severity(mut self, severity: f32) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_scale(mut self, min_scale: f32, max_scale: f32) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    pub fn with_max_rotation(mut self, degrees: f32) -> Self {
        self.max_rotation = degrees;
        self
    }

    pub fn clamped(&self) -> Self {
        let a = clamp_scale(self.min_scale);
        let b = clamp_scale(self.max_scale);
        Self {
            enabled: self.enabled,
            density: clamp01(self.density),
            severity: clamp01(self.severity),
            min_scale: a.min(b),
            max_scale: a.max(b),
            max_rotation: if self.max_rotation.is_nan() {
                0.0
            } else {
                self.max_rotation.clamp(0.0, MAX_DECAL_ROTATION)
            },
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        check_unit(&format!("{name}.density"), self.density)?;
        check_unit(&format!("{name}.severity"), self.severity)?;
        for (field, v) in [("min_scale", self.min_scale), ("max_scale", self.max_scale)] {
            if !(MIN_DECAL_SCALE..=MAX_DECAL_SCALE).contains(&v) {
                return Err(Error::InvalidConfig(format!(
                    "{name}.{field} must be in [{MIN_DECAL_SCALE}, {MAX_DECAL_SCALE}], got {v}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(Error::InvalidConfig(format!(
                "{name}.min_scale ({}) exceeds max_scale ({})",
                self.min_scale, self.max_scale
            )));
        }
        if !(0.0..=MAX_DECAL_ROTATION).contains(&self.max_rotation) {
            return Err(Error::InvalidConfig(format!(
                "{name}.max_rotation must be in [0, {MAX_DECAL_ROTATION}], got {}",
                self.max_rotation
            )));
        }
        Ok(())
    }
}

/// Everything a render needs besides the base image and assets.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DamageParams {
    pub holes: HoleParams,
    pub scorch: DecalParams,
    pub shrapnel: DecalParams,
    pub seed: u32,
    pub level: DamageLevel,
}

impl Default for DamageParams {
    fn default() -> Self {
        Self::preset(DamageLevel::Light)
    }
}

impl DamageParams {
    /// Level defaults: hole, scorch and shrapnel densities scale with the level;
    /// everything else is shared.
    pub fn preset(level: DamageLevel) -> Self {
        let (holes, scorch, shrapnel) = match level {
            DamageLevel::Light => (0.20, 0.20, 0.10),
            DamageLevel::Mixed => (0.30, 0.30, 0.15),
            DamageLevel::Heavy => (0.40, 0.50, 0.20),
        };
        Self {
            holes: HoleParams::default().with_density(holes),
            scorch: DecalParams::scorch(scorch),
            shrapnel: DecalParams::shrapnel(shrapnel),
            seed: DEFAULT_SEED,
            level,
        }
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    /// Switches the level without touching densities.
    pub fn with_level(mut self, level: DamageLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_holes(mut self, holes: HoleParams) -> Self {
        self.holes = holes;
        self
    }

    pub fn with_scorch(mut self, scorch: DecalParams) -> Self {
        self.scorch = scorch;
        self
    }

    pub fn with_shrapnel(mut self, shrapnel: DecalParams) -> Self {
        self.shrapnel = shrapnel;
        self
    }

    /// Returns a copy with every field pulled into its documented range.
    pub fn clamped(&self) -> Self {
        Self {
            holes: self.holes.clamped(),
            scorch: self.scorch.clamped(),
            shrapnel: self.shrapnel.clamped(),
            seed: self.seed,
            level: self.level,
        }
    }

    /// Validates the parameters, returning an error for the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        self.holes.validate()?;
        self.scorch.validate("scorch")?;
        self.shrapnel.validate("shrapnel")?;
        Ok(())
    }
}

/// Derives a fresh seed: XOR with a value in [1, 2^30] mixed from `entropy`,
/// kept within [0, 2^31 - 1].
pub fn reroll_seed(seed: u32, entropy: u64) -> u32 {
    let mut x = entropy.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^= x >> 31;
    let flip = 1 + (x % (1u64 << 30)) as u32;
    (seed ^ flip) & 0x7FFF_FFFF
}

fn clamp01(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn clamp_scale(v: f32) -> f32 {
    if v.is_nan() {
        MIN_DECAL_SCALE
    } else {
        v.clamp(MIN_DECAL_SCALE, MAX_DECAL_SCALE)
    }
}

fn check_unit(name: &str, v: f32) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be in [0, 1], got {v}"
        )))
    }
}
