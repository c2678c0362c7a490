//! `sets` subcommand.
use std::path::Path;

use anyhow::{bail, Result};
use hull_damage::prelude::{AssetLibrary, AssetSelection, StencilTier};
use serde_json::json;

pub(crate) fn run(assets: &Path, as_json: bool) -> Result<()> {
    if !assets.is_dir() {
        bail!("Assets root not found: {}", assets.display());
    }
    let library = AssetLibrary::scan(assets);
    let report = describe(&library);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Assets root: {}", library.root().display());
    println!("Tile size: {}px", library.tile_size());
    println!("Cover sets:");
    for set in report["cover_sets"].as_array().into_iter().flatten() {
        println!(
            "  {:<24} 33: [{}]  66: [{}]",
            set["label"].as_str().unwrap_or_default(),
            join_keys(&set["33"]),
            join_keys(&set["66"])
        );
    }
    println!("Shrapnel sets:");
    for label in report["shrapnel_sets"].as_array().into_iter().flatten() {
        println!("  {}", label.as_str().unwrap_or_default());
    }
    Ok(())
}

/// Cover sets with their usable stencil keys per tier, plus shrapnel set labels.
fn describe(library: &AssetLibrary) -> serde_json::Value {
    let cover_sets: Vec<serde_json::Value> = library
        .cover_set_labels()
        .into_iter()
        .map(|label| {
            let assets = library.resolve(&AssetSelection::default().with_cover_set(&label));
            json!({
                "label": label,
                "33": assets.stencils(StencilTier::Light).keys(),
                "66": assets.stencils(StencilTier::Heavy).keys(),
            })
        })
        .collect();

    json!({
        "tile_size": library.tile_size(),
        "cover_sets": cover_sets,
        "shrapnel_sets": library.shrapnel_set_labels(),
    })
}

fn join_keys(keys: &serde_json::Value) -> String {
    keys.as_array()
        .into_iter()
        .flatten()
        .filter_map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    fn write_tile(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn describe_lists_sets_and_keys() {
        let dir = tempfile::tempdir().unwrap();
        let r = dir.path();
        write_tile(&r.join("hole_punch/A_33.png"));
        write_tile(&r.join("hole_punch/B_66.png"));
        write_tile(&r.join("hole_covers/A_33.png"));
        write_tile(&r.join("hole_covers/scorched_plate/B_66.png"));
        write_tile(&r.join("shrapnel/bolts/bolt.png"));

        let report = describe(&AssetLibrary::scan(r));
        assert_eq!(report["tile_size"], 16);
        assert_eq!(report["cover_sets"][0]["label"], "Default");
        assert_eq!(report["cover_sets"][0]["33"], json!(["A"]));
        assert_eq!(report["cover_sets"][0]["66"], json!([]));
        assert_eq!(report["cover_sets"][1]["label"], "Scorched Plate");
        assert_eq!(report["cover_sets"][1]["66"], json!(["B"]));
        assert_eq!(report["shrapnel_sets"], json!(["Default", "Bolts"]));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(&dir.path().join("nope"), false).is_err());
    }

    #[test]
    fn join_keys_formats_list() {
        assert_eq!(join_keys(&json!(["A", "B"])), "A, B");
        assert_eq!(join_keys(&json!([])), "");
    }
}
