use std::env;
use std::path::PathBuf;

use anyhow::Context;
use isochunk::{start, AssetTable, EngineConfig, RippleEffect, Scene, TileMap};

const GENERATED_MAP_SIZE: i32 = 120;
const GENERATED_TILE_IDS: [i32; 6] = [0, 1, 2, 3, 4, 5];

/// `isochunk [map.txt] [asset_dir] [config.json]`; missing arguments fall
/// back to a generated map, flat shaded tiles and the default config.
fn main() -> anyhow::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    env_logger::init();

    let mut args = env::args_os().skip(1).map(PathBuf::from);
    let map_path = args.next();
    let asset_dir = args.next();
    let config_path = args.next();

    let config = match config_path {
        Some(path) => EngineConfig::from_json_file(&path)
            .with_context(|| format!("loading config {:?}", path))?,
        None => EngineConfig::default(),
    };

    let map = match map_path {
        Some(path) => TileMap::load(&path).with_context(|| format!("loading map {:?}", path))?,
        None => TileMap::generate(
            GENERATED_MAP_SIZE,
            GENERATED_MAP_SIZE,
            &GENERATED_TILE_IDS,
            rand::random(),
        )?,
    };

    let assets = match asset_dir {
        Some(dir) => AssetTable::load_dir(&dir, config.tile_size)
            .with_context(|| format!("loading assets from {:?}", dir))?,
        None => AssetTable::flat_shaded(&map.distinct_ids(), config.tile_size),
    };

    let mut scene = Scene::new(config, map, assets)?;
    scene.set_ripple(Some(RippleEffect::default()));
    pollster::block_on(start(scene))
}
