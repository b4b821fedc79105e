use std::collections::HashMap;
use std::path::Path;

use image::{imageops, Rgba, RgbaImage};
use nalgebra_glm as glm;

use crate::chunk::{Chunk, TileFlags};
use crate::config::EngineConfig;
use crate::coords::IsoProjection;
use crate::error::{EngineError, Result};
use crate::tile_map::TileMap;

/// Tile images keyed by tile id, plus the stand-in drawn for ids that have
/// no image.
pub struct AssetTable {
    images: HashMap<i32, RgbaImage>,
    placeholder: RgbaImage,
}

impl AssetTable {
    pub fn new(placeholder: RgbaImage) -> Self {
        Self {
            images: HashMap::new(),
            placeholder,
        }
    }

    pub fn with_placeholder(tile_size: i32) -> Self {
        Self::new(block_image(tile_size, Rgba([255, 0, 255, 255])))
    }

    /// Loads every image in `dir` whose name carries a numeric id after the
    /// first underscore, e.g. `asset_007.png` becomes tile 7.
    pub fn load_dir(dir: &Path, tile_size: i32) -> Result<Self> {
        let mut table = Self::with_placeholder(tile_size);
        let entries = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| EngineError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
                .path();
            let Some(id) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_asset_id)
            else {
                log::debug!("Skipping {:?}: no tile id in name", path);
                continue;
            };
            if !image::ImageFormat::from_path(&path).is_ok_and(|format| format.reading_enabled()) {
                log::warn!("Skipping {:?}: unsupported image format", path);
                continue;
            }
            let image = image::open(&path)?.to_rgba8();
            table.insert(id, image);
        }
        log::info!("Loaded {} tile images from {:?}", table.len(), dir);
        Ok(table)
    }

    /// One shaded block per id, colours spread around the hue wheel.
    pub fn flat_shaded(ids: &[i32], tile_size: i32) -> Self {
        let mut table = Self::with_placeholder(tile_size);
        for (i, &id) in ids.iter().enumerate() {
            let hue = i as f32 / ids.len().max(1) as f32;
            table.insert(id, block_image(tile_size, hue_color(hue)));
        }
        table
    }

    pub fn insert(&mut self, tile_id: i32, image: RgbaImage) {
        self.images.insert(tile_id, image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn lookup(&self, tile_id: i32) -> Result<&RgbaImage> {
        self.images
            .get(&tile_id)
            .ok_or(EngineError::MissingAsset { tile_id })
    }

    pub fn get_or_placeholder(&self, tile_id: i32) -> &RgbaImage {
        self.images.get(&tile_id).unwrap_or(&self.placeholder)
    }

    /// Makes sure every id used by `map` resolves. Each missing id is
    /// reported once and bound to the placeholder. Returns the missing ids.
    pub fn reconcile(&mut self, map: &TileMap) -> Vec<i32> {
        let mut missing = Vec::new();
        for id in map.distinct_ids() {
            if let Err(err) = self.lookup(id) {
                log::warn!("{}, substituting placeholder", err);
                missing.push(id);
            }
        }
        for &id in &missing {
            self.images.insert(id, self.placeholder.clone());
        }
        missing
    }
}

/// `asset_012.png` -> 12
pub fn parse_asset_id(file_name: &str) -> Option<i32> {
    let info = file_name.split('_').nth(1)?;
    let stem = &info[..info.find('.')?];
    stem.parse().ok()
}

/// Composites chunk canvases.
pub struct SurfaceCache {
    canvas: IsoProjection,
    width: u32,
    height: u32,
    raise: i32,
}

impl SurfaceCache {
    pub fn new(config: &EngineConfig) -> Self {
        let tile = config.tile_size;
        let chunk = config.chunk_tile_size();
        Self {
            canvas: IsoProjection::chunk_canvas(config),
            // one tile of padding left, right and below, two above
            width: (chunk + 2 * tile) as u32,
            height: (chunk / 2 - tile / 2 + 3 * tile) as u32,
            raise: config.tile_raise_pixels,
        }
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Top-left of a tile's image inside the canvas, lift applied.
    pub fn tile_offset(&self, local: &glm::IVec2, flags: TileFlags) -> glm::IVec2 {
        let mut pos = self.canvas.grid_to_iso(local);
        if flags.intersects(TileFlags::LIFTING) {
            pos.y -= self.raise;
        }
        pos
    }

    /// Redraws the chunk's canvas from its tiles and clears `dirty`.
    pub fn rebuild(&self, chunk: &mut Chunk, assets: &AssetTable) {
        let Chunk {
            tiles,
            surface,
            revision,
            dirty,
            ..
        } = chunk;
        let size = (self.width, self.height);
        if surface.as_ref().is_some_and(|s| s.dimensions() != size) {
            *surface = None;
        }
        let surface = surface.get_or_insert_with(|| RgbaImage::new(size.0, size.1));
        for pixel in surface.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        for tile in tiles.values() {
            let pos = self.tile_offset(&tile.local, tile.flags);
            let image = assets.get_or_placeholder(tile.tile_id);
            imageops::overlay(surface, image, pos.x as i64, pos.y as i64);
        }
        *revision += 1;
        *dirty = false;
    }

    /// Rebuilds only when the chunk is dirty. Returns whether it did.
    pub fn refresh(&self, chunk: &mut Chunk, assets: &AssetTable) -> bool {
        if !chunk.dirty {
            return false;
        }
        self.rebuild(chunk, assets);
        true
    }
}

/// An isometric block `size` pixels wide: a diamond top face over two
/// darker side faces.
pub fn block_image(size: i32, top: Rgba<u8>) -> RgbaImage {
    let half = size as f32 / 2.0;
    let quarter = size as f32 / 4.0;
    let shade = |color: Rgba<u8>, factor: f32| {
        let [r, g, b, a] = color.0;
        Rgba([
            (r as f32 * factor) as u8,
            (g as f32 * factor) as u8,
            (b as f32 * factor) as u8,
            a,
        ])
    };
    RgbaImage::from_fn(size as u32, size as u32, |x, y| {
        let dx = x as f32 + 0.5 - half;
        let y = y as f32 + 0.5;
        let reach = quarter * (1.0 - dx.abs() / half);
        if reach < 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        if (y - quarter).abs() <= reach {
            top
        } else if y > quarter && y <= quarter + half + reach {
            shade(top, if dx < 0.0 { 0.7 } else { 0.5 })
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn hue_color(hue: f32) -> Rgba<u8> {
    let h = (hue.fract() * 6.0).max(0.0);
    let x = 1.0 - ((h % 2.0) - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |v: f32| (64.0 + v * 160.0) as u8;
    Rgba([channel(r), channel(g), channel(b), 255])
}
