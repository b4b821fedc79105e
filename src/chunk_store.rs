use indexmap::IndexMap;
use nalgebra_glm as glm;

use crate::chunk::{Chunk, ChunkFlags, Tile, TileFlags};
use crate::chunk_pool::{ChunkHandle, ChunkPool};
use crate::config::EngineConfig;
use crate::coords::{grid_to_chunk, IsoProjection};
use crate::dirty::DirtyFlagTracker;
use crate::error::{EngineError, Result};
use crate::surface_cache::{AssetTable, SurfaceCache};
use crate::tile_map::TileMap;
use crate::visibility::{ChunkBounds, VisibilitySet};

/// What one [`ChunkStore::sync`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub center: glm::IVec2,
    pub loaded: Vec<glm::IVec2>,
    pub unloaded: Vec<glm::IVec2>,
    /// Requested positions that fell outside the map.
    pub out_of_bounds: usize,
    pub rebuilt: usize,
}

/// Keeps the resident chunk table in step with the camera. The resident
/// table and the pool together own every chunk; residency only changes in
/// [`Self::sync`].
pub struct ChunkStore {
    map: TileMap,
    side: i32,
    bounds: ChunkBounds,
    projection: IsoProjection,
    visibility: VisibilitySet,
    pool: ChunkPool,
    resident: IndexMap<glm::IVec2, ChunkHandle>,
    cache: SurfaceCache,
    tracker: DirtyFlagTracker,
}

impl ChunkStore {
    pub fn new(config: &EngineConfig, map: TileMap) -> Result<Self> {
        config.validate()?;
        let visibility = VisibilitySet::new(config);
        let window = visibility.window().len();
        let pool_size = config.effective_pool_size();
        if pool_size < window {
            return Err(EngineError::PoolUndersized {
                pool: pool_size,
                window,
            });
        }
        let side = config.chunk_side_length;
        let bounds = ChunkBounds {
            extent: map.chunk_extent(side),
        };
        log::info!(
            "Map {}x{} tiles -> {}x{} chunks of {}; pool of {} for a window of {}",
            map.width(),
            map.height(),
            bounds.extent.x,
            bounds.extent.y,
            side,
            pool_size,
            window
        );
        Ok(Self {
            map,
            side,
            bounds,
            projection: IsoProjection::chunks(config),
            visibility,
            pool: ChunkPool::with_capacity(pool_size),
            resident: IndexMap::with_capacity(window),
            cache: SurfaceCache::new(config),
            tracker: DirtyFlagTracker::new(),
        })
    }

    /// Loads and unloads chunks so the resident set is exactly the window
    /// around the camera's centre chunk, clipped to the map. Unloads run
    /// before loads so a full pool can always absorb the shift.
    pub fn sync(&mut self, camera_offset: &glm::Vec2, assets: &AssetTable) -> Result<SyncReport> {
        let center = self.visibility.center_chunk(camera_offset);
        let visible = self.visibility.visible_chunks(&center);
        let mut report = SyncReport {
            center,
            ..Default::default()
        };

        let to_unload: Vec<glm::IVec2> = self
            .resident
            .keys()
            .filter(|pos| !visible.contains(*pos))
            .copied()
            .collect();
        for pos in to_unload {
            self.unload(&pos);
            report.unloaded.push(pos);
        }

        for pos in &visible {
            if self.resident.contains_key(pos) {
                continue;
            }
            if !self.bounds.contains(pos) {
                report.out_of_bounds += 1;
                continue;
            }
            self.load(*pos)?;
            report.loaded.push(*pos);
        }

        report.rebuilt = self.rebuild_dirty(assets);
        if !report.loaded.is_empty() || !report.unloaded.is_empty() {
            log::debug!(
                "sync center {:?}: +{} -{} ({} resident, {} free)",
                (center.x, center.y),
                report.loaded.len(),
                report.unloaded.len(),
                self.resident.len(),
                self.pool.free_len()
            );
        }
        Ok(report)
    }

    fn load(&mut self, pos: glm::IVec2) -> Result<ChunkHandle> {
        let handle = self.pool.acquire(pos, self.projection.grid_to_iso(&pos))?;
        let chunk = self.pool.get_mut(handle);
        chunk.tiles.extend(
            self.map
                .chunk_block(&pos, self.side)
                .map(|(local, id)| (local, Tile::new(local, id))),
        );
        chunk.dirty = true;
        if self.resident.insert(pos, handle).is_some() {
            panic!("chunk {:?} already resident", pos);
        }
        Ok(handle)
    }

    fn unload(&mut self, pos: &glm::IVec2) {
        let handle = self
            .resident
            .swap_remove(pos)
            .unwrap_or_else(|| panic!("chunk {:?} not resident", pos));
        self.tracker.forget(handle);
        self.pool.release(handle);
    }

    /// Rebuilds the canvas of every dirty resident chunk and nothing else.
    pub fn rebuild_dirty(&mut self, assets: &AssetTable) -> usize {
        let cache = &self.cache;

        #[cfg(feature = "parallel")]
        let rebuilt = {
            use rayon::prelude::*;
            self.pool
                .par_live_chunks_mut()
                .map(|chunk| cache.refresh(chunk, assets) as usize)
                .sum::<usize>()
        };

        #[cfg(not(feature = "parallel"))]
        let rebuilt = self
            .pool
            .live_chunks_mut()
            .map(|chunk| cache.refresh(chunk, assets) as usize)
            .sum::<usize>();

        rebuilt
    }

    /// Sets flags on the tile at global `grid_pos` for this frame. Returns
    /// false when the tile is empty or its chunk is not resident.
    pub fn flag_tile(&mut self, grid_pos: &glm::IVec2, flags: TileFlags) -> bool {
        let (chunk_pos, local) = grid_to_chunk(grid_pos, self.side);
        let Some(&handle) = self.resident.get(&chunk_pos) else {
            return false;
        };
        if !self.pool.get_mut(handle).flag_tile(&local, flags) {
            return false;
        }
        self.tracker.track_tile(handle, local);
        self.tracker.track_chunk(handle);
        true
    }

    /// Sets flags on a resident chunk for this frame.
    pub fn flag_chunk(&mut self, chunk_pos: &glm::IVec2, flags: ChunkFlags) -> bool {
        let Some(&handle) = self.resident.get(chunk_pos) else {
            return false;
        };
        self.pool.get_mut(handle).flags |= flags;
        self.tracker.track_chunk(handle);
        true
    }

    /// Clears this frame's flags. Call once per frame after rendering.
    pub fn clear_frame(&mut self, assets: &AssetTable) -> usize {
        self.tracker
            .clear_frame(&mut self.pool, &self.cache, assets)
    }

    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    pub fn resident_positions(&self) -> impl Iterator<Item = &glm::IVec2> {
        self.resident.keys()
    }

    pub fn resident(&self) -> impl Iterator<Item = (&glm::IVec2, &Chunk)> {
        self.resident
            .iter()
            .map(|(pos, &handle)| (pos, self.pool.get(handle)))
    }

    pub fn chunk_at(&self, chunk_pos: &glm::IVec2) -> Option<&Chunk> {
        self.resident
            .get(chunk_pos)
            .map(|&handle| self.pool.get(handle))
    }

    pub fn tile_at(&self, grid_pos: &glm::IVec2) -> Option<&Tile> {
        let (chunk_pos, local) = grid_to_chunk(grid_pos, self.side);
        self.chunk_at(&chunk_pos)?.tiles.get(&local)
    }

    pub fn pool(&self) -> &ChunkPool {
        &self.pool
    }

    pub fn tracker(&self) -> &DirtyFlagTracker {
        &self.tracker
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn bounds(&self) -> ChunkBounds {
        self.bounds
    }

    pub fn side(&self) -> i32 {
        self.side
    }

    pub fn window_len(&self) -> usize {
        self.visibility.window().len()
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        self.cache.canvas_size()
    }

    pub fn center_chunk(&self, camera_offset: &glm::Vec2) -> glm::IVec2 {
        self.visibility.center_chunk(camera_offset)
    }
}
