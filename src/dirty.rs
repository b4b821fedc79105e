//! Frame-scoped flag bookkeeping, so end-of-frame cleanup touches only what
//! was flagged.

use std::collections::HashSet;

use nalgebra_glm as glm;

use crate::chunk::TileFlags;
use crate::chunk_pool::{ChunkHandle, ChunkPool};
use crate::surface_cache::{AssetTable, SurfaceCache};

#[derive(Debug, Default)]
pub struct DirtyFlagTracker {
    chunks: HashSet<ChunkHandle>,
    tiles: HashSet<(ChunkHandle, glm::IVec2)>,
}

impl DirtyFlagTracker {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn track_chunk(&mut self, handle: ChunkHandle) -> bool {
        self.chunks.insert(handle)
    }

    pub fn track_tile(&mut self, handle: ChunkHandle, local: glm::IVec2) -> bool {
        self.tiles.insert((handle, local))
    }

    /// Drops everything recorded for `handle`. Must be called before the
    /// handle goes back to the pool, since the slot will be reused.
    pub fn forget(&mut self, handle: ChunkHandle) {
        self.chunks.remove(&handle);
        self.tiles.retain(|(owner, _)| *owner != handle);
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.tiles.is_empty()
    }

    pub fn tracked_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn tracked_tiles(&self) -> usize {
        self.tiles.len()
    }

    /// Clears every tracked tile's flags, then every tracked chunk's flags
    /// and rebuilds those chunks. A chunk whose tile lost a lift without the
    /// chunk itself being tracked is left dirty for the next refresh.
    /// Returns the number of rebuilds.
    pub fn clear_frame(
        &mut self,
        pool: &mut ChunkPool,
        cache: &SurfaceCache,
        assets: &AssetTable,
    ) -> usize {
        for (handle, local) in self.tiles.drain() {
            let chunk = pool.get_mut(handle);
            let lifted = match chunk.tile_mut(&local) {
                Some(tile) => {
                    let lifted = tile.flags.intersects(TileFlags::LIFTING);
                    tile.flags = TileFlags::empty();
                    lifted
                }
                None => false,
            };
            if lifted {
                chunk.dirty = true;
            }
        }

        let mut rebuilt = 0;
        for handle in self.chunks.drain() {
            let chunk = pool.get_mut(handle);
            chunk.flags = TileFlags::empty();
            cache.rebuild(chunk, assets);
            rebuilt += 1;
        }
        rebuilt
    }
}
