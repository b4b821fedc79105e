use image::RgbaImage;
use indexmap::IndexMap;
use nalgebra_glm as glm;

bitflags::bitflags! {
    /// Transient per-frame state of a tile or chunk.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TileFlags: u8 {
        const MOUSE_OVER = 1 << 0;
        const RAISED = 1 << 1;
        const HIGHLIGHTED = 1 << 2;
    }
}

impl TileFlags {
    /// Flags that lift a tile when its chunk is composited.
    pub const LIFTING: TileFlags = TileFlags::MOUSE_OVER
        .union(TileFlags::RAISED)
        .union(TileFlags::HIGHLIGHTED);
}

pub type ChunkFlags = TileFlags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Position inside the owning chunk.
    pub local: glm::IVec2,
    pub tile_id: i32,
    pub flags: TileFlags,
}

impl Tile {
    pub fn new(local: glm::IVec2, tile_id: i32) -> Self {
        Self {
            local,
            tile_id,
            flags: TileFlags::empty(),
        }
    }
}

/// A block of tiles streamed and cached as one unit. Lives in a
/// [`ChunkPool`](crate::chunk_pool::ChunkPool) slot and is reassigned to a
/// new position each time it is acquired.
pub struct Chunk {
    pub pos: glm::IVec2,
    /// Screen position of the canvas top-left, camera excluded.
    pub iso_pos: glm::IVec2,
    /// Tiles in row-major insertion order, which is also back-to-front
    /// compositing order.
    pub tiles: IndexMap<glm::IVec2, Tile>,
    pub flags: ChunkFlags,
    /// Composited canvas. Allocated on first build and reused afterwards.
    pub surface: Option<RgbaImage>,
    /// Bumped on every rebuild.
    pub revision: u64,
    pub dirty: bool,
}

impl Chunk {
    pub fn new(pos: glm::IVec2) -> Self {
        Self {
            pos,
            iso_pos: glm::vec2(0, 0),
            tiles: IndexMap::new(),
            flags: ChunkFlags::empty(),
            surface: None,
            revision: 0,
            dirty: false,
        }
    }

    /// Drops tiles and flags and invalidates the cached canvas. The canvas
    /// buffer itself is kept for the next occupant.
    pub fn reset(&mut self) {
        self.tiles.clear();
        self.flags = ChunkFlags::empty();
        self.dirty = true;
    }

    pub fn tile_mut(&mut self, local: &glm::IVec2) -> Option<&mut Tile> {
        self.tiles.get_mut(local)
    }

    /// Sets `flags` on the tile at `local`; marks the chunk dirty when that
    /// changes anything the compositor draws. Returns whether the tile exists.
    pub fn flag_tile(&mut self, local: &glm::IVec2, flags: TileFlags) -> bool {
        let Some(tile) = self.tiles.get_mut(local) else {
            return false;
        };
        let before = tile.flags;
        tile.flags |= flags;
        if before.intersects(TileFlags::LIFTING) != tile.flags.intersects(TileFlags::LIFTING) {
            self.dirty = true;
        }
        true
    }
}
