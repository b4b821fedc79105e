use nalgebra_glm as glm;

use crate::chunk::TileFlags;
use crate::chunk_store::ChunkStore;

/// Concentric rings of raised tiles spreading out from a point.
#[derive(Debug, Clone, PartialEq)]
pub struct RippleEffect {
    pub center: glm::IVec2,
    pub ring_count: u32,
    /// Tiles between neighbouring rings.
    pub spacing: f32,
    /// Tiles per second.
    pub speed: f32,
    /// Half-width of a ring in tiles.
    pub thickness: f32,
}

impl Default for RippleEffect {
    fn default() -> Self {
        Self {
            center: glm::vec2(15, 15),
            ring_count: 10,
            spacing: 10.0,
            speed: 1.0,
            thickness: 1.0,
        }
    }
}

impl RippleEffect {
    pub fn ring_radius(&self, ring: u32, time: f32) -> f32 {
        ring as f32 * self.spacing + self.speed * time
    }

    pub fn on_ring(&self, grid_pos: &glm::IVec2, time: f32) -> bool {
        let delta = grid_pos - self.center;
        let dist = ((delta.x * delta.x + delta.y * delta.y) as f32).sqrt();
        (0..self.ring_count).any(|ring| (dist - self.ring_radius(ring, time)).abs() <= self.thickness)
    }

    /// Raises every resident tile lying on a ring at `time`. Flags last one
    /// frame. Returns the number of tiles raised.
    pub fn apply(&self, store: &mut ChunkStore, time: f32) -> usize {
        let side = store.side();
        let hits: Vec<glm::IVec2> = store
            .resident()
            .flat_map(|(pos, chunk)| {
                let origin = pos * side;
                chunk.tiles.keys().map(move |local| origin + local)
            })
            .filter(|grid_pos| self.on_ring(grid_pos, time))
            .collect();
        hits.iter()
            .filter(|grid_pos| store.flag_tile(grid_pos, TileFlags::RAISED))
            .count()
    }
}
