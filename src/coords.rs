//! Grid, chunk and isometric screen coordinates.
//!
//! All projections share one pair of formulas, parameterised by the cell
//! size (a tile for grid coordinates, a whole chunk for chunk coordinates):
//!
//! ```text
//! iso_x = (x - y) * cell / 2        x = (2 * iso_y + iso_x) / cell
//! iso_y = (x + y) * cell / 4        y = (2 * iso_y - iso_x) / cell
//! ```
//!
//! Every division floors (`div_euclid`). With `cell` a multiple of 4 the
//! forward half is exact, which keeps chunk edges seamless and makes the
//! inverse exact for integer coordinates.

use nalgebra_glm as glm;

use crate::config::EngineConfig;

/// Diamond projection of `pos` for the given cell size, without any screen
/// offset.
pub fn project(pos: &glm::IVec2, cell: i32) -> glm::IVec2 {
    glm::vec2(
        ((pos.x - pos.y) * cell).div_euclid(2),
        ((pos.x + pos.y) * cell).div_euclid(4),
    )
}

/// Inverse of [`project`].
pub fn unproject(iso: &glm::IVec2, cell: i32) -> glm::IVec2 {
    glm::vec2(
        (2 * iso.y + iso.x).div_euclid(cell),
        (2 * iso.y - iso.x).div_euclid(cell),
    )
}

/// A projection plus the fixed offsets that place it on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoProjection {
    /// Pixel width of one cell's diamond.
    pub cell: i32,
    /// Where cell `(0, 0)`'s image top-left lands, camera excluded.
    pub origin: glm::IVec2,
    /// Offset from an image's top-left to its diamond's top vertex. Picking
    /// measures from this vertex so that a point maps to the diamond it is
    /// inside of.
    pub pick_anchor: glm::IVec2,
}

impl IsoProjection {
    /// Tile images on screen. Origin: `(screen_w/2 - tile/2, screen_h/4)`,
    /// i.e. grid `(0, 0)` sits horizontally centred in the top quarter.
    pub fn tiles(config: &EngineConfig) -> Self {
        let tile = config.tile_size;
        Self {
            cell: tile,
            origin: glm::vec2(
                config.screen_width / 2 - tile / 2,
                config.screen_height / 4,
            ),
            pick_anchor: glm::vec2(tile / 2, 0),
        }
    }

    /// Chunk canvases on screen. The canvas carries one tile of padding on
    /// the left and top, so its origin is the tile origin shifted back by
    /// [`Self::chunk_canvas`]'s origin.
    pub fn chunks(config: &EngineConfig) -> Self {
        let tile = config.tile_size;
        let chunk = config.chunk_tile_size();
        Self {
            cell: chunk,
            origin: glm::vec2(
                config.screen_width / 2 - chunk / 2 - tile,
                config.screen_height / 4 - tile,
            ),
            pick_anchor: glm::vec2(chunk / 2 + tile, tile),
        }
    }

    /// Tile images inside one chunk canvas, indexed by local grid position.
    pub fn chunk_canvas(config: &EngineConfig) -> Self {
        let tile = config.tile_size;
        let chunk = config.chunk_tile_size();
        Self {
            cell: tile,
            origin: glm::vec2(chunk / 2 + tile / 2, tile),
            pick_anchor: glm::vec2(tile / 2, 0),
        }
    }

    pub fn grid_to_iso(&self, pos: &glm::IVec2) -> glm::IVec2 {
        project(pos, self.cell) + self.origin
    }

    /// Exact inverse of [`Self::grid_to_iso`].
    pub fn iso_to_grid(&self, iso: &glm::IVec2) -> glm::IVec2 {
        unproject(&(iso - self.origin), self.cell)
    }

    /// The cell whose diamond contains `point` (iso space, camera removed).
    pub fn pick(&self, point: &glm::Vec2) -> glm::IVec2 {
        let local = point - to_vec2(&(self.origin + self.pick_anchor));
        let cell = self.cell as f32;
        glm::vec2(
            ((2.0 * local.y + local.x) / cell).floor() as i32,
            ((2.0 * local.y - local.x) / cell).floor() as i32,
        )
    }
}

pub fn to_vec2(v: &glm::IVec2) -> glm::Vec2 {
    glm::vec2(v.x as f32, v.y as f32)
}

/// Grid position to its owning chunk and the position inside that chunk.
pub fn grid_to_chunk(pos: &glm::IVec2, side: i32) -> (glm::IVec2, glm::IVec2) {
    (
        glm::vec2(pos.x.div_euclid(side), pos.y.div_euclid(side)),
        glm::vec2(pos.x.rem_euclid(side), pos.y.rem_euclid(side)),
    )
}
