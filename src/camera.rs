use nalgebra_glm as glm;

use crate::config::EngineConfig;
use crate::coords::{to_vec2, IsoProjection};

/// Scroll offset added to every iso position when drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    offset: glm::Vec2,
    speed: f32,
}

impl Camera {
    pub fn new(speed: f32) -> Self {
        Self {
            offset: glm::vec2(0.0, 0.0),
            speed,
        }
    }

    /// Camera that puts the middle of tile `grid_pos` at the screen centre.
    pub fn centered_on(config: &EngineConfig, grid_pos: &glm::IVec2) -> Self {
        let tiles = IsoProjection::tiles(config);
        let top = tiles.grid_to_iso(grid_pos) + tiles.pick_anchor;
        let middle = to_vec2(&top) + glm::vec2(0.0, (config.tile_size / 4) as f32);
        Self {
            offset: config.screen_center() - middle,
            speed: config.scroll_speed,
        }
    }

    pub fn offset(&self) -> glm::Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: glm::Vec2) {
        self.offset = offset;
    }

    /// Moves the view along `direction` (already normalised) for `dt`
    /// seconds. The offset moves opposite to the view.
    pub fn scroll(&mut self, direction: &glm::Vec2, dt: f32) {
        self.offset -= direction * self.speed * dt;
    }

    /// Screen point back to iso space.
    pub fn screen_to_iso(&self, screen: &glm::Vec2) -> glm::Vec2 {
        screen - self.offset
    }
}
