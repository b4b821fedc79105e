use indexmap::IndexSet;
use nalgebra_glm as glm;

use crate::config::EngineConfig;
use crate::coords::IsoProjection;

/// Relative chunk offsets kept resident around the centre chunk, row by row
/// from the top-left. Built once from the configured radii.
#[derive(Debug, Clone)]
pub struct VisibilityWindow {
    offsets: Vec<glm::IVec2>,
}

impl VisibilityWindow {
    pub fn new(radius_x: i32, radius_y: i32) -> Self {
        let offsets = (-radius_y..=radius_y)
            .flat_map(|row| (-radius_x..=radius_x).map(move |col| glm::vec2(col, row)))
            .collect();
        Self { offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn offsets(&self) -> &[glm::IVec2] {
        &self.offsets
    }
}

/// Half-open chunk-coordinate rectangle `[0, extent)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBounds {
    pub extent: glm::IVec2,
}

impl ChunkBounds {
    pub fn contains(&self, pos: &glm::IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.extent.x && pos.y < self.extent.y
    }
}

pub struct VisibilitySet {
    window: VisibilityWindow,
    projection: IsoProjection,
    screen_center: glm::Vec2,
}

impl VisibilitySet {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            window: VisibilityWindow::new(config.view_radius_x, config.view_radius_y),
            projection: IsoProjection::chunks(config),
            screen_center: config.screen_center(),
        }
    }

    pub fn window(&self) -> &VisibilityWindow {
        &self.window
    }

    /// Chunk under the middle of the viewport.
    pub fn center_chunk(&self, camera_offset: &glm::Vec2) -> glm::IVec2 {
        self.projection.pick(&(self.screen_center - camera_offset))
    }

    /// Every chunk position the window covers around `center`, including
    /// positions outside the map.
    pub fn visible_chunks(&self, center: &glm::IVec2) -> IndexSet<glm::IVec2> {
        self.window
            .offsets()
            .iter()
            .map(|offset| center + offset)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_covers_radii() {
        let window = VisibilityWindow::new(2, 1);
        assert_eq!(window.len(), 15);
        assert_eq!(window.offsets()[0], glm::vec2(-2, -1));
        assert_eq!(window.offsets()[14], glm::vec2(2, 1));
        assert!(window.offsets().contains(&glm::vec2(0, 0)));
    }

    #[test]
    fn visible_set_is_window_around_center() {
        let config = EngineConfig {
            view_radius_x: 1,
            view_radius_y: 1,
            ..Default::default()
        };
        let set = VisibilitySet::new(&config);
        let visible = set.visible_chunks(&glm::vec2(4, 7));
        assert_eq!(visible.len(), 9);
        assert!(visible.contains(&glm::vec2(3, 6)));
        assert!(visible.contains(&glm::vec2(5, 8)));
        assert!(!visible.contains(&glm::vec2(6, 7)));
    }

    #[test]
    fn center_follows_camera_by_whole_chunks() {
        let config = EngineConfig::default();
        let set = VisibilitySet::new(&config);
        let origin = set.center_chunk(&glm::vec2(0.0, 0.0));

        // one chunk step along +x in iso space is (chunk/2, chunk/4); the
        // camera moves the opposite way
        let chunk = config.chunk_tile_size() as f32;
        let step = glm::vec2(chunk / 2.0, chunk / 4.0);
        assert_eq!(set.center_chunk(&-step), origin + glm::vec2(1, 0));

        let step_y = glm::vec2(-chunk / 2.0, chunk / 4.0);
        assert_eq!(set.center_chunk(&-step_y), origin + glm::vec2(0, 1));
    }

    #[test]
    fn bounds_are_half_open() {
        let bounds = ChunkBounds {
            extent: glm::vec2(2, 3),
        };
        assert!(bounds.contains(&glm::vec2(0, 0)));
        assert!(bounds.contains(&glm::vec2(1, 2)));
        assert!(!bounds.contains(&glm::vec2(2, 0)));
        assert!(!bounds.contains(&glm::vec2(0, -1)));
    }
}
