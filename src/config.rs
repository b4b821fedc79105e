use std::path::Path;

use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Geometry and streaming parameters. Built once and passed by reference to
/// every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width of one tile image in pixels. Must be a multiple of 4.
    pub tile_size: i32,
    /// Tiles along one edge of a chunk.
    pub chunk_side_length: i32,
    /// Chunks kept resident left/right of the centre chunk.
    pub view_radius_x: i32,
    /// Chunks kept resident above/below the centre chunk.
    pub view_radius_y: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    /// Vertical lift applied to raised or hovered tiles when compositing.
    pub tile_raise_pixels: i32,
    /// Vertical lift applied to a hovered chunk at draw time.
    pub chunk_hover_raise_pixels: i32,
    /// Camera speed in pixels per second at unit direction.
    pub scroll_speed: f32,
    /// Number of pre-allocated chunks. `None` sizes the pool to the window.
    pub pool_size: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            chunk_side_length: 12,
            view_radius_x: 5,
            view_radius_y: 5,
            screen_width: 800,
            screen_height: 800,
            tile_raise_pixels: 20,
            chunk_hover_raise_pixels: 200,
            scroll_speed: 8000.0,
            pool_size: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size <= 0 || self.tile_size % 4 != 0 {
            return Err(EngineError::InvalidConfig(format!(
                "tile_size must be a positive multiple of 4, got {}",
                self.tile_size
            )));
        }
        if self.chunk_side_length <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "chunk_side_length must be positive, got {}",
                self.chunk_side_length
            )));
        }
        if self.view_radius_x < 0 || self.view_radius_y < 0 {
            return Err(EngineError::InvalidConfig(
                "view radii must not be negative".to_owned(),
            ));
        }
        if self.screen_width <= 0 || self.screen_height <= 0 {
            return Err(EngineError::InvalidConfig(format!(
                "screen size must be positive, got {}x{}",
                self.screen_width, self.screen_height
            )));
        }
        // chunk canvases keep one tile of headroom above the top row
        if self.tile_raise_pixels < 0 || self.tile_raise_pixels > self.tile_size {
            return Err(EngineError::InvalidConfig(format!(
                "tile_raise_pixels must be within 0..={}, got {}",
                self.tile_size, self.tile_raise_pixels
            )));
        }
        if let Some(pool) = self.pool_size {
            let window = self.window_len();
            if pool < window {
                return Err(EngineError::PoolUndersized { pool, window });
            }
        }
        Ok(())
    }

    /// Pixel width of a whole chunk's diamond.
    pub fn chunk_tile_size(&self) -> i32 {
        self.chunk_side_length * self.tile_size
    }

    /// Number of chunk offsets in the visibility window.
    pub fn window_len(&self) -> usize {
        ((2 * self.view_radius_x + 1) * (2 * self.view_radius_y + 1)) as usize
    }

    pub fn effective_pool_size(&self) -> usize {
        self.pool_size.unwrap_or_else(|| self.window_len())
    }

    pub fn screen_center(&self) -> glm::Vec2 {
        glm::vec2(
            (self.screen_width / 2) as f32,
            (self.screen_height / 2) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.chunk_tile_size(), 384);
        assert_eq!(config.window_len(), 121);
        assert_eq!(config.effective_pool_size(), 121);
    }

    #[test]
    fn rejects_tile_size_not_multiple_of_four() {
        let config = EngineConfig {
            tile_size: 30,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_raise_taller_than_tile() {
        let config = EngineConfig {
            tile_size: 8,
            tile_raise_pixels: 12,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(msg)) if msg.contains("tile_raise_pixels")
        ));
        EngineConfig {
            tile_raise_pixels: 8,
            ..config
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn rejects_undersized_pool() {
        let config = EngineConfig {
            view_radius_x: 1,
            view_radius_y: 1,
            pool_size: Some(8),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::PoolUndersized { pool: 8, window: 9 })
        ));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "chunk_side_length": 5, "view_radius_x": 2 }"#).unwrap();
        assert_eq!(config.chunk_side_length, 5);
        assert_eq!(config.view_radius_x, 2);
        assert_eq!(config.tile_size, 32);
        assert_eq!(config.pool_size, None);
    }
}
