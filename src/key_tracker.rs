use std::collections::HashSet;

use nalgebra_glm as glm;
use winit::keyboard::KeyCode;

pub struct KeyTracker {
    keys_pressed: HashSet<KeyCode>,
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTracker {
    pub fn new() -> Self {
        Self {
            keys_pressed: HashSet::new(),
        }
    }

    pub fn key_down(&mut self, key: KeyCode) {
        self.keys_pressed.insert(key);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.keys_pressed.remove(&key);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn reset(&mut self) {
        self.keys_pressed.clear();
    }

    /// Scroll direction from arrow keys or WASD, unit length on diagonals
    /// too. Screen axes: +x right, +y down.
    pub fn direction(&self) -> glm::Vec2 {
        let mut direction = glm::vec2(0.0, 0.0);
        if self.is_key_pressed(KeyCode::ArrowUp) || self.is_key_pressed(KeyCode::KeyW) {
            direction.y -= 1.0;
        }
        if self.is_key_pressed(KeyCode::ArrowDown) || self.is_key_pressed(KeyCode::KeyS) {
            direction.y += 1.0;
        }
        if self.is_key_pressed(KeyCode::ArrowLeft) || self.is_key_pressed(KeyCode::KeyA) {
            direction.x -= 1.0;
        }
        if self.is_key_pressed(KeyCode::ArrowRight) || self.is_key_pressed(KeyCode::KeyD) {
            direction.x += 1.0;
        }
        if direction == glm::vec2(0.0, 0.0) {
            direction
        } else {
            glm::normalize(&direction)
        }
    }
}
