use glam::DVec2;
use serde::{Deserialize, Serialize};

/// A falling multi-ball capsule released by a destroyed brick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: DVec2,
}

impl PowerUp {
    #[must_use]
    pub fn new(pos: DVec2) -> Self {
        Self { pos }
    }

    pub fn fall(&mut self, speed: f64) {
        self.pos.y += speed;
    }
}
