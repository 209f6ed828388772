use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::SimRng;

/// Capacity of the ball collection. [`PowerUpConfig::max_balls`](crate::PowerUpConfig)
/// is clamped to this value.
pub const MAX_BALLS: usize = 8;

/// Below this magnitude a velocity is treated as degenerate and replaced by a vertical one.
const MIN_SPEED: f64 = 1e-9;

/// A ball entity.
///
/// A ball becomes inactive once it leaves the arena through the bottom edge; inactive
/// balls are never moved again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: DVec2,
    pub vel: DVec2,
    pub active: bool,
}

impl Ball {
    /// Creates an active ball at `pos` heading along `angle` (radians).
    ///
    /// The vertical component always points up (negative y), whatever the angle.
    #[must_use]
    pub fn launched(pos: DVec2, angle: f64, speed: f64) -> Self {
        let vel = DVec2::new(angle.cos() * speed, -(angle.sin() * speed).abs());
        let mut ball = Self {
            pos,
            vel,
            active: true,
        };
        ball.set_speed(speed);
        ball
    }

    /// Current speed magnitude.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.vel.length()
    }

    /// Rescales the velocity to `speed`, keeping its direction.
    pub fn set_speed(&mut self, speed: f64) {
        let mag = self.vel.length();
        if mag > MIN_SPEED {
            self.vel *= speed / mag;
        } else {
            self.vel = DVec2::new(0.0, -speed);
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }
}

/// Draws a launch angle in `[45°, 135°]`.
///
/// Combined with [`Ball::launched`] this always produces an upward diagonal launch.
pub fn random_launch_angle(rng: &mut SimRng) -> f64 {
    FRAC_PI_4 + rng.next_unit() * FRAC_PI_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_is_upward_with_exact_speed() {
        let mut rng = SimRng::new(7);
        for _ in 0..1000 {
            let angle = random_launch_angle(&mut rng);
            assert!((FRAC_PI_4..=FRAC_PI_4 + FRAC_PI_2).contains(&angle));
            let ball = Ball::launched(DVec2::new(10.0, 10.0), angle, 2.8);
            assert!(ball.vel.y < 0.0);
            assert!((ball.speed() - 2.8).abs() < 1e-9);
        }
    }

    #[test]
    fn test_degenerate_velocity_is_reset_upward() {
        let mut ball = Ball {
            pos: DVec2::ZERO,
            vel: DVec2::ZERO,
            active: true,
        };
        ball.set_speed(3.0);
        assert_eq!(ball.vel, DVec2::new(0.0, -3.0));
    }
}
