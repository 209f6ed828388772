use serde::{Deserialize, Serialize};

/// Immutable constants describing the arena, its entities and the reward scheme.
///
/// Distances are in arena pixels and speeds in pixels per step. All fields have
/// defaults, so a JSON file only needs to list the values it overrides.
///
/// # Example
///
/// ```
/// use brickevo_engine::GameConfig;
///
/// let config: GameConfig = serde_json::from_str(r#"{ "rows": 2, "lives": 1 }"#).unwrap();
/// assert_eq!(config.brick_count(), 20);
/// assert_eq!(config.width, GameConfig::default().width);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: f64,
    pub height: f64,

    pub paddle_width: f64,
    pub paddle_height: f64,
    /// Fixed vertical position of the paddle's top edge.
    pub paddle_y: f64,
    pub paddle_speed: f64,
    /// How strongly the hit offset from the paddle center bends the ball.
    pub paddle_deflection: f64,

    pub ball_radius: f64,
    /// Speed magnitude every ball keeps for its whole life.
    pub ball_speed: f64,

    pub rows: usize,
    pub cols: usize,
    pub brick_width: f64,
    pub brick_height: f64,
    pub brick_padding: f64,
    pub offset_x: f64,
    pub offset_y: f64,

    pub lives: u32,
    /// Maximum number of steps in an episode.
    pub horizon: usize,
    /// Episodes played per fitness evaluation.
    pub episodes: usize,

    pub rewards: Rewards,
    pub power_ups: PowerUpConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 320.0,
            paddle_width: 70.0,
            paddle_height: 10.0,
            paddle_y: 300.0,
            paddle_speed: 4.0,
            paddle_deflection: 0.9,
            ball_radius: 4.0,
            ball_speed: 2.8,
            rows: 5,
            cols: 10,
            brick_width: 42.0,
            brick_height: 12.0,
            brick_padding: 2.0,
            offset_x: 9.0,
            offset_y: 40.0,
            lives: 3,
            horizon: 5000,
            episodes: 2,
            rewards: Rewards::default(),
            power_ups: PowerUpConfig::default(),
        }
    }
}

impl GameConfig {
    /// Total number of bricks in the grid.
    #[must_use]
    pub fn brick_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns a copy with a different episode horizon.
    #[must_use]
    pub fn with_horizon(&self, horizon: usize) -> Self {
        Self {
            horizon,
            ..self.clone()
        }
    }

    /// Left edge of the paddle when it is centered in the arena.
    #[must_use]
    pub fn centered_paddle_x(&self) -> f64 {
        self.width / 2.0 - self.paddle_width / 2.0
    }
}

/// Per-event rewards returned by [`BreakoutGame::step`](crate::BreakoutGame::step).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    /// Granted on every non-terminal step.
    pub tick: f64,
    pub paddle_hit: f64,
    pub brick: f64,
    /// Granted once when the last brick is destroyed.
    pub clear: f64,
    /// Applied (as a negative value) when the last active ball leaves the arena.
    pub life_lost: f64,
    /// Applied on top of `life_lost` when no lives remain.
    pub game_over: f64,
    /// Multiplied by the destroyed-brick fraction when the horizon cuts an episode.
    pub horizon_progress: f64,
}

impl Default for Rewards {
    fn default() -> Self {
        Self {
            tick: 0.01,
            paddle_hit: 0.2,
            brick: 10.0,
            clear: 50.0,
            life_lost: -3.0,
            game_over: -10.0,
            horizon_progress: 20.0,
        }
    }
}

/// Multi-ball capsule settings. Disabled unless `max_drops > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    /// Capsules dropped at most per episode.
    pub max_drops: u32,
    /// Chance that a destroyed brick drops a capsule while the budget lasts.
    pub drop_chance: f64,
    pub fall_speed: f64,
    pub radius: f64,
    /// Upper bound on simultaneously active balls.
    pub max_balls: usize,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            max_drops: 0,
            drop_chance: 0.15,
            fall_speed: 1.5,
            radius: 5.0,
            max_balls: 3,
        }
    }
}

impl PowerUpConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_drops > 0
    }
}
