use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

/// Number of features in an [`Observation`].
pub const FEATURE_COUNT: usize = 8;

/// Paddle command for a single step.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::IsVariant,
)]
pub enum Action {
    Left,
    #[default]
    Stay,
    Right,
}

impl Action {
    /// Direction multiplier applied to the paddle speed: `-1`, `0` or `+1`.
    #[must_use]
    pub const fn direction(self) -> i8 {
        match self {
            Action::Left => -1,
            Action::Stay => 0,
            Action::Right => 1,
        }
    }

    /// Maps the sign of a control signal to an action.
    #[must_use]
    pub fn from_sign(signal: f64) -> Self {
        if signal > 0.0 {
            Action::Right
        } else if signal < 0.0 {
            Action::Left
        } else {
            Action::Stay
        }
    }
}

/// Identifies one slot of the observation vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ObservationFeature {
    #[display("ball_x")]
    BallX,
    #[display("ball_y")]
    BallY,
    #[display("ball_vx")]
    BallVx,
    #[display("ball_vy")]
    BallVy,
    #[display("paddle_x")]
    PaddleX,
    #[display("paddle_dx")]
    PaddleDx,
    #[display("paddle_dy")]
    PaddleDy,
    #[display("bricks_left")]
    BricksLeft,
}

impl ObservationFeature {
    /// All features in vector order.
    pub const ALL: [ObservationFeature; FEATURE_COUNT] = [
        ObservationFeature::BallX,
        ObservationFeature::BallY,
        ObservationFeature::BallVx,
        ObservationFeature::BallVy,
        ObservationFeature::PaddleX,
        ObservationFeature::PaddleDx,
        ObservationFeature::PaddleDy,
        ObservationFeature::BricksLeft,
    ];

    /// Closed range every value of this feature lies in.
    #[must_use]
    pub const fn range(self) -> RangeInclusive<f64> {
        match self {
            ObservationFeature::BricksLeft => 0.0..=1.0,
            _ => -1.0..=1.0,
        }
    }
}

/// Normalized view of the game state fed to a policy.
///
/// | index | feature       | meaning                                               | range   |
/// |-------|---------------|-------------------------------------------------------|---------|
/// | 0     | `ball_x`      | ball x over arena width                               | [-1, 1] |
/// | 1     | `ball_y`      | ball y over arena height                              | [-1, 1] |
/// | 2     | `ball_vx`     | x velocity over 1.2 × ball speed                      | [-1, 1] |
/// | 3     | `ball_vy`     | y velocity over 1.2 × ball speed                      | [-1, 1] |
/// | 4     | `paddle_x`    | paddle left edge over its travel                      | [-1, 1] |
/// | 5     | `paddle_dx`   | ball x minus paddle center, over half the arena width | [-1, 1] |
/// | 6     | `paddle_dy`   | ball y minus paddle y, over arena height              | [-1, 1] |
/// | 7     | `bricks_left` | live bricks over total bricks                         | [0, 1]  |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation(pub [f64; FEATURE_COUNT]);

impl Observation {
    #[must_use]
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, feature: ObservationFeature) -> f64 {
        self.0[feature as usize]
    }

    /// Returns whether every feature lies in its documented range.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        ObservationFeature::ALL
            .iter()
            .zip(self.0)
            .all(|(f, v)| f.range().contains(&v))
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:+.3}")?;
        }
        write!(f, "]")
    }
}
