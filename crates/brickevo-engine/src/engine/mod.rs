//! Game rules and state management.
//!
//! This module builds the brick-breaking game on top of the entities in
//! [`crate::core`]:
//!
//! - [`GameConfig`] - Arena geometry, entity sizes, rewards and power-up settings
//! - [`BreakoutGame`] - The stepped simulation itself
//! - [`Observation`] - Normalized 8-feature view of the state fed to a policy
//! - [`Action`] - Paddle command for one step
//!
//! # Game Flow
//!
//! 1. Create a [`BreakoutGame`] from a config and a 32-bit seed
//! 2. Read an [`Observation`] with [`BreakoutGame::observe`]
//! 3. Choose an [`Action`] and pass it to [`BreakoutGame::step`]
//! 4. Repeat until the step reports `done`
//!
//! An episode ends when the last brick is destroyed, when the last life is lost,
//! or when the step counter reaches [`GameConfig::horizon`].
//!
//! # Example
//!
//! ```
//! use brickevo_engine::{Action, BreakoutGame, GameConfig};
//!
//! let config = GameConfig::default().with_horizon(200);
//! let mut game = BreakoutGame::new(config, 42);
//!
//! while !game.is_done() {
//!     let obs = game.observe();
//!     // Follow the ball: positive `paddle_dx` means the ball is right of the paddle.
//!     let action = Action::from_sign(obs.values()[5]);
//!     game.step(action);
//! }
//! assert_eq!(game.steps(), 200);
//! ```

pub use self::{config::*, game::*, observation::*};

mod config;
mod game;
mod observation;
