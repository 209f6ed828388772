//! Playing one episode of a policy to completion.

use brickevo_engine::{Action, BreakoutGame, GameConfig, Observation};
use serde::{Deserialize, Serialize};

use crate::policy::Policy;

/// Summary of a finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeOutcome {
    /// Seed the game was created with.
    pub seed: u32,
    pub destroyed: usize,
    pub total_bricks: usize,
    pub lives: u32,
    /// Sum of the per-step rewards.
    pub reward: f64,
    pub steps: usize,
    pub cleared: bool,
}

impl EpisodeOutcome {
    /// Fraction of bricks destroyed, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_bricks == 0 {
            return 0.0;
        }
        #[expect(clippy::cast_precision_loss)]
        let progress = self.destroyed as f64 / self.total_bricks as f64;
        progress
    }
}

/// One step of an episode, as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step index, starting at 0.
    pub t: usize,
    /// Observation the action was chosen from.
    pub obs: Observation,
    pub action: Action,
    pub reward: f64,
}

/// Plays `policy` on a fresh game until it is terminal.
///
/// The game runs with `config`, its horizon replaced by `horizon`.
#[must_use]
pub fn play_episode(
    policy: &Policy,
    config: &GameConfig,
    seed: u32,
    horizon: usize,
) -> EpisodeOutcome {
    play_episode_with(policy, config, seed, horizon, |_| {})
}

/// Same as [`play_episode`], calling `record` after every step.
///
/// # Example
///
/// ```
/// use brickevo_engine::GameConfig;
/// use brickevo_evaluator::{episode, policy::Policy};
///
/// let policy = Policy::new([0.0; 8], 0.0);
/// let mut steps = vec![];
/// let outcome = episode::play_episode_with(&policy, &GameConfig::default(), 7, 50, |s| {
///     steps.push(*s);
/// });
/// assert_eq!(steps.len(), outcome.steps);
/// assert_eq!(steps[0].t, 0);
/// ```
pub fn play_episode_with<F>(
    policy: &Policy,
    config: &GameConfig,
    seed: u32,
    horizon: usize,
    mut record: F,
) -> EpisodeOutcome
where
    F: FnMut(&StepRecord),
{
    let mut game = BreakoutGame::new(config.with_horizon(horizon), seed);
    let mut reward = 0.0;
    while !game.is_done() {
        let obs = game.observe();
        let action = policy.act(&obs);
        let outcome = game.step(action);
        reward += outcome.reward;
        record(&StepRecord {
            t: game.steps() - 1,
            obs,
            action,
            reward: outcome.reward,
        });
    }

    let bricks = game.bricks();
    EpisodeOutcome {
        seed,
        destroyed: bricks.destroyed_count(),
        total_bricks: bricks.len(),
        lives: game.lives(),
        reward,
        steps: game.steps(),
        cleared: bricks.is_cleared(),
    }
}
