//! Fitness evaluation: folding seeded episodes into one score.
//!
//! Each episode is scored with a weighted sum of its outcome:
//!
//! ```text
//! fitness = destroyed × 30 + reward × 5 + lives × 10 + progress × 50
//!           (+ 2000 when every brick was destroyed)
//! ```
//!
//! and the fitness of a policy is the mean over `episodes` games. Episode `e` is
//! seeded with `seed + 1000 × e` (wrapping), so a single evaluation seed fully
//! determines every game played.
//!
//! The default weights order objectives as full clear > partial progress >
//! survival > raw reward: the clear bonus dwarfs the rest, and each destroyed brick
//! is worth more than any number of kept lives. Other weightings can be supplied
//! through [`FitnessWeights`].

use brickevo_engine::GameConfig;
use serde::{Deserialize, Serialize};

use crate::{
    episode::{self, EpisodeOutcome},
    policy::Policy,
};

/// Seed offset between consecutive episodes of one evaluation.
pub const EPISODE_SEED_STRIDE: u32 = 1000;

/// Seed of episode `episode` of an evaluation seeded with `seed`.
#[must_use]
pub fn episode_seed(seed: u32, episode: usize) -> u32 {
    #[expect(clippy::cast_possible_truncation)]
    let episode = episode as u32;
    seed.wrapping_add(episode.wrapping_mul(EPISODE_SEED_STRIDE))
}

/// Coefficients of the per-episode fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub destroyed: f64,
    pub reward: f64,
    pub lives: f64,
    pub progress: f64,
    pub clear_bonus: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            destroyed: 30.0,
            reward: 5.0,
            lives: 10.0,
            progress: 50.0,
            clear_bonus: 2000.0,
        }
    }
}

impl FitnessWeights {
    /// Fitness of a single episode.
    #[must_use]
    pub fn score(&self, outcome: &EpisodeOutcome) -> f64 {
        #[expect(clippy::cast_precision_loss)]
        let destroyed = outcome.destroyed as f64;
        let mut fitness = destroyed * self.destroyed
            + outcome.reward * self.reward
            + f64::from(outcome.lives) * self.lives
            + outcome.progress() * self.progress;
        if outcome.cleared {
            fitness += self.clear_bonus;
        }
        fitness
    }
}

/// Result of evaluating one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Seed the evaluation was run with.
    pub seed: u32,
    /// Mean fitness over all episodes.
    pub fitness: f64,
    /// Outcome of each episode, in episode order.
    pub episodes: Vec<EpisodeOutcome>,
}

impl Evaluation {
    /// Outcome of the first episode, the one reported in generation summaries.
    #[must_use]
    pub fn first_episode(&self) -> Option<&EpisodeOutcome> {
        self.episodes.first()
    }
}

/// Evaluates policies on a fixed game configuration.
///
/// The evaluator is immutable and `Sync`, so one instance can be shared by all
/// threads evaluating a population.
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessEvaluator {
    config: GameConfig,
    episodes: usize,
    horizon: usize,
    weights: FitnessWeights,
}

impl FitnessEvaluator {
    /// Creates an evaluator with the default [`FitnessWeights`].
    #[must_use]
    pub fn new(config: GameConfig, episodes: usize, horizon: usize) -> Self {
        Self {
            config,
            episodes,
            horizon,
            weights: FitnessWeights::default(),
        }
    }

    #[must_use]
    pub fn with_weights(self, weights: FitnessWeights) -> Self {
        Self { weights, ..self }
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    #[must_use]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    #[must_use]
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Plays every episode of an evaluation seeded with `seed`.
    ///
    /// With zero episodes the fitness is 0.
    #[must_use]
    pub fn evaluate(&self, policy: &Policy, seed: u32) -> Evaluation {
        let episodes = (0..self.episodes)
            .map(|e| {
                episode::play_episode(policy, &self.config, episode_seed(seed, e), self.horizon)
            })
            .collect::<Vec<_>>();

        let fitness = if episodes.is_empty() {
            0.0
        } else {
            let total = episodes.iter().map(|o| self.weights.score(o)).sum::<f64>();
            #[expect(clippy::cast_precision_loss)]
            let count = episodes.len() as f64;
            total / count
        };
        log::trace!("evaluated seed={seed} fitness={fitness:.3}");

        Evaluation {
            seed,
            fitness,
            episodes,
        }
    }
}

/// Mean fitness of `policy` over `episodes` games with the default weights.
///
/// # Example
///
/// ```
/// use brickevo_engine::GameConfig;
/// use brickevo_evaluator::{fitness, policy::Policy};
///
/// let policy = Policy::new([0.1, 0.0, -0.3, 0.2, 0.0, 1.2, 0.0, 0.0], 0.05);
/// let a = fitness::evaluate(&policy, &GameConfig::default(), 42, 2, 500);
/// let b = fitness::evaluate(&policy, &GameConfig::default(), 42, 2, 500);
/// assert_eq!(a.to_bits(), b.to_bits());
/// ```
#[must_use]
pub fn evaluate(
    policy: &Policy,
    config: &GameConfig,
    seed: u32,
    episodes: usize,
    horizon: usize,
) -> f64 {
    FitnessEvaluator::new(config.clone(), episodes, horizon)
        .evaluate(policy, seed)
        .fitness
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(destroyed: usize, lives: u32, reward: f64) -> EpisodeOutcome {
        EpisodeOutcome {
            seed: 0,
            destroyed,
            total_bricks: 50,
            lives,
            reward,
            steps: 1000,
            cleared: destroyed == 50,
        }
    }

    #[test]
    fn test_episode_seed_wraps() {
        assert_eq!(episode_seed(1234, 0), 1234);
        assert_eq!(episode_seed(1234, 1), 2234);
        assert_eq!(episode_seed(u32::MAX, 1), 999);
    }

    #[test]
    fn test_default_score_formula() {
        let weights = FitnessWeights::default();
        let score = weights.score(&outcome(10, 2, 3.0));
        // 10*30 + 3*5 + 2*10 + 0.2*50
        assert!((score - 345.0).abs() < 1e-9);
        let cleared = weights.score(&outcome(50, 0, 0.0));
        assert!((cleared - (1500.0 + 50.0 + 2000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_objective_ordering() {
        let weights = FitnessWeights::default();
        // Realistic episode rewards: 10 per brick plus small per-step terms.
        let clear = weights.score(&outcome(50, 0, 500.0 - 13.0));
        let progress = weights.score(&outcome(30, 0, 300.0 - 13.0));
        let survival = weights.score(&outcome(29, 3, 290.0));
        assert!(clear > progress);
        assert!(progress > weights.score(&outcome(29, 0, 290.0 - 13.0)));
        assert!(survival > weights.score(&outcome(29, 0, 290.0 - 13.0)));
        assert!(clear > survival);
    }

    #[test]
    fn test_evaluation_is_reproducible() {
        let policy = Policy::new([0.4, -0.1, 0.7, 0.3, -0.5, 1.1, 0.2, -0.3], 0.08);
        let evaluator = FitnessEvaluator::new(GameConfig::default(), 2, 1500);
        let a = evaluator.evaluate(&policy, 777);
        let b = evaluator.evaluate(&policy, 777);
        assert_eq!(a, b);
        assert_eq!(a.seed, 777);
        assert_eq!(a.episodes[0].seed, 777);
        assert_eq!(a.episodes[1].seed, 1777);
    }

    #[test]
    fn test_fitness_is_mean_of_episode_scores() {
        let policy = Policy::new([0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.0);
        let evaluator = FitnessEvaluator::new(GameConfig::default(), 3, 800);
        let evaluation = evaluator.evaluate(&policy, 5);
        let mean = evaluation
            .episodes
            .iter()
            .map(|o| evaluator.weights().score(o))
            .sum::<f64>()
            / 3.0;
        assert_eq!(evaluation.fitness.to_bits(), mean.to_bits());
    }

    #[test]
    fn test_zero_episodes() {
        let policy = Policy::new([0.0; 8], 0.0);
        let evaluation = FitnessEvaluator::new(GameConfig::default(), 0, 100).evaluate(&policy, 1);
        assert_eq!(evaluation.fitness, 0.0);
        assert!(evaluation.first_episode().is_none());
    }

    #[test]
    fn test_custom_weights() {
        let weights = FitnessWeights {
            destroyed: 1.0,
            reward: 0.0,
            lives: 0.0,
            progress: 0.0,
            clear_bonus: 0.0,
        };
        let policy = Policy::new([0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], 0.0);
        let evaluation = FitnessEvaluator::new(GameConfig::default(), 1, 1000)
            .with_weights(weights)
            .evaluate(&policy, 9);
        #[expect(clippy::cast_precision_loss)]
        let destroyed = evaluation.episodes[0].destroyed as f64;
        assert_eq!(evaluation.fitness, destroyed);
    }
}
