//! Scoring of control policies on the brick-breaking simulation.
//!
//! The crate is organized in three levels:
//!
//! 1. **Policy** ([`policy`]) - Maps one observation to one paddle action with a
//!    weighted sum and a dead-zone threshold.
//!
//! 2. **Episode Playback** ([`episode`]) - Runs a policy against a game until the game
//!    is terminal, collecting an [`EpisodeOutcome`](episode::EpisodeOutcome) and
//!    optionally every step for replays.
//!
//! 3. **Fitness Evaluation** ([`fitness`]) - Plays several seeded episodes and folds
//!    their outcomes into a single fitness score for the genetic algorithm.
//!
//! # Architecture
//!
//! ```text
//! Fitness Evaluation (mean score over episodes)
//!     ↓ uses
//! Episode Playback (one game to completion)
//!     ↓ uses
//! Policy (one action per observation)
//! ```
//!
//! Everything here is a pure function of its inputs: the same policy, config and seed
//! always produce the same fitness, bit for bit. Evaluations of different policies
//! share no state and may run on separate threads.
//!
//! # Example
//!
//! ```
//! use brickevo_engine::GameConfig;
//! use brickevo_evaluator::{fitness::FitnessEvaluator, policy::Policy};
//!
//! let policy = Policy::new([0.0, 0.0, 0.0, 0.0, 0.0, 1.5, 0.0, 0.0], 0.02);
//! let evaluator = FitnessEvaluator::new(GameConfig::default(), 2, 1000);
//!
//! let first = evaluator.evaluate(&policy, 1234);
//! let second = evaluator.evaluate(&policy, 1234);
//! assert_eq!(first.fitness.to_bits(), second.fitness.to_bits());
//! assert_eq!(first.episodes.len(), 2);
//! ```

pub mod episode;
pub mod fitness;
pub mod policy;
