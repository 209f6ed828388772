//! Genetic algorithm evolving brick-breaker policies.
//!
//! # How Training Works
//!
//! 1. **Population** - Create individuals with random weights and dead-zones
//! 2. **Evaluation** - Each individual plays seeded episodes with its policy
//! 3. **Fitness** - Episode outcomes are folded into one score
//! 4. **Selection** - Elites are kept, parents are picked by tournament
//! 5. **Reproduction** - One-point crossover and Gaussian mutation build the children
//! 6. **Repeat** - For a fixed number of generations
//!
//! # Architecture
//!
//! ```text
//! EvolutionRun (resumable task, run)
//!     ↓ breeds with
//! PopulationEvolver (genetic)
//!     ↓ uses
//! Genetic operators (genotype)
//!     ↓ on
//! Policy (brickevo-evaluator)
//! ```
//!
//! A host either calls [`run::EvolutionRun::resume`] itself, interleaving the run
//! with its own work, or hands the run to [`observer::drive`] and receives
//! [`observer::RunObserver`] callbacks.
//!
//! # Modules
//!
//! - [`params`] - [`GaParams`](params::GaParams), gene ranges and validation
//! - [`genotype`] - Initialization, crossover, mutation
//! - [`genetic`] - Individuals, populations and tournament selection
//! - [`run`] - The resumable evolution task and its reports
//! - [`observer`] - Host callbacks and the blocking driver
//!
//! # Determinism
//!
//! One run seed fixes everything: the run RNG, seeded with it, draws the initial
//! population and every operator decision, and each evaluation derives its own seed
//! from the run seed, the generation and the individual's index. Pausing, batching
//! and parallel evaluation do not change the outcome.

pub mod genetic;
pub mod genotype;
pub mod observer;
pub mod params;
pub mod run;
