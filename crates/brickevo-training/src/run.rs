//! The evolution run as a resumable task.
//!
//! [`EvolutionRun`] owns the whole state of a run: population, run RNG, generation
//! counter, global best and history. The host advances it with
//! [`EvolutionRun::resume`], which performs a bounded amount of work and returns a
//! [`Checkpoint`] describing why it stopped:
//!
//! - [`Checkpoint::Paused`] - the pause flag is set; nothing was done
//! - [`Checkpoint::Yielded`] - one batch of individuals was evaluated
//! - [`Checkpoint::Generation`] - a generation completed and was bred
//! - [`Checkpoint::Finished`] - all generations are done
//!
//! Between two calls the host may do anything else (print, render, poll input).
//! Dropping the run cancels it.
//!
//! # Seeds
//!
//! The run RNG, seeded with the run seed, drives initialization and the genetic
//! operators. Evaluations do not touch it: individual `i` of generation `g` is
//! evaluated with the seed `run_seed + 1000 × g + i` (wrapping), returned by
//! [`individual_seed`]. Any reported fitness can thus be reproduced from its seed
//! alone.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use brickevo_engine::{GameConfig, SimRng};
use brickevo_evaluator::{fitness::FitnessEvaluator, policy::Policy};
use brickevo_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use crate::{
    genetic::{Individual, Population, PopulationEvolver},
    params::{GaParams, ParamsError},
};

/// Seed offset between consecutive generations.
pub const GENERATION_SEED_STRIDE: u32 = 1000;

/// Interval at which a paused run should be polled again.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Evaluation seed of individual `index` in generation `generation`.
#[must_use]
pub fn individual_seed(run_seed: u32, generation: usize, index: usize) -> u32 {
    #[expect(clippy::cast_possible_truncation)]
    let (generation, index) = (generation as u32, index as u32);
    run_seed
        .wrapping_add(generation.wrapping_mul(GENERATION_SEED_STRIDE))
        .wrapping_add(index)
}

/// Shared pause flag of a run.
///
/// Clones share the same flag, so a handle may be moved to another thread (e.g. an
/// input reader) and toggled from there.
#[derive(Debug, Clone, Default)]
pub struct PauseHandle(Arc<AtomicBool>);

impl PauseHandle {
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.0.store(paused, Ordering::Relaxed);
    }

    /// Flips the flag and returns the new state.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }
}

/// Best individual seen so far in a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalBest {
    pub policy: Policy,
    pub fitness: f64,
    pub generation: usize,
    pub index: usize,
    /// Evaluation seed that reproduces `fitness`.
    pub seed: u32,
}

/// One history entry per generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub best: f64,
    pub average: f64,
    pub worst: f64,
    /// All-time best fitness after this generation.
    pub global_best: f64,
}

/// Summary of a completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub worst_fitness: f64,
    pub best_policy: Policy,
    pub best_index: usize,
    /// Evaluation seed of the generation's best individual.
    pub best_seed: u32,
    /// Bricks destroyed by the best individual in its first episode.
    pub destroyed: usize,
    pub total_bricks: usize,
    /// Whether this generation improved the global best.
    pub is_new_global_best: bool,
    pub global_best: GlobalBest,
    pub fitness_stats: DescriptiveStats,
    /// Per-gene statistics of the evaluated population (weights, then dead-zone).
    pub gene_stats: Vec<DescriptiveStats>,
    /// Wall time spent on this generation.
    pub elapsed: Duration,
}

impl GenerationReport {
    #[must_use]
    pub fn record(&self) -> GenerationRecord {
        GenerationRecord {
            generation: self.generation,
            best: self.best_fitness,
            average: self.average_fitness,
            worst: self.worst_fitness,
            global_best: self.global_best.fitness,
        }
    }
}

/// Final outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub global_best: GlobalBest,
    pub history: Vec<GenerationRecord>,
    pub config: GameConfig,
    pub params: GaParams,
    pub seed: u32,
}

/// Why [`EvolutionRun::resume`] returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Checkpoint {
    /// The run is paused; call again after `poll_interval`.
    Paused { poll_interval: Duration },
    /// A batch of individuals was evaluated.
    Yielded,
    /// A generation completed.
    Generation(Box<GenerationReport>),
    /// The run is over; see [`EvolutionRun::result`].
    Finished,
}

/// A genetic algorithm run that advances in small steps.
///
/// # Example
///
/// ```
/// use brickevo_engine::GameConfig;
/// use brickevo_training::{
///     params::GaParams,
///     run::{Checkpoint, EvolutionRun},
/// };
///
/// let params = GaParams {
///     population: 6,
///     generations: 2,
///     elite: 1,
///     episodes: 1,
///     horizon: 300,
///     ..GaParams::default()
/// };
/// let mut run = EvolutionRun::new(GameConfig::default(), params, 1234)?;
/// let mut generations = 0;
/// loop {
///     match run.resume() {
///         Checkpoint::Generation(report) => {
///             generations += 1;
///             assert!(report.best_fitness >= report.average_fitness);
///         }
///         Checkpoint::Finished => break,
///         Checkpoint::Paused { .. } | Checkpoint::Yielded => {}
///     }
/// }
/// assert_eq!(generations, 2);
/// assert_eq!(run.result().unwrap().history.len(), 2);
/// # Ok::<(), brickevo_training::params::ParamsError>(())
/// ```
#[derive(Debug)]
pub struct EvolutionRun {
    config: GameConfig,
    params: GaParams,
    seed: u32,
    rng: SimRng,
    evaluator: FitnessEvaluator,
    evolver: PopulationEvolver,
    pause: PauseHandle,
    population: Population,
    generation: usize,
    /// Number of individuals of the current generation already evaluated.
    evaluated: usize,
    generation_started: Option<Instant>,
    global_best: Option<GlobalBest>,
    history: Vec<GenerationRecord>,
    result: Option<RunResult>,
}

impl EvolutionRun {
    /// Validates `params` and creates the initial population.
    ///
    /// The horizon and episode count of `config` are replaced by those of `params`.
    ///
    /// # Errors
    ///
    /// Returns the first constraint `params` violates.
    pub fn new(mut config: GameConfig, params: GaParams, seed: u32) -> Result<Self, ParamsError> {
        params.validate()?;
        config.horizon = params.horizon;
        config.episodes = params.episodes;

        let mut rng = SimRng::new(seed);
        let population = Population::random(params.population, &mut rng, &params.ranges);
        let evaluator = FitnessEvaluator::new(config.clone(), params.episodes, params.horizon)
            .with_weights(params.fitness);
        let evolver = PopulationEvolver {
            elite_count: params.elite,
            tournament_size: params.tournament_size,
            crossover_rate: params.p_cross,
            mutation_rate: params.p_mut,
            ranges: params.ranges,
        };
        log::info!(
            "starting evolution: seed={seed} population={} generations={}",
            params.population,
            params.generations
        );

        Ok(Self {
            config,
            seed,
            rng,
            evaluator,
            evolver,
            pause: PauseHandle::default(),
            population,
            generation: 0,
            evaluated: 0,
            generation_started: None,
            global_best: None,
            history: Vec::with_capacity(params.generations),
            result: None,
            params,
        })
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> &GaParams {
        &self.params
    }

    #[must_use]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Handle controlling the pause flag of this run.
    #[must_use]
    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    /// Generation currently being evaluated (or the generation count once finished).
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn global_best(&self) -> Option<&GlobalBest> {
        self.global_best.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[GenerationRecord] {
        &self.history
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// The final result, once [`Checkpoint::Finished`] has been reached.
    #[must_use]
    pub fn result(&self) -> Option<&RunResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn into_result(self) -> Option<RunResult> {
        self.result
    }

    /// Advances the run to its next checkpoint.
    ///
    /// The pause flag is only checked before a generation starts, and checking it
    /// never draws from the run RNG, so pausing does not change the outcome.
    pub fn resume(&mut self) -> Checkpoint {
        if self.result.is_some() {
            return Checkpoint::Finished;
        }

        if self.generation_started.is_none() {
            if self.pause.is_paused() {
                return Checkpoint::Paused {
                    poll_interval: PAUSE_POLL_INTERVAL,
                };
            }
            self.generation_started = Some(Instant::now());
        }

        let size = self.population.len();
        if self.evaluated < size {
            let end = (self.evaluated + self.params.batch_size).min(size);
            let (seed, generation) = (self.seed, self.generation);
            self.population.evaluate_range(
                self.evaluated..end,
                &self.evaluator,
                self.params.parallel,
                |i| individual_seed(seed, generation, i),
            );
            self.evaluated = end;
            if end < size {
                return Checkpoint::Yielded;
            }
        }

        Checkpoint::Generation(Box::new(self.complete_generation()))
    }

    fn complete_generation(&mut self) -> GenerationReport {
        let elapsed = self
            .generation_started
            .take()
            .map_or(Duration::ZERO, |t| t.elapsed());
        let generation = self.generation;
        let population = &self.population;

        let best_index = population
            .best_index()
            .expect("population is never empty");
        let best = &population.individuals()[best_index];
        let best_evaluation = best
            .evaluation()
            .expect("every individual is evaluated before the generation completes");
        let fitness_stats = population
            .fitness_stats()
            .expect("population is never empty");
        #[expect(clippy::cast_precision_loss)]
        let average_fitness = population
            .individuals()
            .iter()
            .map(Individual::fitness)
            .sum::<f64>()
            / population.len() as f64;

        let is_new_global_best = self
            .global_best
            .is_none_or(|g| best_evaluation.fitness > g.fitness);
        if is_new_global_best {
            self.global_best = Some(GlobalBest {
                policy: *best.policy(),
                fitness: best_evaluation.fitness,
                generation,
                index: best_index,
                seed: best_evaluation.seed,
            });
        }
        let global_best = self.global_best.expect("global best is set above");

        let (destroyed, total_bricks) = best_evaluation
            .first_episode()
            .map_or((0, self.config.brick_count()), |o| {
                (o.destroyed, o.total_bricks)
            });

        let report = GenerationReport {
            generation,
            best_fitness: best_evaluation.fitness,
            average_fitness,
            worst_fitness: fitness_stats.min,
            best_policy: *best.policy(),
            best_index,
            best_seed: best_evaluation.seed,
            destroyed,
            total_bricks,
            is_new_global_best,
            global_best,
            fitness_stats,
            gene_stats: population.gene_stats(),
            elapsed,
        };
        self.history.push(report.record());
        log::debug!(
            "generation {generation}: best={:.3} avg={:.3} worst={:.3} bricks={destroyed}/{total_bricks}",
            report.best_fitness,
            report.average_fitness,
            report.worst_fitness,
        );

        self.generation += 1;
        self.evaluated = 0;
        if self.generation < self.params.generations {
            self.population = self.evolver.evolve(&self.population, &mut self.rng);
        } else {
            log::info!(
                "evolution finished: best fitness {:.3} (generation {}, seed {})",
                global_best.fitness,
                global_best.generation,
                global_best.seed
            );
            self.result = Some(RunResult {
                global_best,
                history: self.history.clone(),
                config: self.config.clone(),
                params: self.params.clone(),
                seed: self.seed,
            });
        }
        report
    }
}
