//! Genetic algorithm parameters and their validation.

use std::ops::RangeInclusive;

use brickevo_evaluator::fitness::FitnessWeights;
use serde::{Deserialize, Serialize};

/// Parameters of an evolution run.
///
/// Every field has a default, so a partial JSON object is enough to override a few
/// values.
///
/// # Example
///
/// ```
/// use brickevo_training::params::GaParams;
///
/// let params: GaParams = serde_json::from_str(r#"{ "population": 10 }"#).unwrap();
/// assert_eq!(params.population, 10);
/// assert_eq!(params.generations, 60);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaParams {
    /// Individuals per generation.
    pub population: usize,
    pub generations: usize,
    /// Draws per tournament selection.
    pub tournament_size: usize,
    /// Probability that a pair of parents is recombined.
    pub p_cross: f64,
    /// Per-gene mutation probability.
    pub p_mut: f64,
    /// Fittest individuals copied unchanged to the next generation.
    pub elite: usize,
    /// Episodes per fitness evaluation.
    pub episodes: usize,
    /// Step limit of each episode.
    pub horizon: usize,
    /// Individuals evaluated between two yields to the host.
    pub batch_size: usize,
    /// Evaluate each batch on scoped threads.
    pub parallel: bool,
    pub ranges: GeneRanges,
    pub fitness: FitnessWeights,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population: 30,
            generations: 60,
            tournament_size: 3,
            p_cross: 0.7,
            p_mut: 0.1,
            elite: 2,
            episodes: 2,
            horizon: 5000,
            batch_size: 5,
            parallel: false,
            ranges: GeneRanges::default(),
            fitness: FitnessWeights::default(),
        }
    }
}

impl GaParams {
    /// Checks that the parameters describe a runnable evolution.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.population == 0 {
            return Err(ParamsError::EmptyPopulation);
        }
        if self.generations == 0 {
            return Err(ParamsError::NoGenerations);
        }
        if self.tournament_size == 0 {
            return Err(ParamsError::EmptyTournament);
        }
        if self.elite >= self.population {
            return Err(ParamsError::TooManyElites {
                elite: self.elite,
                population: self.population,
            });
        }
        for (name, value) in [("p_cross", self.p_cross), ("p_mut", self.p_mut)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamsError::InvalidProbability { name, value });
            }
        }
        if self.episodes == 0 {
            return Err(ParamsError::NoEpisodes);
        }
        if self.horizon == 0 {
            return Err(ParamsError::ZeroHorizon);
        }
        if self.batch_size == 0 {
            return Err(ParamsError::ZeroBatchSize);
        }
        self.ranges.validate()
    }
}

/// Bounds and mutation strengths of the genes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneRanges {
    pub weight_min: f64,
    pub weight_max: f64,
    pub dead_zone_min: f64,
    pub dead_zone_max: f64,
    /// Standard deviation of the Gaussian noise added to a mutated weight.
    pub weight_sigma: f64,
    /// Standard deviation of the Gaussian noise added to a mutated dead-zone.
    pub dead_zone_sigma: f64,
}

impl Default for GeneRanges {
    fn default() -> Self {
        Self {
            weight_min: -2.0,
            weight_max: 2.0,
            dead_zone_min: 0.0,
            dead_zone_max: 0.3,
            weight_sigma: 0.2,
            dead_zone_sigma: 0.05,
        }
    }
}

impl GeneRanges {
    #[must_use]
    pub fn weight(&self) -> RangeInclusive<f64> {
        self.weight_min..=self.weight_max
    }

    #[must_use]
    pub fn dead_zone(&self) -> RangeInclusive<f64> {
        self.dead_zone_min..=self.dead_zone_max
    }

    /// # Errors
    ///
    /// Fails on an inverted (or NaN) range or a negative sigma.
    pub fn validate(&self) -> Result<(), ParamsError> {
        for (name, lo, hi) in [
            ("weight", self.weight_min, self.weight_max),
            ("dead_zone", self.dead_zone_min, self.dead_zone_max),
        ] {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ParamsError::InvertedRange { name, lo, hi });
            }
        }
        for (name, value) in [
            ("weight_sigma", self.weight_sigma),
            ("dead_zone_sigma", self.dead_zone_sigma),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ParamsError::NegativeSigma { name, value });
            }
        }
        Ok(())
    }
}

/// A constraint violated by [`GaParams`].
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ParamsError {
    #[display("population must not be empty")]
    EmptyPopulation,
    #[display("at least one generation is required")]
    NoGenerations,
    #[display("tournament size must be at least 1")]
    EmptyTournament,
    #[display("elite count {elite} must be smaller than the population ({population})")]
    TooManyElites { elite: usize, population: usize },
    #[display("{name} must be within [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[display("at least one episode per evaluation is required")]
    NoEpisodes,
    #[display("episode horizon must be at least 1 step")]
    ZeroHorizon,
    #[display("batch size must be at least 1")]
    ZeroBatchSize,
    #[display("{name} range is inverted: [{lo}, {hi}]")]
    InvertedRange { name: &'static str, lo: f64, hi: f64 },
    #[display("{name} must not be negative, got {value}")]
    NegativeSigma { name: &'static str, value: f64 },
}
