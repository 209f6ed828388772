//! Population management and the generational step of the genetic algorithm.
//!
//! # Algorithm Overview
//!
//! Each generation follows the same cycle:
//!
//! 1. **Evaluate Fitness** - Each individual plays seeded episodes and receives a score
//! 2. **Elite Selection** - The fittest `elite_count` individuals are copied unchanged
//! 3. **Tournament Selection** - Parents are picked by tournaments of `k` uniform draws
//! 4. **One-Point Crossover** - Parent pairs exchange their weight tails
//! 5. **Gaussian Mutation** - Each gene is perturbed with probability `p_mut`
//!
//! # Key Components
//!
//! - [`Individual`] - A policy and, once evaluated, its [`Evaluation`]
//! - [`Population`] - Individuals of one generation, in creation order
//! - [`PopulationEvolver`] - Operator parameters turning one generation into the next
//!
//! Unlike the evaluation seeds, which only depend on the run seed, generation and
//! index, every draw of the operators comes from the single run [`SimRng`]. The order
//! of draws is therefore part of the run's reproducibility: elites draw nothing, then
//! each child pair draws two tournaments, a crossover and two mutations.
//!
//! # Parallelization
//!
//! [`Population::evaluate_range`] may evaluate individuals on scoped threads. Since an
//! evaluation is a pure function of the policy and its seed, the results do not depend
//! on scheduling.

use std::{ops::Range, thread};

use brickevo_engine::{FEATURE_COUNT, SimRng};
use brickevo_evaluator::{
    fitness::{Evaluation, FitnessEvaluator},
    policy::Policy,
};
use brickevo_stats::descriptive::DescriptiveStats;

use crate::{genotype, params::GeneRanges};

/// A candidate policy and its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    policy: Policy,
    evaluation: Option<Evaluation>,
}

impl Individual {
    /// Creates an unevaluated individual.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            evaluation: None,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    #[must_use]
    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    /// Returns the fitness, or negative infinity before evaluation.
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.evaluation
            .as_ref()
            .map_or(f64::NEG_INFINITY, |e| e.fitness)
    }
}

/// Individuals of one generation, in creation order.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Creates `count` individuals with uniformly random genes.
    #[must_use]
    pub fn random(count: usize, rng: &mut SimRng, ranges: &GeneRanges) -> Self {
        let individuals = (0..count)
            .map(|_| Individual::new(genotype::random_policy(rng, ranges)))
            .collect();
        Self { individuals }
    }

    #[must_use]
    pub fn from_policies<I>(policies: I) -> Self
    where
        I: IntoIterator<Item = Policy>,
    {
        Self {
            individuals: policies.into_iter().map(Individual::new).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Returns whether every individual has been evaluated.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.individuals.iter().all(|ind| ind.evaluation.is_some())
    }

    /// Evaluates the individuals at `range`, seeding individual `i` with `seed_of(i)`.
    ///
    /// With `parallel` set, each individual is evaluated on its own scoped thread.
    pub fn evaluate_range<F>(
        &mut self,
        range: Range<usize>,
        evaluator: &FitnessEvaluator,
        parallel: bool,
        seed_of: F,
    ) where
        F: Fn(usize) -> u32,
    {
        let start = range.start;
        let batch = &mut self.individuals[range];
        if parallel {
            thread::scope(|s| {
                for (offset, ind) in batch.iter_mut().enumerate() {
                    let seed = seed_of(start + offset);
                    s.spawn(move || {
                        ind.evaluation = Some(evaluator.evaluate(&ind.policy, seed));
                    });
                }
            });
        } else {
            for (offset, ind) in batch.iter_mut().enumerate() {
                let seed = seed_of(start + offset);
                ind.evaluation = Some(evaluator.evaluate(&ind.policy, seed));
            }
        }
    }

    /// Index of the fittest individual; the first one wins ties.
    #[must_use]
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, ind) in self.individuals.iter().enumerate() {
            let fitness = ind.fitness();
            if best.is_none_or(|(_, f)| fitness > f) {
                best = Some((i, fitness));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Indices sorted by descending fitness, ties kept in population order.
    #[must_use]
    pub fn ranking(&self) -> Vec<usize> {
        let mut order = (0..self.individuals.len()).collect::<Vec<_>>();
        order.sort_by(|&a, &b| {
            self.individuals[b]
                .fitness()
                .total_cmp(&self.individuals[a].fitness())
        });
        order
    }

    /// Descriptive statistics of the fitness distribution.
    #[must_use]
    pub fn fitness_stats(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.individuals.iter().map(Individual::fitness))
    }

    /// Per-gene statistics: the eight weights, then the dead-zone.
    ///
    /// Useful to follow how fast the population loses diversity.
    #[must_use]
    pub fn gene_stats(&self) -> Vec<DescriptiveStats> {
        let weights = (0..FEATURE_COUNT).filter_map(|i| {
            DescriptiveStats::new(self.individuals.iter().map(|ind| ind.policy.weights()[i]))
        });
        let dead_zone =
            DescriptiveStats::new(self.individuals.iter().map(|ind| ind.policy.dead_zone()));
        weights.chain(dead_zone).collect()
    }
}

/// Operator parameters for breeding the next generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationEvolver {
    /// Individuals copied unchanged, fittest first.
    pub elite_count: usize,
    /// Draws per tournament (larger = stronger selection pressure).
    pub tournament_size: usize,
    /// Probability of recombining a parent pair.
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
    pub ranges: GeneRanges,
}

impl PopulationEvolver {
    /// Breeds the next generation from an evaluated population.
    ///
    /// The result has the same size as `population`. Its first `elite_count`
    /// individuals are copies of the fittest policies, by descending fitness. The
    /// rest are mutated crossover children of tournament winners, added in pairs; the
    /// second child of the last pair is skipped (without drawing its mutation) when
    /// only one slot remains.
    #[must_use]
    pub fn evolve(&self, population: &Population, rng: &mut SimRng) -> Population {
        assert!(population.is_evaluated());
        let target = population.len();
        let mut next = Vec::with_capacity(target);

        next.extend(
            population
                .ranking()
                .into_iter()
                .take(self.elite_count.min(target))
                .map(|i| Individual::new(population.individuals[i].policy)),
        );

        while next.len() < target {
            let p1 = tournament_select(&population.individuals, self.tournament_size, rng);
            let p2 = tournament_select(&population.individuals, self.tournament_size, rng);
            let (c1, c2) = genotype::one_point_crossover(
                &p1.policy,
                &p2.policy,
                self.crossover_rate,
                rng,
                &self.ranges,
            );
            let c1 = genotype::gaussian_mutation(&c1, self.mutation_rate, rng, &self.ranges);
            next.push(Individual::new(c1));
            if next.len() < target {
                let c2 = genotype::gaussian_mutation(&c2, self.mutation_rate, rng, &self.ranges);
                next.push(Individual::new(c2));
            }
        }

        Population { individuals: next }
    }
}

/// Selects an individual using tournament selection.
///
/// Draws `tournament_size` indices uniformly, with replacement, and returns the fittest
/// drawn individual; the earliest draw wins ties.
///
/// # Panics
///
/// Panics if `population` is empty or `tournament_size` is zero.
pub fn tournament_select<'a>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut SimRng,
) -> &'a Individual {
    assert!(tournament_size > 0);
    assert!(!population.is_empty());
    let mut best = &population[uniform_index(rng, population.len())];
    for _ in 1..tournament_size {
        let candidate = &population[uniform_index(rng, population.len())];
        if candidate.fitness() > best.fitness() {
            best = candidate;
        }
    }
    best
}

fn uniform_index(rng: &mut SimRng, len: usize) -> usize {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let index = (rng.next_unit() * len as f64).floor() as usize;
    index.min(len - 1)
}

#[cfg(test)]
mod tests {
    use brickevo_engine::GameConfig;

    use super::*;

    fn evaluated(fitness: &[f64]) -> Population {
        let individuals = fitness
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                #[expect(clippy::cast_precision_loss)]
                let gene = i as f64 / 100.0;
                Individual {
                    policy: Policy::new([gene; FEATURE_COUNT], 0.1),
                    evaluation: Some(Evaluation {
                        seed: 0,
                        fitness: f,
                        episodes: vec![],
                    }),
                }
            })
            .collect();
        Population { individuals }
    }

    fn evolver(elite_count: usize) -> PopulationEvolver {
        PopulationEvolver {
            elite_count,
            tournament_size: 3,
            crossover_rate: 0.7,
            mutation_rate: 0.1,
            ranges: GeneRanges::default(),
        }
    }

    #[test]
    fn test_best_index_prefers_first_max() {
        let population = evaluated(&[1.0, 5.0, 3.0, 5.0]);
        assert_eq!(population.best_index(), Some(1));
        assert_eq!(Population::from_policies([]).best_index(), None);
    }

    #[test]
    fn test_ranking_is_stable_descending() {
        let population = evaluated(&[2.0, 7.0, 2.0, 9.0, 7.0]);
        assert_eq!(population.ranking(), vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn test_evolve_keeps_size_and_elites() {
        let fitness = [3.0, 10.0, -1.0, 8.0, 0.5, 8.0, 2.0];
        let population = evaluated(&fitness);
        let mut rng = SimRng::new(12);
        for elite in 0..4 {
            let next = evolver(elite).evolve(&population, &mut rng);
            assert_eq!(next.len(), population.len());
            let ranking = population.ranking();
            for (slot, &source) in ranking.iter().take(elite).enumerate() {
                assert_eq!(
                    next.individuals()[slot].policy(),
                    population.individuals()[source].policy()
                );
            }
            assert!(next.individuals().iter().all(|ind| ind.evaluation().is_none()));
        }
    }

    #[test]
    fn test_evolve_handles_odd_fill() {
        // population - elite is odd, so the last pair only contributes one child.
        let population = evaluated(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let mut rng = SimRng::new(5);
        let next = evolver(1).evolve(&population, &mut rng);
        assert_eq!(next.len(), 6);
    }

    #[test]
    fn test_tournament_favors_fitter() {
        let population = evaluated(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let mut rng = SimRng::new(77);
        let picks = 2000;
        let mut total = 0.0;
        for _ in 0..picks {
            total += tournament_select(population.individuals(), 3, &mut rng).fitness();
        }
        let mean = total / f64::from(picks);
        // Uniform picks would average 4.5; the best of three averages about 6.7.
        assert!(mean > 6.0, "mean {mean}");

        let single = tournament_select(&population.individuals()[4..5], 5, &mut rng);
        assert_eq!(single.fitness(), 4.0);
    }

    #[test]
    fn test_parallel_and_sequential_evaluation_agree() {
        let mut rng = SimRng::new(31);
        let population = Population::random(6, &mut rng, &GeneRanges::default());
        let evaluator = FitnessEvaluator::new(GameConfig::default(), 1, 600);
        let seed_of = |i: usize| 100 + u32::try_from(i).unwrap();

        let mut sequential = population.clone();
        sequential.evaluate_range(0..6, &evaluator, false, seed_of);
        let mut parallel = population;
        parallel.evaluate_range(0..3, &evaluator, true, seed_of);
        assert!(!parallel.is_evaluated());
        parallel.evaluate_range(3..6, &evaluator, true, seed_of);

        assert!(sequential.is_evaluated());
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.individuals()[4].evaluation().unwrap().seed, 104);
    }

    #[test]
    fn test_gene_stats_shape() {
        let mut rng = SimRng::new(3);
        let population = Population::random(20, &mut rng, &GeneRanges::default());
        let stats = population.gene_stats();
        assert_eq!(stats.len(), FEATURE_COUNT + 1);
        assert!(stats[..FEATURE_COUNT].iter().all(|s| s.min >= -2.0 && s.max <= 2.0));
        assert!(stats[FEATURE_COUNT].max <= 0.3);
        assert_eq!(stats[0].count, 20);
    }
}
