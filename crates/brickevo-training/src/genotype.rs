//! Genetic operators on policies.
//!
//! A genotype is a [`Policy`]: eight feature weights plus a dead-zone threshold. The
//! operators here never modify their inputs; they always build new policies.
//!
//! # Operations
//!
//! - **Initialization**: [`random_policy`] draws every gene uniformly from its range
//! - **Crossover**: [`one_point_crossover`] swaps the weight tails after a random cut
//! - **Mutation**: [`gaussian_mutation`] adds Gaussian noise gene by gene
//!
//! All randomness comes from the run's [`SimRng`], in a fixed draw order, so a run
//! seed reproduces every offspring exactly.

use std::f64::consts::TAU;

use brickevo_engine::{FEATURE_COUNT, SimRng};
use brickevo_evaluator::policy::Policy;

use crate::params::GeneRanges;

/// Smallest uniform sample fed to the Box–Muller logarithm.
const MIN_UNIFORM: f64 = 1e-9;

fn uniform_in(rng: &mut SimRng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.next_unit()
}

fn nonzero_unit(rng: &mut SimRng) -> f64 {
    let u = rng.next_unit();
    if u > 0.0 { u } else { MIN_UNIFORM }
}

/// Draws a standard normal sample with the Box–Muller transform.
///
/// Consumes exactly two uniform draws. A zero draw is replaced by a tiny positive
/// value so the logarithm stays finite.
pub fn standard_normal(rng: &mut SimRng) -> f64 {
    let u = nonzero_unit(rng);
    let v = nonzero_unit(rng);
    (-2.0 * u.ln()).sqrt() * (TAU * v).cos()
}

/// Creates a policy with weights and dead-zone uniform in their ranges.
///
/// Weights are drawn first, in index order, then the dead-zone.
pub fn random_policy(rng: &mut SimRng, ranges: &GeneRanges) -> Policy {
    let mut weights = [0.0; FEATURE_COUNT];
    for w in &mut weights {
        *w = uniform_in(rng, ranges.weight_min, ranges.weight_max);
    }
    let dead_zone = uniform_in(rng, ranges.dead_zone_min, ranges.dead_zone_max);
    Policy::new(weights, dead_zone)
}

/// Recombines two parents with probability `p_cross`.
///
/// When recombination happens, a cut point `c` is drawn in `1..FEATURE_COUNT` and the
/// weights at indices `c..` are swapped between the children. Each child then takes
/// its dead-zone from either parent with equal chance, independently of the other
/// child. Otherwise the parents are returned unchanged.
///
/// # Example
///
/// ```
/// use brickevo_engine::SimRng;
/// use brickevo_evaluator::policy::Policy;
/// use brickevo_training::{genotype, params::GeneRanges};
///
/// let a = Policy::new([1.0; 8], 0.1);
/// let b = Policy::new([-1.0; 8], 0.2);
/// let mut rng = SimRng::new(3);
/// let (c1, c2) = genotype::one_point_crossover(&a, &b, 1.0, &mut rng, &GeneRanges::default());
///
/// // Every position holds one gene from each parent.
/// for i in 0..8 {
///     assert_eq!(c1.weights()[i] + c2.weights()[i], 0.0);
/// }
/// assert_eq!(c1.weights()[0], 1.0);
/// assert_eq!(c2.weights()[7], 1.0);
/// ```
pub fn one_point_crossover(
    a: &Policy,
    b: &Policy,
    p_cross: f64,
    rng: &mut SimRng,
    ranges: &GeneRanges,
) -> (Policy, Policy) {
    if rng.next_unit() > p_cross {
        return (*a, *b);
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    let cut = 1 + (rng.next_unit() * (FEATURE_COUNT - 1) as f64).floor() as usize;
    let mut wa = *a.weights();
    let mut wb = *b.weights();
    wa[cut..].swap_with_slice(&mut wb[cut..]);

    let dz_a = if rng.next_unit() < 0.5 {
        a.dead_zone()
    } else {
        b.dead_zone()
    };
    let dz_b = if rng.next_unit() < 0.5 {
        b.dead_zone()
    } else {
        a.dead_zone()
    };
    let dz_range = ranges.dead_zone();
    (
        Policy::new(wa, dz_a.clamp(*dz_range.start(), *dz_range.end())),
        Policy::new(wb, dz_b.clamp(*dz_range.start(), *dz_range.end())),
    )
}

/// Mutates each gene independently with probability `p_mut`.
///
/// A mutated gene receives `N(0, σ²)` noise, with σ from `ranges`, and is clamped to
/// its range. Weights are visited in index order, then the dead-zone.
pub fn gaussian_mutation(
    policy: &Policy,
    p_mut: f64,
    rng: &mut SimRng,
    ranges: &GeneRanges,
) -> Policy {
    let mut weights = *policy.weights();
    for w in &mut weights {
        if rng.next_unit() < p_mut {
            let noise = standard_normal(rng) * ranges.weight_sigma;
            *w = (*w + noise).clamp(ranges.weight_min, ranges.weight_max);
        }
    }
    let mut dead_zone = policy.dead_zone();
    if rng.next_unit() < p_mut {
        let noise = standard_normal(rng) * ranges.dead_zone_sigma;
        dead_zone = (dead_zone + noise).clamp(ranges.dead_zone_min, ranges.dead_zone_max);
    }
    Policy::new(weights, dead_zone)
}
