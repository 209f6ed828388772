//! Statistical helpers for the brickevo workspace.
//!
//! The genetic algorithm summarizes every generation with a handful of numbers
//! (best, average, worst fitness) and the trainer reports how spread out each gene is
//! across the population. Both are served by [`descriptive::DescriptiveStats`].
//!
//! # Examples
//!
//! ```
//! use brickevo_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! assert_eq!(stats.max, 5.0);
//! ```

pub mod descriptive;
