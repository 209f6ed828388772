use serde::{Deserialize, Serialize};

/// Descriptive statistics summarizing a set of `f64` samples.
///
/// Computed in a single pass (Welford's algorithm), so the input order does not matter
/// and no intermediate buffer is allocated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    /// Number of samples.
    pub count: usize,
    /// The minimum sample.
    pub min: f64,
    /// The maximum sample.
    pub max: f64,
    /// The arithmetic mean.
    pub mean: f64,
    /// The population variance.
    pub variance: f64,
    /// The population standard deviation.
    pub std_dev: f64,
    /// Standard deviation divided by the range (`0.0` when all samples are equal).
    pub normalized_std_dev: f64,
}

impl DescriptiveStats {
    /// Computes statistics from any iterator of samples.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if at least one sample was provided
    /// * `None` - if the iterator was empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use brickevo_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert!((stats.variance - 2.0).abs() < 1e-12);
    ///
    /// assert!(DescriptiveStats::new(std::iter::empty()).is_none());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0_usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut mean = 0.0;
        let mut m2 = 0.0;

        for value in values {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            let delta = value - mean;
            mean += delta / count as f64;
            m2 += delta * (value - mean);
        }

        if count == 0 {
            return None;
        }

        let variance = m2 / count as f64;
        let std_dev = variance.sqrt();
        let range = max - min;
        // Relative epsilon so that tightly converged populations of large fitness
        // values still report zero spread.
        let normalized_std_dev = if range <= mean.abs() * f64::EPSILON {
            0.0
        } else {
            std_dev / range
        };

        Some(Self {
            count,
            min,
            max,
            mean,
            variance,
            std_dev,
            normalized_std_dev,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_single_value() {
        let stats = DescriptiveStats::new([7.5]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 7.5);
        assert_eq!(stats.max, 7.5);
        assert_eq!(stats.mean, 7.5);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.normalized_std_dev, 0.0);
    }

    #[test]
    fn test_known_values() {
        let stats = DescriptiveStats::new([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
        assert!((stats.normalized_std_dev - 2.0 / 7.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn test_mean_within_bounds(values in prop::collection::vec(-1.0e6..1.0e6_f64, 1..64)) {
            let stats = DescriptiveStats::new(values.iter().copied()).unwrap();
            prop_assert!(stats.min <= stats.mean + 1e-6);
            prop_assert!(stats.mean <= stats.max + 1e-6);
            prop_assert!(stats.variance >= 0.0);
        }
    }
}
