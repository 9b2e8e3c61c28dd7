//! Statistical Features Computation

/// Summary statistics for one feature column.
///
/// NaN entries are treated as missing and excluded from every statistic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticalFeatures {
    /// Number of observed (non-NaN) values
    pub count: usize,
    /// Number of missing values
    pub missing: usize,
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Median value
    pub median: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatisticalFeatures {
    /// Compute statistics from a column of values
    pub fn compute(values: &[f64]) -> Self {
        let mut observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let missing = values.len() - observed.len();

        if observed.is_empty() {
            return Self {
                missing,
                ..Self::default()
            };
        }

        let n = observed.len() as f64;
        let mean = observed.iter().sum::<f64>() / n;

        let min = observed.iter().cloned().fold(f64::MAX, f64::min);
        let max = observed.iter().cloned().fold(f64::MIN, f64::max);

        let m2: f64 = observed.iter().map(|v| (v - mean) * (v - mean)).sum();
        let std_dev = (m2 / n).sqrt();

        observed.sort_by(f64::total_cmp);
        let mid = observed.len() / 2;
        let median = if observed.len() % 2 == 0 {
            (observed[mid - 1] + observed[mid]) / 2.0
        } else {
            observed[mid]
        };

        Self {
            count: observed.len(),
            missing,
            mean,
            std_dev,
            median,
            min,
            max,
        }
    }

    /// Extract one column from a row-major matrix
    pub fn extract_column<const N: usize>(rows: &[[f64; N]], column: usize) -> Vec<f64> {
        rows.iter().map(|r| r[column]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.median, 3.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_even_median_averages_middle_pair() {
        let stats = StatisticalFeatures::compute(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn test_missing_values_skipped() {
        let stats = StatisticalFeatures::compute(&[1.0, f64::NAN, 3.0]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn test_empty_values() {
        let stats = StatisticalFeatures::compute(&[f64::NAN, f64::NAN]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.missing, 2);
        assert_eq!(stats.mean, 0.0);
    }
}
