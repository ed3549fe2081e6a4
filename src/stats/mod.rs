//! Derived statistical views over the long observation table.
//!
//! - Aggregation: grouped mean / population standard deviation pivots
//! - Correlation: inter-criterion and per-judge criterion-vs-rest matrices
//!
//! Null scores are excluded from every computation; a statistic that cannot
//! be computed is a null cell, never a default number.

pub mod aggregate;
pub mod correlation;

pub use aggregate::{aggregate_scores, Aggregate, PivotTable};
pub use correlation::{criterion_vs_rest, inter_criterion, CorrelationMatrix};

/// Mean of a sample, `None` when empty.
pub(crate) fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divisor N, not N-1).
pub(crate) fn population_std_of(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_empty_sample_is_undefined() {
        assert_eq!(mean_of(&[]), None);
    }

    #[test]
    fn population_std_uses_divisor_n() {
        let values = [5.0, 7.0, 9.0];
        let mean = mean_of(&values).unwrap();
        assert_relative_eq!(mean, 7.0, epsilon = 1e-12);
        // sqrt(8/3), not sqrt(8/2)
        assert_relative_eq!(population_std_of(&values, mean), 1.632993, epsilon = 1e-6);
    }
}
