//! Z-score normalization within (criterion, judge) cohorts.
//!
//! Corrects for per-judge scoring tendencies: every observation is
//! standardized against the mean and population standard deviation of its
//! own judge's scores for that criterion. Cohorts are fixed when the
//! pipeline is built, over the full long table, not per dashboard filter.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashMap;

use crate::schema::{COL_CRITERION, COL_JUDGE, COL_SCORE, COL_ZSCORE};
use crate::stats::{mean_of, population_std_of};

/// Append the `ZScore` column to a long observation table.
///
/// A null score stays null. A cohort with zero spread (all scores
/// identical, including cohorts of size 1) has no defined z-score; its
/// observations get a null, never a fabricated 0.
pub fn with_zscores(long: &DataFrame) -> Result<DataFrame> {
    let criterion = long.column(COL_CRITERION)?.str()?;
    let judge = long.column(COL_JUDGE)?.str()?;
    let score = long.column(COL_SCORE)?.f64()?;

    let mut cohorts: FxHashMap<(String, String), Vec<usize>> = FxHashMap::default();
    for idx in 0..long.height() {
        let (Some(criterion_value), Some(judge_value)) = (criterion.get(idx), judge.get(idx))
        else {
            continue;
        };
        cohorts
            .entry((criterion_value.to_string(), judge_value.to_string()))
            .or_default()
            .push(idx);
    }

    let mut zscores: Vec<Option<f64>> = vec![None; long.height()];
    for indices in cohorts.values() {
        let observed: Vec<f64> = indices.iter().filter_map(|&idx| score.get(idx)).collect();
        let Some(mean) = mean_of(&observed) else {
            continue;
        };
        let std_dev = population_std_of(&observed, mean);
        if std_dev <= 0.0 {
            continue;
        }

        for &idx in indices {
            if let Some(value) = score.get(idx) {
                zscores[idx] = Some((value - mean) / std_dev);
            }
        }
    }

    let mut out = long.clone();
    out.with_column(Series::new(COL_ZSCORE.into(), zscores))
        .context("failed to append ZScore column")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{COL_ROUND, COL_SPINNER};
    use approx::assert_relative_eq;

    fn long_table(judges: &[&str], criteria: &[&str], scores: &[Option<f64>]) -> DataFrame {
        let n = judges.len();
        df![
            COL_SPINNER => (0..n).map(|i| format!("s{i}")).collect::<Vec<_>>(),
            COL_ROUND => vec![1i64; n],
            COL_JUDGE => judges,
            COL_CRITERION => criteria,
            COL_SCORE => scores,
        ]
        .unwrap()
    }

    fn zscores(df: &DataFrame) -> Vec<Option<f64>> {
        df.column(COL_ZSCORE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn standardizes_against_the_cohort() {
        let long = long_table(
            &["A", "A", "A"],
            &["Construction"; 3],
            &[Some(5.0), Some(7.0), Some(9.0)],
        );

        let normalized = with_zscores(&long).unwrap();
        let z = zscores(&normalized);

        assert_relative_eq!(z[0].unwrap(), -1.2247, epsilon = 1e-4);
        assert_relative_eq!(z[1].unwrap(), 0.0, epsilon = 1e-4);
        assert_relative_eq!(z[2].unwrap(), 1.2247, epsilon = 1e-4);
    }

    #[test]
    fn cohorts_are_split_by_judge_and_criterion() {
        let long = long_table(
            &["A", "A", "B", "B"],
            &["Construction", "Execution", "Construction", "Construction"],
            &[Some(5.0), Some(5.0), Some(2.0), Some(4.0)],
        );

        let normalized = with_zscores(&long).unwrap();
        let z = zscores(&normalized);

        // Singleton cohorts for judge A have zero spread.
        assert_eq!(z[0], None);
        assert_eq!(z[1], None);
        // Judge B's Construction cohort normalizes to +/-1.
        assert_relative_eq!(z[2].unwrap(), -1.0, epsilon = 1e-12);
        assert_relative_eq!(z[3].unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_spread_cohort_stays_undefined() {
        let long = long_table(
            &["A", "A"],
            &["Construction"; 2],
            &[Some(6.0), Some(6.0)],
        );

        let normalized = with_zscores(&long).unwrap();
        assert_eq!(zscores(&normalized), vec![None, None]);
    }

    #[test]
    fn null_scores_keep_null_zscores() {
        let long = long_table(
            &["A", "A", "A"],
            &["Construction"; 3],
            &[Some(5.0), None, Some(9.0)],
        );

        let normalized = with_zscores(&long).unwrap();
        let z = zscores(&normalized);
        assert!(z[0].is_some());
        assert_eq!(z[1], None);
        assert!(z[2].is_some());
    }

    #[test]
    fn normalized_cohort_has_zero_mean_unit_spread() {
        let long = long_table(
            &["A"; 5],
            &["Construction"; 5],
            &[Some(3.0), Some(5.0), Some(6.5), Some(8.0), Some(9.0)],
        );

        let normalized = with_zscores(&long).unwrap();
        let z: Vec<f64> = zscores(&normalized).into_iter().flatten().collect();

        let mean = mean_of(&z).unwrap();
        let std_dev = population_std_of(&z, mean);
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(std_dev, 1.0, epsilon = 1e-12);
    }
}
