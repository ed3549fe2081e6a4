//! Dimension filtering shared by every view.
//!
//! A [`DimensionSelection`] is the transient query object the presentation
//! layer sends: for each dimension, an optional list of allowed values.
//! Values within a dimension combine with OR, dimensions combine with AND.
//! The same predicate filters both the wide and the long table, which keeps
//! cross-filtering consistent across the row browser and every statistic.

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::schema::{COL_CRITERION, COL_JUDGE, COL_ROUND, COL_SPINNER};

/// The four enumerable dimensions of the long table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Spinner,
    Judge,
    Round,
    Criterion,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Spinner,
        Dimension::Judge,
        Dimension::Round,
        Dimension::Criterion,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::Spinner => COL_SPINNER,
            Dimension::Judge => COL_JUDGE,
            Dimension::Round => COL_ROUND,
            Dimension::Criterion => COL_CRITERION,
        }
    }
}

/// Per-dimension value selections. `None` or an empty list means the
/// dimension is unrestricted, matching an empty dropdown in the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionSelection {
    #[serde(default)]
    pub spinners: Option<Vec<String>>,
    #[serde(default)]
    pub judges: Option<Vec<String>>,
    #[serde(default)]
    pub rounds: Option<Vec<i64>>,
    #[serde(default)]
    pub criteria: Option<Vec<String>>,
}

impl DimensionSelection {
    pub fn is_unrestricted(&self) -> bool {
        non_empty(&self.spinners).is_none()
            && non_empty(&self.judges).is_none()
            && non_empty(&self.rounds).is_none()
            && non_empty(&self.criteria).is_none()
    }

    /// Filter a table down to the selected dimension values.
    ///
    /// The input is never mutated. A dimension whose column is absent from
    /// the table (e.g. `Criterion` against the wide table) imposes no
    /// restriction there.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut filtered = df.clone();
        if let Some(values) = non_empty(&self.spinners) {
            filtered = filter_str(&filtered, COL_SPINNER, values)?;
        }
        if let Some(values) = non_empty(&self.judges) {
            filtered = filter_str(&filtered, COL_JUDGE, values)?;
        }
        if let Some(values) = non_empty(&self.rounds) {
            filtered = filter_round(&filtered, values)?;
        }
        if let Some(values) = non_empty(&self.criteria) {
            filtered = filter_str(&filtered, COL_CRITERION, values)?;
        }
        Ok(filtered)
    }
}

fn non_empty<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    match values {
        Some(values) if !values.is_empty() => Some(values),
        _ => None,
    }
}

fn filter_str(df: &DataFrame, column_name: &str, values: &[String]) -> Result<DataFrame> {
    let Ok(column) = df.column(column_name) else {
        return Ok(df.clone());
    };
    let column = column
        .str()
        .with_context(|| format!("column '{column_name}' is not a string column"))?;

    let allowed: FxHashSet<&str> = values.iter().map(String::as_str).collect();
    let mask: BooleanChunked = column
        .into_iter()
        .map(|opt| opt.map_or(false, |value| allowed.contains(value)))
        .collect();

    df.filter(&mask)
        .with_context(|| format!("failed to filter on '{column_name}'"))
}

fn filter_round(df: &DataFrame, values: &[i64]) -> Result<DataFrame> {
    let Ok(column) = df.column(COL_ROUND) else {
        return Ok(df.clone());
    };
    let column = column.i64().context("Round column is not Int64")?;

    let allowed: FxHashSet<i64> = values.iter().copied().collect();
    let mask: BooleanChunked = column
        .into_iter()
        .map(|opt| opt.map_or(false, |value| allowed.contains(&value)))
        .collect();

    df.filter(&mask).context("failed to filter on Round")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::COL_SCORE;

    fn long_fixture() -> DataFrame {
        df![
            COL_SPINNER => &["eso", "eso", "vain", "fel"],
            COL_ROUND => &[1i64, 2, 1, 2],
            COL_JUDGE => &["A", "B", "A", "B"],
            COL_CRITERION => &["Construction", "Execution", "Construction", "Execution"],
            COL_SCORE => [Some(7.0f64), Some(6.0), Some(5.0), Some(8.0)],
        ]
        .unwrap()
    }

    #[test]
    fn empty_selection_is_identity() {
        let df = long_fixture();
        let selection = DimensionSelection::default();
        assert!(selection.is_unrestricted());
        assert_eq!(selection.apply(&df).unwrap(), df);

        let empty_lists = DimensionSelection {
            spinners: Some(vec![]),
            judges: Some(vec![]),
            rounds: Some(vec![]),
            criteria: Some(vec![]),
        };
        assert_eq!(empty_lists.apply(&df).unwrap(), df);
    }

    #[test]
    fn values_within_a_dimension_combine_with_or() {
        let selection = DimensionSelection {
            spinners: Some(vec!["eso".to_string(), "fel".to_string()]),
            ..Default::default()
        };

        let filtered = selection.apply(&long_fixture()).unwrap();
        assert_eq!(filtered.height(), 3);
    }

    #[test]
    fn dimensions_combine_with_and() {
        let selection = DimensionSelection {
            spinners: Some(vec!["eso".to_string(), "vain".to_string()]),
            rounds: Some(vec![1]),
            judges: Some(vec!["A".to_string()]),
            ..Default::default()
        };

        let filtered = selection.apply(&long_fixture()).unwrap();
        assert_eq!(filtered.height(), 2);
    }

    #[test]
    fn filtering_twice_matches_filtering_once() {
        let selection = DimensionSelection {
            criteria: Some(vec!["Construction".to_string()]),
            rounds: Some(vec![1]),
            ..Default::default()
        };

        let once = selection.apply(&long_fixture()).unwrap();
        let twice = selection.apply(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn absent_dimension_column_imposes_no_restriction() {
        // A wide table has no Criterion column.
        let wide = df![
            COL_SPINNER => &["eso", "vain"],
            COL_ROUND => &[1i64, 1],
            COL_JUDGE => &["A", "A"],
            "Construction" => &[7.0f64, 5.0],
        ]
        .unwrap();

        let selection = DimensionSelection {
            criteria: Some(vec!["Construction".to_string()]),
            ..Default::default()
        };

        assert_eq!(selection.apply(&wide).unwrap(), wide);
    }

    #[test]
    fn selection_round_trips_through_json() {
        let selection = DimensionSelection {
            judges: Some(vec!["A".to_string()]),
            rounds: Some(vec![1, 3]),
            ..Default::default()
        };

        let json = serde_json::to_string(&selection).unwrap();
        let parsed: DimensionSelection = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, selection);
    }

    #[test]
    fn selection_that_excludes_everything_yields_empty_table() {
        let selection = DimensionSelection {
            spinners: Some(vec!["nobody".to_string()]),
            ..Default::default()
        };

        let filtered = selection.apply(&long_fixture()).unwrap();
        assert_eq!(filtered.height(), 0);
    }
}
