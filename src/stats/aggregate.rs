//! Grouped descriptive statistics over a dimension pair.
//!
//! Produces a pivot indexed by one dimension and columned by another, cell =
//! aggregate of the scores observed for that pair. Rounds order numerically,
//! every other dimension lexically.

use anyhow::Result;
use polars::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::filter::Dimension;
use crate::schema::COL_SCORE;
use crate::stats::{mean_of, population_std_of};

/// Aggregation applied to each (row, column) group of scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    /// Population standard deviation (divisor N).
    StdDev,
}

/// A pivoted aggregate table with one null-able cell per (index, column)
/// pair. An empty group is a null cell, not a zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub index_name: String,
    pub column_name: String,
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Pivot the long table over `(row_dim, col_dim)` and aggregate `Score`.
pub fn aggregate_scores(
    long: &DataFrame,
    row_dim: Dimension,
    col_dim: Dimension,
    aggregate: Aggregate,
) -> Result<PivotTable> {
    let row_labels = dimension_labels(long, row_dim)?;
    let col_labels = dimension_labels(long, col_dim)?;
    let score = long.column(COL_SCORE)?.f64()?;

    let mut groups: FxHashMap<(String, String), Vec<f64>> = FxHashMap::default();
    for idx in 0..long.height() {
        let (Some(row_key), Some(col_key)) = (&row_labels[idx], &col_labels[idx]) else {
            continue;
        };
        let Some(value) = score.get(idx) else {
            continue;
        };
        groups
            .entry((row_key.clone(), col_key.clone()))
            .or_default()
            .push(value);
    }

    let index = sorted_distinct(&row_labels, row_dim == Dimension::Round);
    let columns = sorted_distinct(&col_labels, col_dim == Dimension::Round);

    let values = index
        .iter()
        .map(|row_key| {
            columns
                .iter()
                .map(|col_key| {
                    let observed = groups.get(&(row_key.clone(), col_key.clone()))?;
                    let mean = mean_of(observed)?;
                    match aggregate {
                        Aggregate::Mean => Some(mean),
                        Aggregate::StdDev => Some(population_std_of(observed, mean)),
                    }
                })
                .collect()
        })
        .collect();

    Ok(PivotTable {
        index_name: row_dim.column_name().to_string(),
        column_name: col_dim.column_name().to_string(),
        index,
        columns,
        values,
    })
}

/// Stringified per-row labels for one dimension. Nulls stay `None` and are
/// excluded from grouping.
fn dimension_labels(df: &DataFrame, dim: Dimension) -> Result<Vec<Option<String>>> {
    let column = df.column(dim.column_name())?;
    let labels = match dim {
        Dimension::Round => column
            .i64()?
            .into_iter()
            .map(|opt| opt.map(|value| value.to_string()))
            .collect(),
        _ => column
            .str()?
            .into_iter()
            .map(|opt| opt.map(str::to_string))
            .collect(),
    };
    Ok(labels)
}

fn sorted_distinct(labels: &[Option<String>], numeric: bool) -> Vec<String> {
    let distinct: FxHashSet<&String> = labels.iter().flatten().collect();
    let mut out: Vec<String> = distinct.into_iter().cloned().collect();
    if numeric {
        out.sort_by_key(|label| label.parse::<i64>().unwrap_or(i64::MAX));
    } else {
        out.sort();
    }
    out
}
