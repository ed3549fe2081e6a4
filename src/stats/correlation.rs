//! Correlation views over the long observation table.
//!
//! Both views start from the same pivot: one row per judged performance
//! (spinner, round, judge), one column per criterion, cell = mean of that
//! pair's observed scores. Residual duplicate observations average out;
//! a pair with no observed score is a missing cell.
//!
//! Pearson coefficients use pairwise-complete observations. Any series pair
//! with fewer than 2 points or zero variance has no defined coefficient and
//! yields a null cell.

use anyhow::Result;
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::schema::{COL_CRITERION, COL_JUDGE, COL_ROUND, COL_SCORE, COL_SPINNER};

/// A correlation table indexed by two dimensions, cells in [-1, 1] or null
/// where the coefficient is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub index_name: String,
    pub column_name: String,
    pub index: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// The degenerate result: a single unlabeled null cell.
    pub fn no_data(index_name: &str, column_name: &str) -> Self {
        Self {
            index_name: index_name.to_string(),
            column_name: column_name.to_string(),
            index: vec![String::new()],
            columns: vec![String::new()],
            values: vec![vec![None]],
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.index.len() == 1
            && self.columns.len() == 1
            && self.index[0].is_empty()
            && self.columns[0].is_empty()
            && self.values[0][0].is_none()
    }
}

/// Pairwise correlation between criteria across judged performances.
///
/// The diagonal is explicitly null: a criterion's correlation with itself
/// is not meaningful output. With fewer than 2 criteria or fewer than 2
/// performances the whole result degenerates to a single no-data cell.
pub fn inter_criterion(long: &DataFrame) -> Result<CorrelationMatrix> {
    let pivot = pivot_by_performance(long)?;
    if pivot.criteria.len() < 2 || pivot.rows.len() < 2 {
        return Ok(CorrelationMatrix::no_data(COL_CRITERION, COL_CRITERION));
    }

    let n = pivot.criteria.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let mut xs = Vec::new();
            let mut ys = Vec::new();
            for row in &pivot.rows {
                if let (Some(x), Some(y)) = (row.cells[i], row.cells[j]) {
                    xs.push(x);
                    ys.push(y);
                }
            }
            let coefficient = pearson(&xs, &ys);
            values[i][j] = coefficient;
            values[j][i] = coefficient;
        }
    }

    Ok(CorrelationMatrix {
        index_name: COL_CRITERION.to_string(),
        column_name: COL_CRITERION.to_string(),
        index: pivot.criteria.clone(),
        columns: pivot.criteria,
        values,
    })
}

/// Per-judge correlation between each criterion and the rest of the total.
///
/// For every performance, `Total` is the sum of its present criterion
/// cells. Within a judge's performances, each criterion correlates against
/// `Total - criterion`: how much one score tracks the score it is not part
/// of. Judges with fewer than 2 usable performances get null cells.
pub fn criterion_vs_rest(long: &DataFrame) -> Result<CorrelationMatrix> {
    let pivot = pivot_by_performance(long)?;
    if pivot.criteria.is_empty() || pivot.rows.is_empty() {
        return Ok(CorrelationMatrix::no_data(COL_JUDGE, COL_CRITERION));
    }

    let mut by_judge: FxHashMap<&str, Vec<&PerformanceRow>> = FxHashMap::default();
    for row in &pivot.rows {
        if let Some(judge) = row.judge.as_deref() {
            by_judge.entry(judge).or_default().push(row);
        }
    }

    let mut judges: Vec<String> = by_judge.keys().map(|judge| judge.to_string()).collect();
    judges.sort();

    let values = judges
        .iter()
        .map(|judge| {
            let rows = &by_judge[judge.as_str()];
            (0..pivot.criteria.len())
                .map(|criterion_idx| {
                    let mut xs = Vec::new();
                    let mut ys = Vec::new();
                    for row in rows {
                        let Some(x) = row.cells[criterion_idx] else {
                            continue;
                        };
                        let total: f64 = row.cells.iter().flatten().sum();
                        xs.push(x);
                        ys.push(total - x);
                    }
                    pearson(&xs, &ys)
                })
                .collect()
        })
        .collect();

    Ok(CorrelationMatrix {
        index_name: COL_JUDGE.to_string(),
        column_name: COL_CRITERION.to_string(),
        index: judges,
        columns: pivot.criteria,
        values,
    })
}

struct PerformanceRow {
    judge: Option<String>,
    /// Aligned with `ScorePivot::criteria`; a missing cell means the
    /// performance has no observed score for that criterion.
    cells: Vec<Option<f64>>,
}

struct ScorePivot {
    criteria: Vec<String>,
    rows: Vec<PerformanceRow>,
}

/// Pivot the long table to one row per (spinner, round, judge) and one
/// column per criterion, averaging duplicate observations.
fn pivot_by_performance(long: &DataFrame) -> Result<ScorePivot> {
    let spinner = long.column(COL_SPINNER)?.str()?;
    let round = long.column(COL_ROUND)?.i64()?;
    let judge = long.column(COL_JUDGE)?.str()?;
    let criterion = long.column(COL_CRITERION)?.str()?;
    let score = long.column(COL_SCORE)?.f64()?;

    type Identity = (Option<String>, Option<i64>, Option<String>);
    let mut order: Vec<Identity> = Vec::new();
    let mut sums: FxHashMap<Identity, FxHashMap<String, (f64, u32)>> = FxHashMap::default();
    let mut criteria: Vec<String> = Vec::new();

    for idx in 0..long.height() {
        let Some(criterion_value) = criterion.get(idx) else {
            continue;
        };
        if !criteria.iter().any(|name| name == criterion_value) {
            criteria.push(criterion_value.to_string());
        }
        let Some(value) = score.get(idx) else {
            continue;
        };

        let identity = (
            spinner.get(idx).map(str::to_string),
            round.get(idx),
            judge.get(idx).map(str::to_string),
        );
        if !sums.contains_key(&identity) {
            order.push(identity.clone());
        }
        let cells = sums.entry(identity).or_default();
        let (sum, count) = cells.entry(criterion_value.to_string()).or_insert((0.0, 0));
        *sum += value;
        *count += 1;
    }

    criteria.sort();

    let rows = order
        .into_iter()
        .map(|identity| {
            let cells_by_criterion = &sums[&identity];
            let cells = criteria
                .iter()
                .map(|name| {
                    cells_by_criterion
                        .get(name)
                        .map(|(sum, count)| sum / f64::from(*count))
                })
                .collect();
            PerformanceRow {
                judge: identity.2,
                cells,
            }
        })
        .collect();

    Ok(ScorePivot { criteria, rows })
}

/// Pearson correlation coefficient over paired samples.
///
/// Undefined (None) for fewer than 2 pairs or zero variance in either
/// series.
pub(crate) fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }

    let count = n as f64;
    let mean_x = xs.iter().sum::<f64>() / count;
    let mean_y = ys.iter().sum::<f64>() / count;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    if variance_x <= 0.0 || variance_y <= 0.0 {
        return None;
    }

    Some((covariance / (variance_x * variance_y).sqrt()).clamp(-1.0, 1.0))
}
