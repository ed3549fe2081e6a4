//! The query interface consumed by the presentation layer.
//!
//! One pure function: given the built pipeline data and a dimension
//! selection, return the filtered row set plus every statistical view
//! computed over it. Total over all valid selections, including ones that
//! exclude every observation. The independent statistics are computed in
//! parallel; every component is a pure function over its input frame.

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use crate::data::TournamentData;
use crate::filter::{Dimension, DimensionSelection};
use crate::schema::{COL_CRITERION, COL_JUDGE, COL_ROUND, COL_SPINNER};
use crate::stats::{
    aggregate_scores, criterion_vs_rest, inter_criterion, Aggregate, CorrelationMatrix,
    PivotTable,
};

/// Distinct values per dimension, from the unfiltered long table. Populates
/// the selector widgets; sorted for stable display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DimensionValues {
    pub spinners: Vec<String>,
    pub judges: Vec<String>,
    pub rounds: Vec<i64>,
    pub criteria: Vec<String>,
}

impl DimensionValues {
    pub fn from_long(long: &DataFrame) -> Result<Self> {
        Ok(Self {
            spinners: distinct_str(long, COL_SPINNER)?,
            judges: distinct_str(long, COL_JUDGE)?,
            rounds: distinct_rounds(long)?,
            criteria: distinct_str(long, COL_CRITERION)?,
        })
    }
}

/// The statistical views rendered alongside the row browser.
#[derive(Debug, Clone, Serialize)]
pub struct StatViews {
    /// Mean score per Judge x Criterion.
    pub mean_by_judge: PivotTable,
    /// Population score spread per Judge x Criterion.
    pub spread_by_judge: PivotTable,
    /// Mean score per Round x Criterion.
    pub mean_by_round: PivotTable,
    /// Pairwise correlation between criteria.
    pub criterion_correlation: CorrelationMatrix,
    /// Per-judge correlation of each criterion against the rest of the
    /// total; a bias/consistency diagnostic.
    pub judge_consistency: CorrelationMatrix,
}

/// Everything one selection change needs: the filtered rows for display and
/// the statistics computed over exactly that subset.
#[derive(Debug, Clone)]
pub struct ViewBundle {
    pub rows: DataFrame,
    pub stats: StatViews,
}

/// Filter the long table once, then derive all views from the subset.
pub fn compute_views(data: &TournamentData, selection: &DimensionSelection) -> Result<ViewBundle> {
    let rows = selection.apply(&data.long)?;
    let stats = compute_stats(&rows)?;
    Ok(ViewBundle { rows, stats })
}

/// Compute the statistical views over an already-filtered long table.
pub fn compute_stats(filtered: &DataFrame) -> Result<StatViews> {
    let (aggregates, correlations) = rayon::join(
        || -> Result<(PivotTable, PivotTable, PivotTable)> {
            Ok((
                aggregate_scores(
                    filtered,
                    Dimension::Judge,
                    Dimension::Criterion,
                    Aggregate::Mean,
                )?,
                aggregate_scores(
                    filtered,
                    Dimension::Judge,
                    Dimension::Criterion,
                    Aggregate::StdDev,
                )?,
                aggregate_scores(
                    filtered,
                    Dimension::Round,
                    Dimension::Criterion,
                    Aggregate::Mean,
                )?,
            ))
        },
        || -> Result<(CorrelationMatrix, CorrelationMatrix)> {
            Ok((inter_criterion(filtered)?, criterion_vs_rest(filtered)?))
        },
    );

    let (mean_by_judge, spread_by_judge, mean_by_round) = aggregates?;
    let (criterion_correlation, judge_consistency) = correlations?;

    Ok(StatViews {
        mean_by_judge,
        spread_by_judge,
        mean_by_round,
        criterion_correlation,
        judge_consistency,
    })
}

fn distinct_str(df: &DataFrame, column_name: &str) -> Result<Vec<String>> {
    let column = df.column(column_name)?.str()?;
    let mut values: Vec<String> = column
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect::<rustc_hash::FxHashSet<_>>()
        .into_iter()
        .collect();
    values.sort();
    Ok(values)
}

fn distinct_rounds(df: &DataFrame) -> Result<Vec<i64>> {
    let column = df.column(COL_ROUND)?.i64()?;
    let mut values: Vec<i64> = column
        .into_iter()
        .flatten()
        .collect::<rustc_hash::FxHashSet<_>>()
        .into_iter()
        .collect();
    values.sort_unstable();
    Ok(values)
}
