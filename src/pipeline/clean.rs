//! Row cleaning for validated raw tables.
//!
//! Three ordered filters, each operating on the survivors of the previous
//! one: rows with no criterion score at all, exact duplicate rows, and rows
//! whose judge-assigned total is not positive. Surviving rows keep their
//! relative order. An empty result is valid and flows downstream as-is.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashSet;

use crate::schema::{TableSchema, COL_TOTAL};

/// Run all cleaning steps over a canonicalized raw table.
pub fn clean(raw: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let scored = drop_all_missing(raw, schema)?;
    let deduped = drop_duplicates(&scored)?;
    keep_positive_total(&deduped)
}

/// Drop rows where every criterion value is missing. A row with at least one
/// present score survives, even if the rest of its criteria are null.
fn drop_all_missing(df: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let mut criterion_cols = Vec::with_capacity(schema.criteria.len());
    for name in &schema.criteria {
        let column = df
            .column(name)
            .with_context(|| format!("criterion column '{name}' missing from raw table"))?
            .f64()
            .with_context(|| format!("criterion column '{name}' is not Float64"))?;
        criterion_cols.push(column);
    }

    let mask: BooleanChunked = (0..df.height())
        .map(|idx| criterion_cols.iter().any(|scores| scores.get(idx).is_some()))
        .collect();

    df.filter(&mask).context("failed to drop all-missing rows")
}

/// Drop rows that are exact duplicates of an earlier row, across all
/// columns. The first occurrence is kept.
fn drop_duplicates(df: &DataFrame) -> Result<DataFrame> {
    let columns = df.get_columns();
    let mut seen = FxHashSet::default();
    let mut keep = Vec::with_capacity(df.height());

    for idx in 0..df.height() {
        let mut key = String::new();
        for column in columns {
            let value = column
                .get(idx)
                .context("row index out of bounds while deduplicating")?;
            let _ = write!(key, "{value:?}\u{1f}");
        }
        keep.push(seen.insert(key));
    }

    let mask: BooleanChunked = keep.into_iter().collect();
    df.filter(&mask).context("failed to drop duplicate rows")
}

/// Keep rows with `Total > 0`. A null total does not survive.
fn keep_positive_total(df: &DataFrame) -> Result<DataFrame> {
    let total = df
        .column(COL_TOTAL)?
        .f64()
        .context("Total column is not Float64")?;

    let mask: BooleanChunked = total
        .into_iter()
        .map(|opt| opt.map_or(false, |value| value > 0.0))
        .collect();

    df.filter(&mask).context("failed to filter on Total")
}
