//! Data loading and pipeline assembly.
//!
//! [`TournamentData`] owns the derived tables for one tournament: the
//! cleaned wide table and the normalized long table, plus the resolved
//! schema and the dimension catalog. Built once per raw input and never
//! mutated afterwards; every view derives from these frames on demand.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info};

use crate::filter::DimensionSelection;
use crate::pipeline::{clean, to_long, with_zscores};
use crate::schema::{canonicalize, TableSchema};
use crate::views::{compute_views, DimensionValues, ViewBundle};

/// The derived datasets for one tournament run.
pub struct TournamentData {
    pub schema: TableSchema,
    /// Wide table: one row per judged performance.
    pub cleaned: DataFrame,
    /// Long table: one row per criterion observation, with z-scores.
    pub long: DataFrame,
    /// Distinct dimension values for the selector widgets.
    pub dimensions: DimensionValues,
}

impl TournamentData {
    /// Run the full pipeline over a raw table: validate, canonicalize,
    /// clean, reshape, normalize.
    ///
    /// Validation failure is fatal; everything after it is total. The raw
    /// input is left untouched.
    pub fn from_raw(raw: &DataFrame) -> Result<Self> {
        let schema = TableSchema::resolve(raw)?;
        debug!(criteria = ?schema.criteria, "resolved raw table schema");

        let canonical = canonicalize(raw, &schema)?;
        let cleaned = clean(&canonical, &schema)?;
        info!(
            raw_rows = raw.height(),
            cleaned_rows = cleaned.height(),
            "cleaned raw table"
        );

        let long = with_zscores(&to_long(&cleaned, &schema)?)?;
        info!(observations = long.height(), "built normalized long table");

        let dimensions = DimensionValues::from_long(&long)?;

        Ok(Self {
            schema,
            cleaned,
            long,
            dimensions,
        })
    }

    /// Filtered rows plus the statistical views for one selection.
    pub fn views(&self, selection: &DimensionSelection) -> Result<ViewBundle> {
        compute_views(self, selection)
    }

    /// Read a table from disk; the format follows the file extension
    /// (`.parquet`, anything else is treated as CSV with a header row).
    pub fn read_table(path: &Path) -> Result<DataFrame> {
        match extension(path) {
            Some("parquet") => LazyFrame::scan_parquet(path, Default::default())
                .with_context(|| format!("failed to scan parquet: {}", path.display()))?
                .collect()
                .with_context(|| format!("failed to read parquet: {}", path.display())),
            _ => CsvReadOptions::default()
                .with_has_header(true)
                .try_into_reader_with_file_path(Some(path.to_path_buf()))
                .with_context(|| format!("failed to open CSV: {}", path.display()))?
                .finish()
                .with_context(|| format!("failed to read CSV: {}", path.display())),
        }
    }

    /// Write a table to disk; format follows the file extension as in
    /// [`Self::read_table`].
    pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create output file: {}", path.display()))?;

        match extension(path) {
            Some("parquet") => {
                ParquetWriter::new(file)
                    .finish(df)
                    .with_context(|| format!("failed to write parquet: {}", path.display()))?;
            }
            _ => {
                CsvWriter::new(file)
                    .include_header(true)
                    .finish(df)
                    .with_context(|| format!("failed to write CSV: {}", path.display()))?;
            }
        }
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}
