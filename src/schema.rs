//! Raw-table schema resolution.
//!
//! Validates the shape of an incoming scoring table and discovers the
//! criterion columns once, up front. Every later stage receives the resolved
//! [`TableSchema`] instead of re-inferring column roles from names.

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::error::SchemaError;

pub const COL_SPINNER: &str = "Spinner";
pub const COL_ROUND: &str = "Round";
pub const COL_JUDGE: &str = "Judge";
pub const COL_TOTAL: &str = "Total";
pub const COL_CRITERION: &str = "Criterion";
pub const COL_SCORE: &str = "Score";
pub const COL_ZSCORE: &str = "ZScore";

/// Identity columns carried unchanged through every reshaping step.
pub const IDENTITY_COLUMNS: [&str; 3] = [COL_SPINNER, COL_ROUND, COL_JUDGE];

/// Resolved column roles for one raw scoring table.
///
/// Criterion columns are the float columns whose name does not contain
/// "Total", in frame order. The judge-assigned total lives in the fixed
/// `Total` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub criteria: Vec<String>,
}

impl TableSchema {
    /// Validate a raw table and discover its criterion columns.
    ///
    /// # Errors
    /// Returns [`SchemaError`] if:
    /// - `Spinner`, `Round`, `Judge` or `Total` is missing
    /// - `Spinner`/`Judge` are not string columns
    /// - `Round` is not an integer column, or `Total` not a float column
    /// - no criterion column exists
    pub fn resolve(df: &DataFrame) -> Result<Self, SchemaError> {
        for name in IDENTITY_COLUMNS {
            if df.column(name).is_err() {
                return Err(SchemaError::MissingColumn(name.to_string()));
            }
        }

        for name in [COL_SPINNER, COL_JUDGE] {
            let dtype = column_dtype(df, name)?;
            if !matches!(dtype, DataType::String) {
                return Err(SchemaError::WrongDtype {
                    column: name.to_string(),
                    found: dtype.to_string(),
                    expected: "str",
                });
            }
        }

        let round_dtype = column_dtype(df, COL_ROUND)?;
        if !is_integer(round_dtype) {
            return Err(SchemaError::WrongDtype {
                column: COL_ROUND.to_string(),
                found: round_dtype.to_string(),
                expected: "integer",
            });
        }

        let total_dtype = column_dtype(df, COL_TOTAL)?;
        if !is_float(total_dtype) {
            return Err(SchemaError::WrongDtype {
                column: COL_TOTAL.to_string(),
                found: total_dtype.to_string(),
                expected: "float",
            });
        }

        let criteria: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|column| is_float(column.dtype()) && !column.name().contains("Total"))
            .map(|column| column.name().to_string())
            .collect();

        if criteria.is_empty() {
            return Err(SchemaError::NoCriterionColumns);
        }

        Ok(Self { criteria })
    }
}

fn column_dtype<'a>(df: &'a DataFrame, name: &str) -> Result<&'a DataType, SchemaError> {
    df.column(name)
        .map(|column| column.dtype())
        .map_err(|_| SchemaError::MissingColumn(name.to_string()))
}

fn is_integer(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn is_float(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Cast a validated table to the canonical dtypes the pipeline works with:
/// `Round` as Int64, `Total` and every criterion as Float64.
pub fn canonicalize(df: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let mut casts = vec![
        col(COL_ROUND).cast(DataType::Int64),
        col(COL_TOTAL).cast(DataType::Float64),
    ];
    for name in &schema.criteria {
        casts.push(col(name.as_str()).cast(DataType::Float64));
    }

    df.clone()
        .lazy()
        .with_columns(casts)
        .collect()
        .context("failed to cast raw table to canonical dtypes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_fixture() -> DataFrame {
        df![
            COL_SPINNER => &["eso", "vain"],
            COL_ROUND => &[1i64, 1],
            COL_JUDGE => &["A", "A"],
            "Construction" => &[7.5f64, 8.0],
            "Execution" => &[6.0f64, 9.0],
            COL_TOTAL => &[13.5f64, 17.0],
        ]
        .unwrap()
    }

    #[test]
    fn resolves_criteria_in_frame_order() {
        let schema = TableSchema::resolve(&raw_fixture()).unwrap();
        assert_eq!(schema.criteria, vec!["Construction", "Execution"]);
    }

    #[test]
    fn total_like_columns_are_not_criteria() {
        let mut df = raw_fixture();
        df.with_column(Series::new("Weighted Total".into(), &[20.0f64, 21.0]))
            .unwrap();

        let schema = TableSchema::resolve(&df).unwrap();
        assert_eq!(schema.criteria, vec!["Construction", "Execution"]);
    }

    #[test]
    fn missing_identity_column_is_rejected() {
        let df = raw_fixture().drop(COL_JUDGE).unwrap();
        let err = TableSchema::resolve(&df).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(name) if name == COL_JUDGE));
    }

    #[test]
    fn non_integer_round_is_rejected() {
        let df = df![
            COL_SPINNER => &["eso"],
            COL_ROUND => &["one"],
            COL_JUDGE => &["A"],
            "Construction" => &[7.5f64],
            COL_TOTAL => &[7.5f64],
        ]
        .unwrap();

        let err = TableSchema::resolve(&df).unwrap_err();
        assert!(matches!(err, SchemaError::WrongDtype { column, .. } if column == COL_ROUND));
    }

    #[test]
    fn table_without_criteria_is_rejected() {
        let df = df![
            COL_SPINNER => &["eso"],
            COL_ROUND => &[1i64],
            COL_JUDGE => &["A"],
            COL_TOTAL => &[7.5f64],
        ]
        .unwrap();

        let err = TableSchema::resolve(&df).unwrap_err();
        assert!(matches!(err, SchemaError::NoCriterionColumns));
    }

    #[test]
    fn canonicalize_normalizes_dtypes() {
        let df = df![
            COL_SPINNER => &["eso"],
            COL_ROUND => &[1i32],
            COL_JUDGE => &["A"],
            "Construction" => &[7.5f32],
            COL_TOTAL => &[7.5f64],
        ]
        .unwrap();

        let schema = TableSchema::resolve(&df).unwrap();
        let canonical = canonicalize(&df, &schema).unwrap();

        assert_eq!(canonical.column(COL_ROUND).unwrap().dtype(), &DataType::Int64);
        assert_eq!(
            canonical.column("Construction").unwrap().dtype(),
            &DataType::Float64
        );
    }
}
