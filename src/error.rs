//! Error types for raw-table validation.
//!
//! Schema problems are the only fatal failures in the pipeline. Everything
//! downstream of validation is expressed in the data itself: empty frames
//! for empty results, null cells for statistics that cannot be computed.

use thiserror::Error;

/// Raw input does not have the expected tabular shape.
///
/// Raised before any cleaning or reshaping runs; a failed validation aborts
/// the whole pipeline run.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("column '{column}' has dtype {found}, expected {expected}")]
    WrongDtype {
        column: String,
        found: String,
        expected: &'static str,
    },

    #[error("no criterion columns found (expected at least one float column not named like 'Total')")]
    NoCriterionColumns,
}
