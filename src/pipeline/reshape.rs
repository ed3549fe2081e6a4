//! Wide-to-long reshaping.
//!
//! Unpivots the cleaned table into one row per (performance, criterion)
//! observation. Identity columns are carried through unchanged; a criterion
//! that is missing for a row still produces an observation with a null
//! score, so partially-missing performances stay visible downstream.

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::schema::{TableSchema, COL_CRITERION, COL_JUDGE, COL_ROUND, COL_SCORE, COL_SPINNER};

/// Unpivot a cleaned wide table into the long observation table.
///
/// The output has exactly `cleaned.height() * schema.criteria.len()` rows,
/// in row-major order: all criteria of the first performance, then all
/// criteria of the second, and so on.
pub fn to_long(cleaned: &DataFrame, schema: &TableSchema) -> Result<DataFrame> {
    let spinner = cleaned.column(COL_SPINNER)?.str()?;
    let round = cleaned.column(COL_ROUND)?.i64()?;
    let judge = cleaned.column(COL_JUDGE)?.str()?;

    let mut criterion_cols = Vec::with_capacity(schema.criteria.len());
    for name in &schema.criteria {
        let scores = cleaned
            .column(name)
            .with_context(|| format!("criterion column '{name}' missing from cleaned table"))?
            .f64()?;
        criterion_cols.push((name.as_str(), scores));
    }

    let capacity = cleaned.height() * criterion_cols.len();
    let mut spinners: Vec<Option<String>> = Vec::with_capacity(capacity);
    let mut rounds: Vec<Option<i64>> = Vec::with_capacity(capacity);
    let mut judges: Vec<Option<String>> = Vec::with_capacity(capacity);
    let mut criteria: Vec<String> = Vec::with_capacity(capacity);
    let mut scores: Vec<Option<f64>> = Vec::with_capacity(capacity);

    for idx in 0..cleaned.height() {
        let spinner_value = spinner.get(idx).map(str::to_string);
        let round_value = round.get(idx);
        let judge_value = judge.get(idx).map(str::to_string);

        for (name, values) in &criterion_cols {
            spinners.push(spinner_value.clone());
            rounds.push(round_value);
            judges.push(judge_value.clone());
            criteria.push((*name).to_string());
            scores.push(values.get(idx));
        }
    }

    df![
        COL_SPINNER => spinners,
        COL_ROUND => rounds,
        COL_JUDGE => judges,
        COL_CRITERION => criteria,
        COL_SCORE => scores,
    ]
    .context("failed to build long observation table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::COL_TOTAL;

    fn cleaned_fixture() -> (DataFrame, TableSchema) {
        let df = df![
            COL_SPINNER => &["eso", "vain"],
            COL_ROUND => &[1i64, 2],
            COL_JUDGE => &["A", "B"],
            "Construction" => [Some(7.0f64), Some(8.0)],
            "Execution" => [Some(6.0f64), None],
            COL_TOTAL => &[13.0f64, 8.0],
        ]
        .unwrap();

        let schema = TableSchema {
            criteria: vec!["Construction".to_string(), "Execution".to_string()],
        };
        (df, schema)
    }

    #[test]
    fn emits_one_observation_per_row_and_criterion() {
        let (df, schema) = cleaned_fixture();
        let long = to_long(&df, &schema).unwrap();

        assert_eq!(long.height(), df.height() * schema.criteria.len());
        let criteria: Vec<Option<&str>> = long
            .column(COL_CRITERION)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(
            criteria,
            vec![
                Some("Construction"),
                Some("Execution"),
                Some("Construction"),
                Some("Execution"),
            ]
        );
    }

    #[test]
    fn missing_scores_survive_as_null_observations() {
        let (df, schema) = cleaned_fixture();
        let long = to_long(&df, &schema).unwrap();

        let scores: Vec<Option<f64>> = long
            .column(COL_SCORE)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(scores, vec![Some(7.0), Some(6.0), Some(8.0), None]);
    }

    #[test]
    fn identity_columns_are_carried_through() {
        let (df, schema) = cleaned_fixture();
        let long = to_long(&df, &schema).unwrap();

        let judges: Vec<Option<&str>> = long
            .column(COL_JUDGE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(judges, vec![Some("A"), Some("A"), Some("B"), Some("B")]);

        let rounds: Vec<Option<i64>> = long
            .column(COL_ROUND)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(rounds, vec![Some(1), Some(1), Some(2), Some(2)]);
    }

    #[test]
    fn empty_input_yields_empty_long_table() {
        let (df, schema) = cleaned_fixture();
        let empty = df.head(Some(0));
        let long = to_long(&empty, &schema).unwrap();
        assert_eq!(long.height(), 0);
        assert_eq!(long.width(), 5);
    }
}
