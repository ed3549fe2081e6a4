//! Tournament scoring analytics pipeline.
//!
//! Turns raw judged-scoring tables from a multi-round, multi-judge
//! competition into validated, reshaped and statistically derived views:
//! - `schema`: shape validation and criterion-column discovery
//! - `pipeline/`: cleaning, wide-to-long reshaping, z-score normalization
//! - `filter`: the dimension-selection predicate every view applies
//! - `stats/`: grouped aggregates and correlation matrices
//! - `views`: the query interface the dashboard calls per selection change
//!
//! All components are pure functions over in-memory Polars frames; the only
//! fatal failure is schema validation, everything else is expressed in the
//! output data (empty frames, null cells).

pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod views;

// Re-export commonly used types
pub use data::TournamentData;
pub use error::SchemaError;
pub use filter::{Dimension, DimensionSelection};
pub use schema::TableSchema;
pub use stats::{Aggregate, CorrelationMatrix, PivotTable};
pub use views::{compute_stats, compute_views, DimensionValues, StatViews, ViewBundle};
