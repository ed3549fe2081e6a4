//! Pipeline stages from raw table to normalized long table.
//!
//! Each stage is a pure function over a DataFrame:
//! - Cleaning: drop unusable, duplicate and zero-total rows
//! - Reshaping: unpivot the wide table into one row per criterion score
//! - Normalization: z-scores within each (criterion, judge) cohort

pub mod clean;
pub mod normalize;
pub mod reshape;

pub use clean::clean;
pub use normalize::with_zscores;
pub use reshape::to_long;
