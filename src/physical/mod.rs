//! Physical query kernels
//!
//! Each kernel is a pure function from an input batch (plus parameters) to
//! an output batch. They never modify their input.

pub mod aggregate;
pub mod coerce;
pub mod filter;
pub mod sort;
pub mod stats;

pub use aggregate::{distinct, group_mean};
pub use coerce::{coerce_columns, numeric_column_indices, to_float64, to_numeric};
pub use filter::{column_by_name, filter_bucket, filter_eq, Constraint, RuntimeBucket};
pub use sort::top_n;
pub use stats::{correlation, describe, pearson, percentile, ColumnSummary, CorrelationMatrix};
