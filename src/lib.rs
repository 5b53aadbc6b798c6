//! Query engine over Netflix title metadata
//!
//! Loads a semicolon-delimited CSV of titles (name, type, release year, age
//! certification, runtime, IMDB score and votes) into an immutable Arrow
//! table and answers the queries behind an IMDB score dashboard: summary
//! statistics, equality and runtime filters, group means, top-N and
//! correlation.

pub mod cli;
pub mod dashboard;
pub mod error;
pub mod execution;
pub mod physical;
pub mod schema;
pub mod storage;
pub mod value;

// Re-export main types
pub use dashboard::{Dashboard, Request, Response, View};
pub use error::{QueryError, Result};
pub use execution::{QueryEngine, QueryResult, SharedTable, TitleRecord, TitleTable};
pub use physical::{Constraint, CorrelationMatrix, RuntimeBucket};
pub use storage::CsvOptions;
pub use value::ScalarValue;
