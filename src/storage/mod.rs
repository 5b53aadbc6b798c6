//! Storage sources for the title table
//!
//! Loading is kept apart from querying: a source produces one immutable,
//! already-coerced `RecordBatch`, which the execution layer wraps.

mod csv;

pub use csv::{read_csv, CsvOptions, CsvTitleSource, DEFAULT_BATCH_SIZE, DEFAULT_DELIMITER};
