//! Netflix title table schema

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::sync::Arc;

pub const TITLE: &str = "title";
pub const TYPE: &str = "type";
pub const DESCRIPTION: &str = "description";
pub const RELEASE_YEAR: &str = "release_year";
pub const AGE_CERTIFICATION: &str = "age_certification";
pub const RUNTIME: &str = "runtime";
pub const IMDB_ID: &str = "imdb_id";
pub const IMDB_SCORE: &str = "imdb_score";
pub const IMDB_VOTES: &str = "imdb_votes";

/// Column names in dataset order
pub const TITLE_COLUMNS: &[&str] = &[
    TITLE,
    TYPE,
    DESCRIPTION,
    RELEASE_YEAR,
    AGE_CERTIFICATION,
    RUNTIME,
    IMDB_ID,
    IMDB_SCORE,
    IMDB_VOTES,
];

/// Get the schema of a fully coerced title table
///
/// Every column is nullable: the source may leave any cell empty.
pub fn title_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(TITLE, DataType::Utf8, true),
        Field::new(TYPE, DataType::Utf8, true),
        Field::new(DESCRIPTION, DataType::Utf8, true),
        Field::new(RELEASE_YEAR, DataType::Int64, true),
        Field::new(AGE_CERTIFICATION, DataType::Utf8, true),
        Field::new(RUNTIME, DataType::Int64, true),
        Field::new(IMDB_ID, DataType::Utf8, true),
        Field::new(IMDB_SCORE, DataType::Float64, true),
        Field::new(IMDB_VOTES, DataType::Float64, true),
    ]))
}

/// Columns coerced to numbers when a title CSV is loaded
pub fn numeric_title_columns() -> Vec<(String, DataType)> {
    vec![
        (RELEASE_YEAR.to_string(), DataType::Int64),
        (RUNTIME.to_string(), DataType::Int64),
        (IMDB_SCORE.to_string(), DataType::Float64),
        (IMDB_VOTES.to_string(), DataType::Float64),
    ]
}
