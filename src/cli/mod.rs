//! Command-line presentation
//!
//! Renders batches, records and dashboard responses as table, CSV, JSON or
//! vertical text.

mod output;

pub use output::{OutputFormat, OutputFormatter};
