//! Query engine - main entry point for querying the title table

use crate::error::Result;
use crate::execution::record::TitleRecord;
use crate::execution::table::TitleTable;
use crate::physical::{self, Constraint, CorrelationMatrix, RuntimeBucket};
use crate::schema;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Query execution result
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Output schema
    pub schema: SchemaRef,
    /// Result rows
    pub batch: RecordBatch,
    /// Total row count
    pub row_count: usize,
    /// Time spent executing
    pub execute_time: Duration,
}

impl QueryResult {
    fn new(batch: RecordBatch, execute_time: Duration) -> Self {
        Self {
            schema: batch.schema(),
            row_count: batch.num_rows(),
            batch,
            execute_time,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Typed record for every row
    pub fn records(&self) -> Result<Vec<TitleRecord>> {
        (0..self.row_count)
            .map(|row| TitleRecord::from_batch(&self.batch, row))
            .collect()
    }
}

/// Read-only query engine over one shared table
///
/// Every query is a pure function of the table and its parameters. Cloning
/// the engine only clones the `Arc`.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    table: Arc<TitleTable>,
}

impl QueryEngine {
    pub fn new(table: Arc<TitleTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<TitleTable> {
        &self.table
    }

    pub fn schema(&self) -> SchemaRef {
        self.table.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    pub fn numeric_columns(&self) -> Vec<String> {
        self.table.numeric_columns()
    }

    fn run<F>(&self, query: &str, f: F) -> Result<QueryResult>
    where
        F: FnOnce(&RecordBatch) -> Result<RecordBatch>,
    {
        let start = Instant::now();
        let batch = f(self.table.batch())?;
        let result = QueryResult::new(batch, start.elapsed());
        debug!(
            query,
            rows = result.row_count,
            elapsed_us = result.execute_time.as_micros() as u64,
            "query executed"
        );
        Ok(result)
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Result<QueryResult> {
        self.run("head", |batch| {
            Ok(batch.slice(0, n.min(batch.num_rows())))
        })
    }

    /// count / mean / std / min / quartiles / max of every numeric column
    pub fn describe(&self) -> Result<QueryResult> {
        self.run("describe", physical::describe)
    }

    /// Rows matching every `column = value` constraint
    pub fn filter_eq(&self, constraints: &[Constraint]) -> Result<QueryResult> {
        self.run("filter_eq", |batch| physical::filter_eq(batch, constraints))
    }

    /// Rows whose runtime falls in `bucket`
    pub fn filter_runtime(&self, bucket: RuntimeBucket) -> Result<QueryResult> {
        self.run("filter_runtime", |batch| {
            physical::filter_bucket(batch, schema::RUNTIME, bucket)
        })
    }

    /// Mean of `value_column` per distinct value of `group_column`
    pub fn group_mean(&self, group_column: &str, value_column: &str) -> Result<QueryResult> {
        self.run("group_mean", |batch| {
            physical::group_mean(batch, group_column, value_column)
        })
    }

    /// The `n` rows with the largest `column`, largest first
    pub fn top_n(&self, column: &str, n: usize) -> Result<QueryResult> {
        self.run("top_n", |batch| physical::top_n(batch, column, n))
    }

    /// Distinct non-missing values of a column, in first-seen order
    pub fn distinct_values(&self, column: &str) -> Result<QueryResult> {
        self.run("distinct", |batch| physical::distinct(batch, column))
    }

    /// First row matching the constraints, as a one-row batch
    ///
    /// Zero matches is `Ok(None)`, not an error.
    pub fn lookup(&self, constraints: &[Constraint]) -> Result<Option<RecordBatch>> {
        let matches = self.filter_eq(constraints)?;
        Ok((!matches.is_empty()).then(|| matches.batch.slice(0, 1)))
    }

    /// First row matching the constraints, as a typed record
    pub fn lookup_record(&self, constraints: &[Constraint]) -> Result<Option<TitleRecord>> {
        self.lookup(constraints)?
            .map(|row| TitleRecord::from_batch(&row, 0))
            .transpose()
    }

    /// Details of the first title with the given name
    pub fn title_info(&self, title: &str) -> Result<Option<TitleRecord>> {
        self.lookup_record(&[Constraint::new(schema::TITLE, title)])
    }

    /// The most voted title of a release year and type
    pub fn most_voted(&self, release_year: i64, kind: &str) -> Result<Option<TitleRecord>> {
        let candidates = self.filter_eq(&[
            Constraint::new(schema::RELEASE_YEAR, release_year),
            Constraint::new(schema::TYPE, kind),
        ])?;
        let best = physical::top_n(&candidates.batch, schema::IMDB_VOTES, 1)?;
        if best.num_rows() == 0 {
            return Ok(None);
        }
        TitleRecord::from_batch(&best, 0).map(Some)
    }

    /// Pearson correlation between every pair of numeric columns
    pub fn correlation(&self) -> Result<CorrelationMatrix> {
        let start = Instant::now();
        let matrix = physical::correlation(self.table.batch())?;
        debug!(
            query = "correlation",
            columns = matrix.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "query executed"
        );
        Ok(matrix)
    }
}
