//! The immutable title table and its one-time loader

use crate::error::Result;
use crate::physical::coerce::numeric_column_indices;
use crate::physical::filter::column_by_name;
use crate::storage::{CsvOptions, CsvTitleSource};
use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::SchemaRef;
use once_cell::sync::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Read-only in-memory table
///
/// Holds a single batch. There is no mutable access: every query produces
/// new batches and leaves this one untouched, so a `TitleTable` behind an
/// `Arc` can be shared across threads without locking.
#[derive(Debug, Clone)]
pub struct TitleTable {
    batch: RecordBatch,
}

impl TitleTable {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Build a table from several batches sharing one schema
    pub fn try_from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = arrow::compute::concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }

    /// Load a title CSV from disk
    pub fn from_csv(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let source = CsvTitleSource::try_new(path, options)?;
        Ok(Self::new(source.load()?))
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    /// Get a column, failing with `MissingColumn` when absent
    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        column_by_name(&self.batch, name)
    }

    /// Names of the columns holding numbers
    pub fn numeric_columns(&self) -> Vec<String> {
        let schema = self.batch.schema();
        numeric_column_indices(&schema)
            .into_iter()
            .map(|i| schema.field(i).name().clone())
            .collect()
    }
}

impl From<RecordBatch> for TitleTable {
    fn from(batch: RecordBatch) -> Self {
        Self::new(batch)
    }
}

type Loader = Box<dyn Fn() -> Result<TitleTable> + Send + Sync>;

/// Lazily loaded, memoized title table
///
/// The loader runs at most once successfully: concurrent first calls block
/// until one of them has stored the table, and every later call returns the
/// same `Arc`. A failed load stores nothing, so the next call tries again.
pub struct SharedTable {
    origin: String,
    loader: Loader,
    cell: OnceCell<Arc<TitleTable>>,
}

impl fmt::Debug for SharedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTable")
            .field("origin", &self.origin)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl SharedTable {
    /// Memoize an arbitrary loader
    pub fn with_loader<F>(origin: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<TitleTable> + Send + Sync + 'static,
    {
        Self {
            origin: origin.into(),
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    /// Memoize loading a CSV file
    pub fn from_csv(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        let path = path.into();
        let origin = path.display().to_string();
        Self::with_loader(origin, move || TitleTable::from_csv(&path, options.clone()))
    }

    /// Wrap an already loaded table
    pub fn ready(table: TitleTable) -> Self {
        let shared = Self::with_loader("memory", || {
            Err(crate::error::QueryError::Load(
                "in-memory table cannot be reloaded".to_string(),
            ))
        });
        // A fresh cell cannot already be set
        let _ = shared.cell.set(Arc::new(table));
        shared
    }

    /// The table, loading it on first use
    pub fn get(&self) -> Result<Arc<TitleTable>> {
        self.cell
            .get_or_try_init(|| {
                info!(origin = %self.origin, "loading title table");
                (self.loader)().map(Arc::new)
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}
