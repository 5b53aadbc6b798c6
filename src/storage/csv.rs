//! Delimited text source for the title table
//!
//! Every column is read as text first so that a malformed number can never
//! fail the load; the configured numeric columns are then coerced, turning
//! unparsable cells into nulls. Empty cells are nulls in every column.

use crate::error::{QueryError, Result};
use crate::physical::coerce::coerce_columns;
use crate::schema::numeric_title_columns;
use arrow::array::{Array, ArrayRef, AsArray, RecordBatch, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default field separator of the title dataset
pub const DEFAULT_DELIMITER: u8 = b';';

/// Default number of rows per decoded batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Options controlling how a title CSV is read
#[derive(Debug, Clone)]
pub struct CsvOptions {
    delimiter: u8,
    batch_size: usize,
    numeric_columns: Vec<(String, DataType)>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            batch_size: DEFAULT_BATCH_SIZE,
            numeric_columns: numeric_title_columns(),
        }
    }
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field separator
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of rows decoded per batch
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replace the set of columns coerced to numbers
    pub fn with_numeric_columns(mut self, columns: Vec<(String, DataType)>) -> Self {
        self.numeric_columns = columns;
        self
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn numeric_columns(&self) -> &[(String, DataType)] {
        &self.numeric_columns
    }
}

/// A title table stored as a delimited text file
pub struct CsvTitleSource {
    path: PathBuf,
    options: CsvOptions,
}

impl fmt::Debug for CsvTitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsvTitleSource")
            .field("path", &self.path)
            .field("delimiter", &(self.options.delimiter as char))
            .finish()
    }
}

impl CsvTitleSource {
    /// Create a source for an existing file
    pub fn try_new(path: impl AsRef<Path>, options: CsvOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(QueryError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path does not exist: {}", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and coerce the whole file into a single batch
    pub fn load(&self) -> Result<RecordBatch> {
        let file = BufReader::new(File::open(&self.path)?);
        let batch = read_csv(file, &self.options)?;
        info!(
            path = %self.path.display(),
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "loaded title table"
        );
        Ok(batch)
    }
}

/// Read delimited text with a header row into a single coerced batch
pub fn read_csv<R: Read + Seek>(mut reader: R, options: &CsvOptions) -> Result<RecordBatch> {
    let format = Format::default()
        .with_header(true)
        .with_delimiter(options.delimiter);
    let (inferred, _) = format.infer_schema(&mut reader, Some(0))?;
    if inferred.fields().is_empty() {
        return Err(QueryError::Load("missing header row".to_string()));
    }
    let schema = text_schema(&inferred);
    reader.rewind()?;

    let csv = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(options.batch_size)
        .build(reader)?;
    let batches = csv.collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(batches = batches.len(), "decoded csv batches");

    let batch = arrow::compute::concat_batches(&schema, &batches)?;
    let batch = empty_strings_to_null(&batch)?;
    coerce_columns(&batch, &options.numeric_columns)
}

/// The header's column names, all typed as nullable text
fn text_schema(header: &Schema) -> SchemaRef {
    let fields: Vec<Field> = header
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), DataType::Utf8, true))
        .collect();
    Arc::new(Schema::new(fields))
}

fn empty_strings_to_null(batch: &RecordBatch) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| {
            if col.data_type() != &DataType::Utf8 {
                return col.clone();
            }
            let cleaned: StringArray = col
                .as_string::<i32>()
                .iter()
                .map(|v| v.filter(|s| !s.is_empty()))
                .collect();
            Arc::new(cleaned) as ArrayRef
        })
        .collect();
    RecordBatch::try_new(batch.schema(), columns).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::Float64Type;
    use std::io::Cursor;

    const SAMPLE: &str = "title;type;description;release_year;age_certification;runtime;imdb_id;imdb_score;imdb_votes
Dark;Show;A missing child;2017;TV-MA;60;tt5753856;8.8;384700
Okja;Movie;A girl and her pig;2017;;121;tt3967856;N/A;
Mindhunter;Show;\"Agents; profilers\";2017;TV-MA;;tt5290382;8.6;264000
";

    #[test]
    fn test_read_semicolon_csv() {
        let batch = read_csv(Cursor::new(SAMPLE), &CsvOptions::default()).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 9);

        let schema = batch.schema();
        assert_eq!(schema.field_with_name("title").unwrap().data_type(), &DataType::Utf8);
        assert_eq!(schema.field_with_name("runtime").unwrap().data_type(), &DataType::Int64);
        assert_eq!(schema.field_with_name("imdb_score").unwrap().data_type(), &DataType::Float64);
    }

    #[test]
    fn test_malformed_and_empty_cells_are_null() {
        let batch = read_csv(Cursor::new(SAMPLE), &CsvOptions::default()).unwrap();

        let score = batch.column_by_name("imdb_score").unwrap().as_primitive::<Float64Type>();
        assert_eq!(score.value(0), 8.8);
        assert!(score.is_null(1));

        assert!(batch.column_by_name("imdb_votes").unwrap().is_null(1));
        assert!(batch.column_by_name("age_certification").unwrap().is_null(1));
        assert!(batch.column_by_name("runtime").unwrap().is_null(2));
    }

    #[test]
    fn test_quoted_delimiter() {
        let batch = read_csv(Cursor::new(SAMPLE), &CsvOptions::default()).unwrap();
        let desc = batch.column_by_name("description").unwrap().as_string::<i32>();
        assert_eq!(desc.value(2), "Agents; profilers");
    }

    #[test]
    fn test_custom_delimiter_and_columns() {
        let data = "name,score\nx,1.5\ny,oops\n";
        let options = CsvOptions::new()
            .with_delimiter(b',')
            .with_numeric_columns(vec![("score".to_string(), DataType::Float64)]);
        let batch = read_csv(Cursor::new(data), &options).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(1).null_count(), 1);
    }

    #[test]
    fn test_empty_input_is_load_error() {
        let err = read_csv(Cursor::new(""), &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, QueryError::Load(_) | QueryError::Arrow(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvTitleSource::try_new("/definitely/not/here.csv", CsvOptions::default())
            .unwrap_err();
        assert!(matches!(err, QueryError::Io(_)));
    }
}
