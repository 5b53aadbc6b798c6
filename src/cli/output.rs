//! Output formatting for query results
//!
//! Supports multiple output formats:
//! - Table: Pretty-printed ASCII table (default)
//! - CSV: Comma-separated values
//! - JSON: JSON array of objects
//! - Vertical: One column per line (useful for wide title rows)

use crate::dashboard::Response;
use crate::execution::TitleRecord;
use crate::schema::title_schema;
use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use clap::ValueEnum;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed ASCII table
    #[default]
    Table,
    /// Comma-separated values
    Csv,
    /// JSON array of objects
    Json,
    /// Vertical format (one column per line)
    Vertical,
}

impl OutputFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Vertical => "vertical",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "t" => Ok(Self::Table),
            "csv" | "c" => Ok(Self::Csv),
            "json" | "j" => Ok(Self::Json),
            "vertical" | "v" => Ok(Self::Vertical),
            other => Err(format!("unknown output format: {}", other)),
        }
    }
}

fn to_io(e: ArrowError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Formatter for outputting query results in various formats
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    format: OutputFormat,
    max_rows: Option<usize>,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            max_rows: None,
        }
    }

    /// Set maximum rows to display
    pub fn with_max_rows(mut self, max: usize) -> Self {
        self.max_rows = Some(max);
        self
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format record batches and write to the given writer
    pub fn write<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let limited = self.limit(batches);
        match self.format {
            OutputFormat::Table => self.write_table(writer, &limited, total_rows(batches)),
            OutputFormat::Csv => self.write_csv(writer, &limited),
            OutputFormat::Json => self.write_json(writer, &limited),
            OutputFormat::Vertical => self.write_vertical(writer, &limited),
        }
    }

    /// Format as string
    pub fn format_to_string(&self, batches: &[RecordBatch]) -> String {
        let mut buffer = Vec::new();
        let _ = self.write(&mut buffer, batches);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Render a dashboard response
    pub fn write_response<W: Write>(&self, writer: &mut W, response: &Response) -> io::Result<()> {
        match response {
            Response::Table { caption, result } => {
                if self.format == OutputFormat::Table {
                    writeln!(writer, "{}", caption)?;
                }
                self.write(writer, std::slice::from_ref(&result.batch))?;
                if self.format == OutputFormat::Table {
                    writeln!(writer, "({} rows)", result.row_count)?;
                }
                Ok(())
            }
            Response::Summary { head, stats } => {
                self.write(writer, std::slice::from_ref(&head.batch))?;
                if self.format != OutputFormat::Json {
                    writeln!(writer)?;
                }
                self.write(writer, std::slice::from_ref(&stats.batch))
            }
            Response::Record { caption, record } => match record {
                Some(record) => self.write_record(writer, record),
                None => writeln!(writer, "No title named '{}'", caption),
            },
            Response::Matrix(matrix) => {
                let batch = matrix.to_record_batch().map_err(|e| {
                    io::Error::new(io::ErrorKind::Other, e.to_string())
                })?;
                self.write(writer, &[batch])
            }
            Response::Warning(message) => writeln!(writer, "warning: {}", message),
        }
    }

    /// Render a single title
    pub fn write_record<W: Write>(&self, writer: &mut W, record: &TitleRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::Table | OutputFormat::Vertical => writeln!(writer, "{}", record),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, std::slice::from_ref(record))?;
                writeln!(writer)
            }
            OutputFormat::Csv => {
                let batch = record_batch_of(record).map_err(to_io)?;
                self.write(writer, &[batch])
            }
        }
    }

    fn limit(&self, batches: &[RecordBatch]) -> Vec<RecordBatch> {
        let Some(max) = self.max_rows else {
            return batches.to_vec();
        };
        let mut remaining = max;
        let mut out = Vec::new();
        for batch in batches {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(batch.num_rows());
            out.push(batch.slice(0, take));
            remaining -= take;
        }
        out
    }

    fn write_table<W: Write>(
        &self,
        writer: &mut W,
        batches: &[RecordBatch],
        total: usize,
    ) -> io::Result<()> {
        if batches.is_empty() {
            return Ok(());
        }

        let display = arrow::util::pretty::pretty_format_batches(batches).map_err(to_io)?;
        writeln!(writer, "{}", display)?;

        let shown = total_rows(batches);
        if shown < total {
            writeln!(writer, "... ({} more rows)", total - shown)?;
        }
        Ok(())
    }

    fn write_csv<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        if batches.is_empty() {
            return Ok(());
        }

        let mut csv = WriterBuilder::new().with_header(true).build(&mut *writer);
        for batch in batches {
            csv.write(batch).map_err(to_io)?;
        }
        Ok(())
    }

    fn write_json<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let Some(first) = batches.first() else {
            writeln!(writer, "[]")?;
            return Ok(());
        };

        let schema = first.schema();
        writeln!(writer, "[")?;

        let mut first_row = true;
        for batch in batches {
            let formatters = formatters(batch).map_err(to_io)?;
            for row in 0..batch.num_rows() {
                if !first_row {
                    writeln!(writer, ",")?;
                }
                first_row = false;

                write!(writer, "  {{")?;
                for (col, field) in schema.fields().iter().enumerate() {
                    if col > 0 {
                        write!(writer, ", ")?;
                    }
                    let value = json_value(batch.column(col), &formatters[col], row);
                    write!(writer, "{}: {}", json_string(field.name()), value)?;
                }
                write!(writer, "}}")?;
            }
        }

        writeln!(writer, "\n]")?;
        Ok(())
    }

    fn write_vertical<W: Write>(&self, writer: &mut W, batches: &[RecordBatch]) -> io::Result<()> {
        let Some(first) = batches.first() else {
            return Ok(());
        };

        let schema = first.schema();
        let width = schema.fields().iter().map(|f| f.name().len()).max().unwrap_or(0);

        let mut row_number = 0;
        for batch in batches {
            let formatters = formatters(batch).map_err(to_io)?;
            for row in 0..batch.num_rows() {
                row_number += 1;
                writeln!(writer, "*************************** {} ***************************", row_number)?;
                for (col, field) in schema.fields().iter().enumerate() {
                    let value = if batch.column(col).is_null(row) {
                        "NULL".to_string()
                    } else {
                        formatters[col].value(row).to_string()
                    };
                    writeln!(writer, "{:>width$}: {}", field.name(), value, width = width)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

fn total_rows(batches: &[RecordBatch]) -> usize {
    batches.iter().map(|b| b.num_rows()).sum()
}

fn formatters(batch: &RecordBatch) -> Result<Vec<ArrayFormatter<'_>>, ArrowError> {
    let options = FormatOptions::default();
    batch
        .columns()
        .iter()
        .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
        .collect()
}

fn json_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn json_value(array: &ArrayRef, formatter: &ArrayFormatter<'_>, row: usize) -> String {
    if array.is_null(row) {
        return "null".to_string();
    }
    let text = formatter.value(row).to_string();
    match array.data_type() {
        DataType::Boolean => text,
        // NaN and infinities are not valid JSON numbers
        DataType::Float32 | DataType::Float64 if text.parse::<f64>().map_or(true, |v| !v.is_finite()) => {
            "null".to_string()
        }
        dt if dt.is_numeric() => text,
        _ => json_string(&text),
    }
}

fn record_batch_of(record: &TitleRecord) -> Result<RecordBatch, ArrowError> {
    let text = |v: &Option<String>| -> ArrayRef { Arc::new(StringArray::from(vec![v.clone()])) };
    let columns: Vec<ArrayRef> = vec![
        text(&record.title),
        text(&record.kind),
        text(&record.description),
        Arc::new(Int64Array::from(vec![record.release_year])),
        text(&record.age_certification),
        Arc::new(Int64Array::from(vec![record.runtime])),
        text(&record.imdb_id),
        Arc::new(Float64Array::from(vec![record.imdb_score])),
        Arc::new(Float64Array::from(vec![record.imdb_votes])),
    ];
    RecordBatch::try_new(title_schema(), columns)
}
