//! Typed view of a single title row

use crate::error::{QueryError, Result};
use crate::physical::coerce::to_numeric;
use crate::schema;
use arrow::array::{Array, AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One title, with every field optional
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub age_certification: Option<String>,
    pub runtime: Option<i64>,
    pub imdb_id: Option<String>,
    pub imdb_score: Option<f64>,
    pub imdb_votes: Option<f64>,
}

impl TitleRecord {
    /// Read row `row` of a batch; columns the batch lacks are left empty
    pub fn from_batch(batch: &RecordBatch, row: usize) -> Result<Self> {
        if row >= batch.num_rows() {
            return Err(QueryError::InvalidArgument(format!(
                "row {} out of range for {} rows",
                row,
                batch.num_rows()
            )));
        }
        let one = batch.slice(row, 1);

        Ok(Self {
            title: text(&one, schema::TITLE)?,
            kind: text(&one, schema::TYPE)?,
            description: text(&one, schema::DESCRIPTION)?,
            release_year: integer(&one, schema::RELEASE_YEAR)?,
            age_certification: text(&one, schema::AGE_CERTIFICATION)?,
            runtime: integer(&one, schema::RUNTIME)?,
            imdb_id: text(&one, schema::IMDB_ID)?,
            imdb_score: float(&one, schema::IMDB_SCORE)?,
            imdb_votes: float(&one, schema::IMDB_VOTES)?,
        })
    }
}

fn text(one: &RecordBatch, name: &str) -> Result<Option<String>> {
    let Some(col) = one.column_by_name(name) else {
        return Ok(None);
    };
    let col = cast(col, &DataType::Utf8)?;
    let col = col.as_string::<i32>();
    Ok(col.is_valid(0).then(|| col.value(0).to_string()))
}

fn integer(one: &RecordBatch, name: &str) -> Result<Option<i64>> {
    let Some(col) = one.column_by_name(name) else {
        return Ok(None);
    };
    let col = to_numeric(col, &DataType::Int64)?;
    let col = col.as_primitive::<Int64Type>();
    Ok(col.is_valid(0).then(|| col.value(0)))
}

fn float(one: &RecordBatch, name: &str) -> Result<Option<f64>> {
    let Some(col) = one.column_by_name(name) else {
        return Ok(None);
    };
    let col = to_numeric(col, &DataType::Float64)?;
    let col = col.as_primitive::<Float64Type>();
    Ok(col.is_valid(0).then(|| col.value(0)))
}

fn or_dash<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for TitleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title: {}", or_dash(&self.title))?;
        writeln!(f, "Type: {}", or_dash(&self.kind))?;
        writeln!(f, "Description: {}", or_dash(&self.description))?;
        writeln!(f, "Release year: {}", or_dash(&self.release_year))?;
        writeln!(f, "Age certification: {}", or_dash(&self.age_certification))?;
        match self.runtime {
            Some(minutes) => writeln!(f, "Runtime: {} minutes", minutes)?,
            None => writeln!(f, "Runtime: -")?,
        }
        writeln!(f, "IMDB id: {}", or_dash(&self.imdb_id))?;
        writeln!(f, "IMDB score: {}", or_dash(&self.imdb_score))?;
        write!(f, "IMDB votes: {}", or_dash(&self.imdb_votes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn create_test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, true),
            Field::new("type", DataType::Utf8, true),
            Field::new("release_year", DataType::Int64, true),
            Field::new("runtime", DataType::Int64, true),
            Field::new("imdb_score", DataType::Float64, true),
            Field::new("imdb_votes", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Dark", "Okja"])),
                Arc::new(StringArray::from(vec!["Show", "Movie"])),
                Arc::new(Int64Array::from(vec![2017, 2017])),
                Arc::new(Int64Array::from(vec![Some(60), None])),
                Arc::new(Float64Array::from(vec![Some(8.8), None])),
                Arc::new(StringArray::from(vec!["384700", "N/A"])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_batch() {
        let batch = create_test_batch();
        let record = TitleRecord::from_batch(&batch, 0).unwrap();

        assert_eq!(record.title.as_deref(), Some("Dark"));
        assert_eq!(record.kind.as_deref(), Some("Show"));
        assert_eq!(record.release_year, Some(2017));
        assert_eq!(record.runtime, Some(60));
        assert_eq!(record.imdb_score, Some(8.8));
        assert_eq!(record.imdb_votes, Some(384700.0));
        // absent columns
        assert_eq!(record.description, None);
        assert_eq!(record.imdb_id, None);
    }

    #[test]
    fn test_missing_cells() {
        let batch = create_test_batch();
        let record = TitleRecord::from_batch(&batch, 1).unwrap();
        assert_eq!(record.runtime, None);
        assert_eq!(record.imdb_score, None);
        assert_eq!(record.imdb_votes, None);
    }

    #[test]
    fn test_row_out_of_range() {
        let batch = create_test_batch();
        assert!(TitleRecord::from_batch(&batch, 2).is_err());
    }

    #[test]
    fn test_display_and_serde() {
        let batch = create_test_batch();
        let record = TitleRecord::from_batch(&batch, 0).unwrap();
        let text = record.to_string();
        assert!(text.contains("Runtime: 60 minutes"));
        assert!(text.contains("Description: -"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "Show");
        assert_eq!(json["release_year"], 2017);
    }
}
