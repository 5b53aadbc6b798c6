//! Row filters: equality constraints and runtime buckets

use crate::error::{QueryError, Result};
use crate::physical::coerce::{to_float64, to_numeric};
use crate::value::ScalarValue;
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, RecordBatch, Scalar};
use arrow::compute::kernels::{boolean, cmp};
use arrow::compute::{can_cast_types, cast, filter_record_batch};
use arrow::datatypes::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `column = value` equality constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub column: String,
    pub value: ScalarValue,
}

impl Constraint {
    pub fn new(column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

/// Runtime ranges, in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeBucket {
    /// runtime < 60
    Short,
    /// 60 <= runtime <= 120
    Typical,
    /// runtime > 120
    Long,
}

impl RuntimeBucket {
    pub const ALL: [RuntimeBucket; 3] = [Self::Short, Self::Typical, Self::Long];

    pub const SHORT_UPPER: f64 = 60.0;
    pub const LONG_LOWER: f64 = 120.0;

    pub fn name(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Typical => "typical",
            Self::Long => "long",
        }
    }

    /// Human readable range, as shown next to the selector
    pub fn label(&self) -> &'static str {
        match self {
            Self::Short => "Short (<60 minutes)",
            Self::Typical => "Typical (60-120 minutes)",
            Self::Long => "Long (>120 minutes)",
        }
    }

    /// Whether a single runtime value falls in this bucket
    pub fn contains(&self, runtime: f64) -> bool {
        match self {
            Self::Short => runtime < Self::SHORT_UPPER,
            Self::Typical => (Self::SHORT_UPPER..=Self::LONG_LOWER).contains(&runtime),
            Self::Long => runtime > Self::LONG_LOWER,
        }
    }

    /// Selection mask over a runtime column; missing runtimes are never selected
    pub fn mask(&self, runtime: &ArrayRef) -> Result<BooleanArray> {
        let values = to_float64(runtime)?;
        let lower = Scalar::new(Float64Array::from(vec![Self::SHORT_UPPER]));
        let upper = Scalar::new(Float64Array::from(vec![Self::LONG_LOWER]));

        let mask = match self {
            Self::Short => cmp::lt(&values, &lower)?,
            Self::Typical => {
                boolean::and(&cmp::gt_eq(&values, &lower)?, &cmp::lt_eq(&values, &upper)?)?
            }
            Self::Long => cmp::gt(&values, &upper)?,
        };
        Ok(mask)
    }
}

impl fmt::Display for RuntimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RuntimeBucket {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "typical" | "common" => Ok(Self::Typical),
            "long" => Ok(Self::Long),
            other => Err(QueryError::InvalidArgument(format!(
                "unknown runtime bucket '{}', expected short, typical or long",
                other
            ))),
        }
    }
}

/// Keep the rows satisfying every constraint
pub fn filter_eq(batch: &RecordBatch, constraints: &[Constraint]) -> Result<RecordBatch> {
    if constraints.is_empty() {
        return Ok(batch.clone());
    }

    let mut combined: Option<BooleanArray> = None;
    for constraint in constraints {
        let column = column_by_name(batch, &constraint.column)?;
        let mask = eq_mask(column, &constraint.value)?;
        combined = Some(match combined {
            Some(prev) => boolean::and(&prev, &mask)?,
            None => mask,
        });
    }

    match combined {
        Some(mask) => filter_record_batch(batch, &mask).map_err(Into::into),
        None => Ok(batch.clone()),
    }
}

/// Keep the rows whose runtime column falls in `bucket`
pub fn filter_bucket(batch: &RecordBatch, column: &str, bucket: RuntimeBucket) -> Result<RecordBatch> {
    let runtime = column_by_name(batch, column)?;
    let mask = bucket.mask(runtime)?;
    filter_record_batch(batch, &mask).map_err(Into::into)
}

/// Look up a column, failing with `MissingColumn` when absent
pub fn column_by_name<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| QueryError::MissingColumn(name.to_string()))
}

fn eq_mask(column: &ArrayRef, value: &ScalarValue) -> Result<BooleanArray> {
    let none = || BooleanArray::from(vec![false; column.len()]);
    let column_type = column.data_type();

    // A null literal equals nothing, and a number never equals text
    if value.is_null() || (is_text(column_type) && !is_text(&value.data_type())) {
        return Ok(none());
    }

    // Compare a fractional literal as a decimal so that it cannot truncate
    // onto an integer
    if let ScalarValue::Float64(v) = value {
        if column_type.is_integer() {
            let values = to_float64(column)?;
            let literal = Float64Array::from(vec![v.0]);
            return cmp::eq(&values, &Scalar::new(literal)).map_err(Into::into);
        }
    }

    let literal = value.to_array(1);
    let literal = if column_type.is_numeric() && is_text(&value.data_type()) {
        to_numeric(&literal, column_type)?
    } else if can_cast_types(&value.data_type(), column_type) {
        cast(&literal, column_type)?
    } else {
        return Ok(none());
    };
    if literal.is_null(0) {
        return Ok(none());
    }
    cmp::eq(column, &Scalar::new(literal)).map_err(Into::into)
}

fn is_text(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{AsArray, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn create_test_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, true),
            Field::new("type", DataType::Utf8, true),
            Field::new("release_year", DataType::Int64, true),
            Field::new("runtime", DataType::Int64, true),
        ]));

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "B", "C", "D", "E"])),
                Arc::new(StringArray::from(vec![
                    Some("Movie"),
                    Some("Show"),
                    Some("Movie"),
                    None,
                    Some("Movie"),
                ])),
                Arc::new(Int64Array::from(vec![2020, 2020, 2019, 2020, 2020])),
                Arc::new(Int64Array::from(vec![Some(59), Some(60), Some(120), Some(121), None])),
            ],
        )
        .unwrap()
    }

    fn titles(batch: &RecordBatch) -> Vec<String> {
        batch
            .column_by_name("title")
            .unwrap()
            .as_string::<i32>()
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_filter_eq_and() {
        let batch = create_test_batch();
        let out = filter_eq(
            &batch,
            &[
                Constraint::new("type", "Movie"),
                Constraint::new("release_year", 2020),
            ],
        )
        .unwrap();
        assert_eq!(titles(&out), vec!["A", "E"]);
    }

    #[test]
    fn test_filter_eq_no_constraints_returns_all() {
        let batch = create_test_batch();
        let out = filter_eq(&batch, &[]).unwrap();
        assert_eq!(out.num_rows(), 5);
    }

    #[test]
    fn test_filter_eq_missing_column() {
        let batch = create_test_batch();
        let err = filter_eq(&batch, &[Constraint::new("genre", "Drama")]).unwrap_err();
        assert!(err.is_missing_column());
    }

    #[test]
    fn test_filter_eq_casts_literal() {
        let batch = create_test_batch();
        // Text literal against an integer column
        let out = filter_eq(&batch, &[Constraint::new("release_year", "2019")]).unwrap();
        assert_eq!(titles(&out), vec!["C"]);

        // Unparsable literal matches nothing instead of failing
        let out = filter_eq(&batch, &[Constraint::new("release_year", "soon")]).unwrap();
        assert_eq!(out.num_rows(), 0);

        // Integral decimal text reads like the loaded column does
        let out = filter_eq(&batch, &[Constraint::new("release_year", "2019.0")]).unwrap();
        assert_eq!(titles(&out), vec!["C"]);
        let out = filter_eq(&batch, &[Constraint::new("release_year", "2019.5")]).unwrap();
        assert_eq!(out.num_rows(), 0);
    }

    #[test]
    fn test_filter_eq_fractional_literal_on_integer_column() {
        let batch = create_test_batch();
        let out = filter_eq(&batch, &[Constraint::new("release_year", 2020.5)]).unwrap();
        assert_eq!(out.num_rows(), 0);

        let out = filter_eq(&batch, &[Constraint::new("release_year", 2019.0)]).unwrap();
        assert_eq!(titles(&out), vec!["C"]);

        let out = filter_eq(&batch, &[Constraint::new("runtime", 59.9)]).unwrap();
        assert_eq!(out.num_rows(), 0);
    }

    #[test]
    fn test_filter_eq_number_never_matches_text() {
        let schema = Arc::new(Schema::new(vec![Field::new("title", DataType::Utf8, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec!["2020", "1917", "Dark"]))],
        )
        .unwrap();

        for value in [ScalarValue::from(2020), ScalarValue::from(1917.0), ScalarValue::from(true)] {
            let out = filter_eq(&batch, &[Constraint::new("title", value)]).unwrap();
            assert_eq!(out.num_rows(), 0);
        }
        let out = filter_eq(&batch, &[Constraint::new("title", "2020")]).unwrap();
        assert_eq!(titles(&out), vec!["2020"]);
    }

    #[test]
    fn test_filter_eq_integer_literal_on_float_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("title", DataType::Utf8, true),
            Field::new("imdb_score", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "B", "C"])),
                Arc::new(Float64Array::from(vec![Some(8.0), Some(8.5), None])),
            ],
        )
        .unwrap();

        let out = filter_eq(&batch, &[Constraint::new("imdb_score", 8)]).unwrap();
        assert_eq!(titles(&out), vec!["A"]);
        let out = filter_eq(&batch, &[Constraint::new("imdb_score", "8.5")]).unwrap();
        assert_eq!(titles(&out), vec!["B"]);
    }

    #[test]
    fn test_filter_eq_null_never_matches() {
        let batch = create_test_batch();
        let out = filter_eq(&batch, &[Constraint::new("type", ScalarValue::Null)]).unwrap();
        assert_eq!(out.num_rows(), 0);
    }

    #[test]
    fn test_bucket_boundaries() {
        let batch = create_test_batch();
        let short = filter_bucket(&batch, "runtime", RuntimeBucket::Short).unwrap();
        let typical = filter_bucket(&batch, "runtime", RuntimeBucket::Typical).unwrap();
        let long = filter_bucket(&batch, "runtime", RuntimeBucket::Long).unwrap();

        assert_eq!(titles(&short), vec!["A"]);
        assert_eq!(titles(&typical), vec!["B", "C"]);
        assert_eq!(titles(&long), vec!["D"]);
    }

    #[test]
    fn test_bucket_parse() {
        assert_eq!("Short".parse::<RuntimeBucket>().unwrap(), RuntimeBucket::Short);
        assert_eq!("typical".parse::<RuntimeBucket>().unwrap(), RuntimeBucket::Typical);
        assert_eq!(" LONG ".parse::<RuntimeBucket>().unwrap(), RuntimeBucket::Long);
        assert!("epic".parse::<RuntimeBucket>().is_err());
    }

    #[test]
    fn test_bucket_contains_agrees_with_mask() {
        for bucket in RuntimeBucket::ALL {
            assert_eq!(bucket.contains(60.0), bucket == RuntimeBucket::Typical);
            assert_eq!(bucket.contains(120.0), bucket == RuntimeBucket::Typical);
        }
    }
}
