//! Descriptive statistics and correlation
//!
//! Both operate on the numeric columns of a batch, coerced to `Float64`.
//! Missing values are skipped: per column for `describe`, per pair of
//! columns for `correlation`.

use crate::error::{QueryError, Result};
use crate::physical::coerce::{numeric_column_indices, to_float64};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Row labels of a `describe` result, in order
pub const SUMMARY_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Name of the label column in `describe` and correlation batches
pub const LABEL_COLUMN: &str = "statistic";

/// Summary statistics of one column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Summarize the non-missing values of an array
    pub fn from_array(array: &ArrayRef) -> Result<Self> {
        let values = to_float64(array)?;
        let mut sorted: Vec<f64> = values
            .as_primitive::<Float64Type>()
            .iter()
            .flatten()
            .collect();
        sorted.sort_by(f64::total_cmp);
        Ok(Self::from_sorted(&sorted))
    }

    fn from_sorted(sorted: &[f64]) -> Self {
        let n = sorted.len();
        if n == 0 {
            return Self::default();
        }

        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = (n > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        });

        Self {
            count: n,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            p25: percentile(sorted, 0.25),
            p50: percentile(sorted, 0.50),
            p75: percentile(sorted, 0.75),
            max: sorted.last().copied(),
        }
    }

    /// Values in `SUMMARY_LABELS` order
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            Some(self.count as f64),
            self.mean,
            self.std,
            self.min,
            self.p25,
            self.p50,
            self.p75,
            self.max,
        ]
    }
}

/// Percentile of sorted values with linear interpolation between ranks
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Summary statistics for every numeric column
///
/// The result has a `statistic` label column followed by one `Float64`
/// column per numeric input column.
pub fn describe(batch: &RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = vec![Field::new(LABEL_COLUMN, DataType::Utf8, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(SUMMARY_LABELS.to_vec()))];

    for idx in numeric_column_indices(&schema) {
        let summary = ColumnSummary::from_array(batch.column(idx))?;
        fields.push(Field::new(schema.field(idx).name(), DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(summary.values().to_vec())));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}

/// Pairwise Pearson correlation between numeric columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Column names, in row and column order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Coefficient at `(row, col)`; `None` when undefined
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Coefficient between two named columns
    pub fn get(&self, a: &str, b: &str) -> Result<Option<f64>> {
        let row = self.position(a)?;
        let col = self.position(b)?;
        Ok(self.value(row, col))
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| QueryError::MissingColumn(name.to_string()))
    }

    /// Render as a batch: a label column plus one column per variable
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        let mut fields = vec![Field::new(LABEL_COLUMN, DataType::Utf8, false)];
        let mut columns: Vec<ArrayRef> = vec![Arc::new(StringArray::from(self.columns.clone()))];

        for (j, name) in self.columns.iter().enumerate() {
            fields.push(Field::new(name, DataType::Float64, true));
            let col: Float64Array = (0..self.len()).map(|i| self.value(i, j)).collect();
            columns.push(Arc::new(col));
        }

        RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.columns.iter().enumerate() {
            write!(f, "{:>16}", name)?;
            for j in 0..self.len() {
                match self.value(i, j) {
                    Some(v) => write!(f, " {:>7.3}", v)?,
                    None => write!(f, " {:>7}", "NaN")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Correlation matrix of the numeric columns of a batch
///
/// Each coefficient uses only the rows where both columns are present. A
/// pair with fewer than two such rows, or with no variance, is `None`. The
/// diagonal is 1.0 for every column holding at least two distinct values.
pub fn correlation(batch: &RecordBatch) -> Result<CorrelationMatrix> {
    let schema = batch.schema();
    let indices = numeric_column_indices(&schema);

    let mut columns = Vec::with_capacity(indices.len());
    let mut data: Vec<Vec<Option<f64>>> = Vec::with_capacity(indices.len());
    for idx in indices {
        columns.push(schema.field(idx).name().clone());
        let values = to_float64(batch.column(idx))?;
        data.push(values.as_primitive::<Float64Type>().iter().collect());
    }

    let k = columns.len();
    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = if i == j {
                (distinct_count(&data[i]) >= 2).then_some(1.0)
            } else {
                pearson(&data[i], &data[j])
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix { columns, values })
}

/// Pearson coefficient over pairwise-complete observations
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn distinct_count(values: &[Option<f64>]) -> usize {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);
    present.dedup();
    present.len()
}
