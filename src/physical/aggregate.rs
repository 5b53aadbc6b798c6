//! Hash aggregation: per-group means and distinct values

use crate::error::Result;
use crate::physical::coerce::to_float64;
use crate::physical::filter::column_by_name;
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, RecordBatch, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::row::{OwnedRow, RowConverter, SortField};
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Running sum and count of the non-missing values of one group
#[derive(Debug, Default, Clone, Copy)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn update(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn finish(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean of `value_column` for each distinct value of `group_column`
///
/// Produces one row per non-missing group key, ordered by key. Missing
/// values are left out of the mean; a group with no values at all reports
/// a missing mean.
pub fn group_mean(batch: &RecordBatch, group_column: &str, value_column: &str) -> Result<RecordBatch> {
    let keys = column_by_name(batch, group_column)?.clone();
    let values = to_float64(column_by_name(batch, value_column)?)?;
    let values = values.as_primitive::<Float64Type>();

    // Row format gives hashable, type-ordered keys for any column type
    let converter = RowConverter::new(vec![SortField::new(keys.data_type().clone())])?;
    let rows = converter.convert_columns(&[keys.clone()])?;

    let mut groups: HashMap<OwnedRow, usize> = HashMap::new();
    let mut first_rows: Vec<u32> = Vec::new();
    let mut accumulators: Vec<MeanAccumulator> = Vec::new();

    for i in 0..batch.num_rows() {
        if keys.is_null(i) {
            continue;
        }
        let group = *groups.entry(rows.row(i).owned()).or_insert_with(|| {
            first_rows.push(i as u32);
            accumulators.push(MeanAccumulator::default());
            accumulators.len() - 1
        });
        let value = values.is_valid(i).then(|| values.value(i));
        accumulators[group].update(value);
    }

    let mut ordered: Vec<(OwnedRow, usize)> = groups.into_iter().collect();
    ordered.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let key_indices = UInt32Array::from_iter_values(ordered.iter().map(|(_, g)| first_rows[*g]));
    let key_array = take(keys.as_ref(), &key_indices, None)?;
    let means: Float64Array = ordered
        .iter()
        .map(|(_, g)| accumulators[*g].finish())
        .collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new(group_column, keys.data_type().clone(), true),
        Field::new(value_column, DataType::Float64, true),
    ]));
    let columns: Vec<ArrayRef> = vec![key_array, Arc::new(means)];
    RecordBatch::try_new(schema, columns).map_err(Into::into)
}

/// Distinct non-missing values of a column, in order of first appearance
pub fn distinct(batch: &RecordBatch, column: &str) -> Result<RecordBatch> {
    let values = column_by_name(batch, column)?.clone();
    let converter = RowConverter::new(vec![SortField::new(values.data_type().clone())])?;
    let rows = converter.convert_columns(&[values.clone()])?;

    let mut seen: HashSet<OwnedRow> = HashSet::new();
    let mut first_rows: Vec<u32> = Vec::new();
    for i in 0..values.len() {
        if values.is_valid(i) && seen.insert(rows.row(i).owned()) {
            first_rows.push(i as u32);
        }
    }

    let picked = take(values.as_ref(), &UInt32Array::from(first_rows), None)?;
    let schema = Arc::new(Schema::new(vec![Field::new(
        column,
        values.data_type().clone(),
        true,
    )]));
    RecordBatch::try_new(schema, vec![picked]).map_err(Into::into)
}
