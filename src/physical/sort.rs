//! Top-N selection

use crate::error::{QueryError, Result};
use crate::physical::coerce::to_float64;
use crate::physical::filter::column_by_name;
use arrow::array::{Array, ArrayRef, RecordBatch, UInt64Array};
use arrow::compute::{lexsort_to_indices, take_record_batch, SortColumn, SortOptions};
use std::sync::Arc;

/// The `n` rows with the largest values of `column`, largest first
///
/// The column is coerced to numbers; rows where it is missing are never
/// returned. Equal values keep their original row order: the row position
/// is the secondary sort key, so the result does not depend on the
/// stability of the underlying sort.
pub fn top_n(batch: &RecordBatch, column: &str, n: usize) -> Result<RecordBatch> {
    // Sort indices come back as u32
    if u32::try_from(batch.num_rows()).is_err() {
        return Err(QueryError::InvalidArgument(format!(
            "cannot rank {} rows in one batch",
            batch.num_rows()
        )));
    }
    let values = to_float64(column_by_name(batch, column)?)?;
    let available = values.len() - values.null_count();
    let fetch = n.min(available);
    if fetch == 0 {
        return Ok(batch.slice(0, 0));
    }

    let row_ids: ArrayRef = Arc::new(UInt64Array::from_iter_values(
        (0..batch.num_rows()).map(|i| i as u64),
    ));
    let sort_columns = vec![
        SortColumn {
            values,
            options: Some(SortOptions {
                descending: true,
                nulls_first: false,
            }),
        },
        SortColumn {
            values: row_ids,
            options: Some(SortOptions {
                descending: false,
                nulls_first: false,
            }),
        },
    ];

    let indices = lexsort_to_indices(&sort_columns, Some(fetch))?;
    take_record_batch(batch, &indices).map_err(Into::into)
}
