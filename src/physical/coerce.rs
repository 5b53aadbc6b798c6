//! Numeric coercion
//!
//! Mirrors "to numeric, coercing errors": every value that cannot be read as
//! a number becomes null. Text is trimmed before parsing and NaN is folded
//! into null so that downstream kernels only ever see one kind of missing.
//! Integer targets parse through `Float64`, so `"90.0"` reads as 90 while
//! `"90.5"` has no integer value and becomes null. Coercing an array that
//! already has the target type is a no-op.

use crate::error::{QueryError, Result};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use std::sync::Arc;
use tracing::{debug, warn};

// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Coerce an array to a numeric type, mapping unparsable values to null
pub fn to_numeric(array: &ArrayRef, target: &DataType) -> Result<ArrayRef> {
    if !target.is_numeric() {
        return Err(QueryError::InvalidArgument(format!(
            "cannot coerce to non-numeric type {}",
            target
        )));
    }

    let coerced = if array.data_type() == target {
        array.clone()
    } else {
        let source = match array.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => trim_strings(array)?,
            _ => array.clone(),
        };
        if !can_cast_types(source.data_type(), target) {
            return Err(QueryError::Type(format!(
                "cannot coerce {} to {}",
                source.data_type(),
                target
            )));
        }
        if target.is_integer() && !source.data_type().is_integer() {
            integral(&source, target)?
        } else {
            // The default cast options are "safe": failures become nulls
            cast(&source, target)?
        }
    };

    if *target == DataType::Float64 {
        Ok(nan_to_null(coerced))
    } else {
        Ok(coerced)
    }
}

/// Coerce an array to `Float64`, the type every aggregate runs on
pub fn to_float64(array: &ArrayRef) -> Result<ArrayRef> {
    to_numeric(array, &DataType::Float64)
}

/// Replace the named columns of a batch with their numeric coercions
///
/// Names absent from the batch are skipped with a warning.
pub fn coerce_columns(batch: &RecordBatch, columns: &[(String, DataType)]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();

    for (name, target) in columns {
        match schema.index_of(name) {
            Ok(idx) => {
                arrays[idx] = to_numeric(&arrays[idx], target)?;
                fields[idx] = Field::new(name, target.clone(), true);
            }
            Err(_) => warn!(column = %name, "numeric column not present, skipping coercion"),
        }
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    RecordBatch::try_new(schema, arrays).map_err(Into::into)
}

/// Indices of the columns whose data type is numeric
pub fn numeric_column_indices(schema: &Schema) -> Vec<usize> {
    schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.data_type().is_numeric())
        .map(|(i, _)| i)
        .collect()
}

fn trim_strings(array: &ArrayRef) -> Result<ArrayRef> {
    let utf8 = if array.data_type() == &DataType::Utf8 {
        array.clone()
    } else {
        cast(array, &DataType::Utf8)?
    };
    let trimmed: StringArray = utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::trim))
        .collect();
    Ok(Arc::new(trimmed))
}

fn integral(source: &ArrayRef, target: &DataType) -> Result<ArrayRef> {
    let floats = cast(source, &DataType::Float64)?;
    let ints: Int64Array = floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.filter(|x| x.fract() == 0.0 && x.abs() <= MAX_EXACT_INT).map(|x| x as i64))
        .collect();
    let dropped = ints.null_count() - floats.null_count();
    if dropped > 0 {
        debug!(dropped, %target, "non-integral values coerced to null");
    }
    Ok(cast(&(Arc::new(ints) as ArrayRef), target)?)
}

fn nan_to_null(array: ArrayRef) -> ArrayRef {
    let floats = array.as_primitive::<Float64Type>();
    let has_nan = floats.iter().any(|v| v.is_some_and(f64::is_nan));
    if !has_nan {
        return array;
    }
    let cleaned: Float64Array = floats
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Arc::new(cleaned)
}
