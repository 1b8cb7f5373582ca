//! Utilities for working with Arrow arrays.
//!
//! Column extraction with type coercion, row filtering and projection helpers
//! used by the pipeline and the clustering engine.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, new_null_array};
use arrow::compute::kernels::cast;
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use log::warn;

use crate::error::{Result, SimError};

/// Get a column from a record batch by name
///
/// # Errors
/// Returns [`SimError::ColumnNotFound`] when the column is absent
pub fn get_column<'a>(batch: &'a RecordBatch, column_name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(column_name)
        .ok_or_else(|| SimError::column_not_found(column_name))
}

/// Whether a data type is one of the Arrow integer or float types
#[must_use]
pub fn is_numeric(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

/// Extract a column as optional strings, casting non-string columns
///
/// # Arguments
/// * `batch` - The record batch to extract from
/// * `column_name` - The name of the column
///
/// # Returns
/// One entry per row, `None` for nulls
pub fn string_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<String>>> {
    let column = get_column(batch, column_name)?;
    let utf8 = cast::cast(column, &DataType::Utf8)?;
    Ok(utf8
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Extract a numeric column as optional `f64` values
///
/// # Errors
/// Returns [`SimError::InvalidColumnType`] when the column is not numeric
pub fn f64_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<f64>>> {
    let column = get_column(batch, column_name)?;
    if !is_numeric(column.data_type()) {
        return Err(SimError::InvalidColumnType {
            column: column_name.to_string(),
            expected: "numeric".to_string(),
        });
    }
    let floats = cast::cast(column, &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().iter().collect())
}

/// Extract a numeric column as optional `i64` values
///
/// # Errors
/// Returns [`SimError::InvalidColumnType`] when the column is not numeric
pub fn i64_values(batch: &RecordBatch, column_name: &str) -> Result<Vec<Option<i64>>> {
    let column = get_column(batch, column_name)?;
    if !is_numeric(column.data_type()) {
        return Err(SimError::InvalidColumnType {
            column: column_name.to_string(),
            expected: "integer".to_string(),
        });
    }
    let ints = cast::cast(column, &DataType::Int64)?;
    Ok(ints.as_primitive::<Int64Type>().iter().collect())
}

/// Keep only the rows where `mask` is true
pub fn filter_rows(batch: &RecordBatch, mask: &[bool]) -> Result<RecordBatch> {
    let predicate = BooleanArray::from(mask.to_vec());
    Ok(arrow::compute::filter_record_batch(batch, &predicate)?)
}

/// Project a batch onto `columns` as `Utf8`, filling absent columns with nulls
///
/// Raw registry pages differ between years; a column missing from a page is a
/// data-quality issue handled with the missing-value convention.
pub fn project_as_strings(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for &name in columns {
        let array = match batch.column_by_name(name) {
            Some(column) => cast::cast(column, &DataType::Utf8)?,
            None => {
                warn!("Column '{name}' not found in record batch, filling with nulls");
                new_null_array(&DataType::Utf8, batch.num_rows())
            }
        };
        fields.push(Field::new(name, DataType::Utf8, true));
        arrays.push(array);
    }

    if arrays.is_empty() {
        return Ok(RecordBatch::new_empty(Arc::new(Schema::empty())));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Append `column` to `batch` under `name`, replacing an existing column of that name
pub fn with_column(batch: &RecordBatch, name: &str, column: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns() + 1);
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns() + 1);

    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        if field.name() != name {
            fields.push(field.as_ref().clone());
            arrays.push(Arc::clone(array));
        }
    }
    fields.push(Field::new(name, column.data_type().clone(), true));
    arrays.push(column);

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Number of null entries per column, in schema order
#[must_use]
pub fn null_counts(batch: &RecordBatch) -> Vec<(String, usize)> {
    batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| (field.name().clone(), array.null_count()))
        .collect()
}
