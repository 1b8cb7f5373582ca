//! Concatenation of source pages into a single raw table.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::Result;
use crate::utils::arrow::array_utils::project_as_strings;

/// Concatenate raw pages into one table
///
/// Pages may carry different column sets (registry layouts change between
/// years). The result holds the union of all columns as nullable `Utf8`, in
/// first-seen order; a page lacking a column contributes nulls for it.
pub fn concat_pages(pages: &[RecordBatch]) -> Result<RecordBatch> {
    let columns: Vec<String> = pages
        .iter()
        .flat_map(|page| {
            page.schema()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect_vec()
        })
        .unique()
        .collect();

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect_vec(),
    ));

    let names = columns.iter().map(String::as_str).collect_vec();
    let projected = pages
        .iter()
        .map(|page| project_as_strings(page, &names))
        .collect::<Result<Vec<_>>>()?;

    if projected.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(arrow::compute::concat_batches(&schema, &projected)?)
}
