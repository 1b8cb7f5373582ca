//! Municipality schema definitions

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Get the Arrow schema for the cleaned population table
pub fn population_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("CODMUN", DataType::Int64, false),
        Field::new("name_muni", DataType::Utf8, true),
        Field::new("pop_muni", DataType::Int64, false),
    ]))
}

/// Get the Arrow schema for the region aggregate table
///
/// Exactly one row per municipality of the population table. Rates are null
/// when the population is not positive.
pub fn region_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("CODMUN", DataType::Int64, false),
        Field::new("name_muni", DataType::Utf8, true),
        Field::new("state", DataType::Utf8, true),
        Field::new("pop_muni", DataType::Int64, false),
        Field::new("num_facilities", DataType::Int64, false),
        Field::new("facility_rate", DataType::Float64, true),
        Field::new("average_suicide_rate", DataType::Float64, true),
    ]))
}
