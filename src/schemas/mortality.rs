//! SIM schema definitions

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Raw SIM columns kept by the pipeline
pub const MORTALITY_SELECTION: [&str; 10] = [
    "DTOBITO",
    "HORAOBITO",
    "CAUSABAS",
    "LOCOCOR",
    "CODMUNRES",
    "IDADE",
    "SEXO",
    "RACACOR",
    "ESC",
    "ESTCIV",
];

/// Get the Arrow schema for enriched SIM data
///
/// One row per suicide death. `CODMUNRES` is renamed to `CODMUN`, `CAUSABAS`
/// holds the 3-character ICD-10 category and `IDADE` the age in years. The
/// region columns (`name_muni` to `average_suicide_rate`) are null for rows
/// whose municipality is not in the region table.
pub fn enriched_mortality_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("DTOBITO", DataType::Date32, false),
        Field::new("HORAOBITO", DataType::Utf8, true),
        Field::new("CAUSABAS", DataType::Utf8, false),
        Field::new("LOCOCOR", DataType::Utf8, true),
        Field::new("CODMUN", DataType::Int64, true),
        Field::new("IDADE", DataType::Float64, true),
        Field::new("SEXO", DataType::Utf8, true),
        Field::new("RACACOR", DataType::Utf8, true),
        Field::new("ESC", DataType::Utf8, true),
        Field::new("ESTCIV", DataType::Utf8, true),
        Field::new("year", DataType::Int64, false),
        Field::new("month", DataType::Int64, false),
        Field::new("day", DataType::Int64, false),
        Field::new("season", DataType::Utf8, false),
        Field::new("weekday", DataType::Utf8, false),
        Field::new("holiday", DataType::Boolean, false),
        Field::new("state", DataType::Utf8, true),
        Field::new("name_muni", DataType::Utf8, true),
        Field::new("pop_muni", DataType::Int64, true),
        Field::new("facility_rate", DataType::Float64, true),
        Field::new("average_suicide_rate", DataType::Float64, true),
        Field::new("age_group", DataType::Utf8, true),
        Field::new("method", DataType::Utf8, false),
        Field::new("day_period", DataType::Utf8, true),
    ]))
}
