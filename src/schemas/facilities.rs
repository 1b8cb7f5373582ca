//! CNES schema definitions

use arrow::datatypes::{DataType, Field, Schema};
use std::sync::Arc;

/// Raw CNES columns kept by the pipeline
pub const FACILITY_SELECTION: [&str; 9] = [
    "CNES",
    "COMPETEN",
    "CODUFMUN",
    "COD_CEP",
    "NATUREZA",
    "VINC_SUS",
    "TP_UNID",
    "SERAP02P",
    "SERAP02T",
];

/// Get the Arrow schema for preprocessed CNES data
///
/// Facilities offering psychosocial support or social services, one row per
/// facility and competence month.
pub fn facilities_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("CNES", DataType::Utf8, true),
        Field::new("COMPETEN", DataType::Utf8, true),
        Field::new("CODUFMUN", DataType::Int64, true),
        Field::new("COD_CEP", DataType::Utf8, true),
        Field::new("NATUREZA", DataType::Utf8, true),
        Field::new("VINC_SUS", DataType::Utf8, true),
        Field::new("TP_UNID", DataType::Utf8, true),
        Field::new("SERAP02P", DataType::Utf8, true),
        Field::new("SERAP02T", DataType::Utf8, true),
        Field::new("year", DataType::Int64, true),
    ]))
}
