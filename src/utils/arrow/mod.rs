//! Arrow utilities
//!
//! Column extraction, projection and page concatenation over `RecordBatch`es.

pub mod array_utils;
pub mod pages;

pub use array_utils::{
    f64_values, filter_rows, get_column, i64_values, is_numeric, null_counts, project_as_strings,
    string_values, with_column,
};
pub use pages::concat_pages;
