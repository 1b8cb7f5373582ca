//! File input/output: Parquet tables and JSON sidecars

pub mod json;
pub mod parquet;

pub use self::json::{read_json, write_json_atomic};
pub use self::parquet::{find_parquet_files, read_parquet_table, validate_directory, write_parquet_atomic};
