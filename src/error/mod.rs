//! Error handling for the acquisition pipeline and clustering engine.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for `sim_analytics`
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error building or transforming Arrow data
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error encoding or decoding Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error reading a JSON configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote registry could not deliver the requested dataset
    #[error("Source unavailable for {dataset}: {reason}")]
    SourceUnavailable { dataset: String, reason: String },

    /// A required column is absent from a table
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A column exists but does not have the expected Arrow type
    #[error("Column '{column}' is not of type {expected}")]
    InvalidColumnType { column: String, expected: String },

    /// A distance threshold cuts the tree into a single cluster or into singletons
    #[error(
        "Threshold {threshold} yields {clusters} cluster(s) for {rows} rows; scoring needs 2..{rows} clusters"
    )]
    DegenerateCut {
        threshold: f64,
        clusters: usize,
        rows: usize,
    },

    /// A missing value survived imputation and made the distance matrix non-finite
    #[error("Distance matrix contains non-finite values (un-imputed missing data)")]
    NonFiniteDistance,

    /// Caller supplied an argument outside the accepted domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SimError {
    /// Shorthand for a fetch failure on `dataset`
    pub fn source_unavailable(dataset: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            dataset: dataset.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a missing column
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

/// Result type for `sim_analytics` operations
pub type Result<T> = std::result::Result<T, SimError>;
