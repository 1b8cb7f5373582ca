//! Source registries the pipeline fetches from.
//!
//! The pipeline depends on remote registries only through [`DataSource`].
//! [`ParquetDirectorySource`] serves pre-downloaded pages from disk.

pub mod parquet_dir;

use std::fmt;
use std::str::FromStr;

use arrow::record_batch::RecordBatch;

use crate::error::{Result, SimError};

pub use parquet_dir::ParquetDirectorySource;

/// Registries the pipeline knows how to acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Mortality information system (one row per death)
    Mortality,
    /// National registry of healthcare facilities
    Facilities,
}

impl Dataset {
    /// Registry name, also used as the cache dataset name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mortality => "SIM",
            Self::Facilities => "CNES",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dataset {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SIM" => Ok(Self::Mortality),
            "CNES" => Ok(Self::Facilities),
            other => Err(SimError::InvalidInput(format!(
                "Unknown dataset: {other} (available datasets are SIM and CNES)"
            ))),
        }
    }
}

/// Dataset name under which the raw population table is cached
pub const POPULATION_DATASET: &str = "POPULATION";

/// Fetch contract of the remote registries
///
/// Implementations block until the data is available. Any failure is
/// reported as an error; an implementation must never substitute an empty
/// table for data it could not deliver.
pub trait DataSource {
    /// Fetch raw pages of `dataset`, one page per (region, year) or equivalent
    ///
    /// Pages are returned in no particular order and may carry different
    /// column sets.
    fn fetch(&self, dataset: Dataset, regions: &[String], years: &[i32])
    -> Result<Vec<RecordBatch>>;

    /// Fetch the municipality population table
    ///
    /// Columns: `D1C` (municipality code with trailing check digit), `D1N`
    /// (name, suffixed with `" - <UF>"`), `V` (population).
    fn fetch_population_table(&self) -> Result<RecordBatch>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn fetch(
        &self,
        dataset: Dataset,
        regions: &[String],
        years: &[i32],
    ) -> Result<Vec<RecordBatch>> {
        (**self).fetch(dataset, regions, years)
    }

    fn fetch_population_table(&self) -> Result<RecordBatch> {
        (**self).fetch_population_table()
    }
}
