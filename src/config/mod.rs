//! Configuration for the acquisition pipeline and clustering engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lookup::calendar::Jurisdiction;

/// Environment variable overriding [`PipelineConfig::cache_dir`]
pub const CACHE_DIR_ENV: &str = "SIM_CACHE_DIR";

/// Environment variable naming the directory with pre-downloaded source pages
pub const SOURCE_DIR_ENV: &str = "SIM_SOURCE_DIR";

/// File name of the labeled dataset inside the cache directory
pub const LABELED_FILE_NAME: &str = "labeled_data.parquet";

/// States covered by a default acquisition
pub const DEFAULT_REGIONS: [&str; 3] = ["PR", "SC", "RS"];

/// Years covered by a default acquisition
pub const DEFAULT_YEARS: std::ops::RangeInclusive<i32> = 2011..=2019;

/// Holiday calendar settings, built once and threaded through feature derivation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolidayConfig {
    /// Jurisdiction whose public holidays are used, for any event year
    pub jurisdiction: Jurisdiction,
    /// Closed window, in days, around each holiday that still counts as "holiday"
    pub window_days: i64,
}

impl Default for HolidayConfig {
    fn default() -> Self {
        Self {
            jurisdiction: Jurisdiction::Brazil,
            window_days: 1,
        }
    }
}

/// Configuration for the [`Pipeline`](crate::pipeline::Pipeline)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory of the three cache tiers
    pub cache_dir: PathBuf,
    /// Single-slot location of the last applied clustering
    pub labeled_path: PathBuf,
    /// States (UF abbreviations) requested from the source
    pub regions: Vec<String>,
    /// Years requested from the source
    pub years: Vec<i32>,
    /// Holiday calendar settings
    pub holidays: HolidayConfig,
    /// Columns with a missing fraction at or above this value are not imputed
    pub imputation_threshold: f64,
    /// Age bucket edges; buckets are `(edge[i], edge[i + 1]]`
    pub age_bins: Vec<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let cache_dir = PathBuf::from("./data");
        Self {
            labeled_path: cache_dir.join(LABELED_FILE_NAME),
            cache_dir,
            regions: DEFAULT_REGIONS.iter().map(ToString::to_string).collect(),
            years: DEFAULT_YEARS.collect(),
            holidays: HolidayConfig::default(),
            imputation_threshold: 0.3,
            age_bins: (1..=10).map(|i| f64::from(i * 10)).collect(),
        }
    }
}

impl PipelineConfig {
    /// Configuration rooted at `cache_dir`, everything else default
    #[must_use]
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        Self {
            labeled_path: cache_dir.join(LABELED_FILE_NAME),
            cache_dir,
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file; absent keys fall back to defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        log::info!("Loaded pipeline configuration from {}", path.display());
        Ok(config)
    }

    /// Apply the `SIM_CACHE_DIR` override, if set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(CACHE_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => {
                log::debug!("Cache directory overridden by {CACHE_DIR_ENV}={dir}");
                self.relocated(dir)
            }
            _ => self,
        }
    }

    /// Move the cache root to `cache_dir`
    ///
    /// A `labeled_path` at its default location inside the old cache root
    /// moves along; any other `labeled_path` is kept as configured.
    #[must_use]
    pub fn relocated(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        if self.labeled_path == self.cache_dir.join(LABELED_FILE_NAME) {
            self.labeled_path = cache_dir.join(LABELED_FILE_NAME);
        }
        self.cache_dir = cache_dir;
        self
    }
}
