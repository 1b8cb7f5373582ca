//! Three-tier, file-backed table cache.
//!
//! Tier 1 holds raw fetched pages, tier 2 cleaned and feature-enriched
//! tables, tier 3 derived per-region aggregates. Every entry is one Parquet
//! file addressed by `(tier, key)`, where the key carries the dataset name and
//! the full region/year selection it was derived from.
//!
//! Entries are written atomically (temp file + rename). There is no locking:
//! concurrent writers of the same key race and the last rename wins.

use std::fmt;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHasher;

use crate::error::Result;
use crate::utils::io::{read_parquet_table, write_parquet_atomic};
use crate::utils::logging::{CacheEvent, log_cache_event};

/// Cache tiers, each stored in its own namespace directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// Raw records exactly as fetched
    Raw,
    /// Cleaned and feature-enriched records
    Preprocessed,
    /// Per-region aggregates
    RegionAggregate,
}

impl CacheTier {
    /// Directory name of the tier below the cache root
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Raw => "rawdata",
            Self::Preprocessed => "preprocessed",
            Self::RegionAggregate => "regions",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.namespace())
    }
}

/// Identity of a cached table: dataset name plus region/year selection
///
/// Regions and years are sorted and deduplicated on construction, so two keys
/// for the same selection in a different order are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    dataset: String,
    regions: Vec<String>,
    years: Vec<i32>,
}

impl CacheKey {
    /// Key for `dataset` restricted to `regions` and `years`
    #[must_use]
    pub fn new<S: AsRef<str>>(dataset: &str, regions: &[S], years: &[i32]) -> Self {
        Self {
            dataset: dataset.to_string(),
            regions: regions
                .iter()
                .map(|r| r.as_ref().trim().to_uppercase())
                .sorted()
                .dedup()
                .collect(),
            years: years.iter().copied().sorted().dedup().collect(),
        }
    }

    /// Key for a dataset that does not depend on any selection
    #[must_use]
    pub fn unscoped(dataset: &str) -> Self {
        Self::new::<&str>(dataset, &[], &[])
    }

    /// Dataset name
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Canonical (sorted, deduplicated) regions
    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Canonical (sorted, deduplicated) years
    #[must_use]
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Canonical text form of the selection, e.g. `SIM|PR,SC|2015,2016`
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}",
            self.dataset,
            self.regions.join(","),
            self.years.iter().join(",")
        )
    }

    /// File stem: dataset name plus a stable hash of the selection
    #[must_use]
    pub fn file_stem(&self) -> String {
        if self.regions.is_empty() && self.years.is_empty() {
            return self.dataset.clone();
        }
        let mut hasher = FxHasher::default();
        hasher.write(self.canonical().as_bytes());
        format!("{}-{:016x}", self.dataset, hasher.finish())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// File-backed store for the three cache tiers
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Store rooted at `root`; directories are created on first write
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `(tier, key)`
    #[must_use]
    pub fn path(&self, tier: CacheTier, key: &CacheKey) -> PathBuf {
        self.root
            .join(tier.namespace())
            .join(format!("{}.parquet", key.file_stem()))
    }

    /// Whether an entry exists for `(tier, key)`
    #[must_use]
    pub fn contains(&self, tier: CacheTier, key: &CacheKey) -> bool {
        self.path(tier, key).is_file()
    }

    /// Load the table cached under `(tier, key)`
    ///
    /// # Returns
    /// * `Ok(Some(table))` - the cached table, possibly with zero rows
    /// * `Ok(None)` - no entry exists (cache miss)
    ///
    /// # Errors
    /// Returns an error if an entry exists but cannot be read
    pub fn load(&self, tier: CacheTier, key: &CacheKey) -> Result<Option<RecordBatch>> {
        let path = self.path(tier, key);
        if !path.is_file() {
            log_cache_event(tier, key, CacheEvent::Miss);
            return Ok(None);
        }
        log_cache_event(tier, key, CacheEvent::Hit);
        read_parquet_table(&path).map(Some)
    }

    /// Persist `table` under `(tier, key)`, replacing any previous entry
    pub fn store(&self, tier: CacheTier, key: &CacheKey, table: &RecordBatch) -> Result<()> {
        let path = self.path(tier, key);
        write_parquet_atomic(&path, table)?;
        log_cache_event(tier, key, CacheEvent::Stored(table.num_rows()));
        Ok(())
    }

    /// Remove the entry for `(tier, key)`; a missing entry is not an error
    pub fn invalidate(&self, tier: CacheTier, key: &CacheKey) -> Result<()> {
        let path = self.path(tier, key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log_cache_event(tier, key, CacheEvent::Invalidated);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
