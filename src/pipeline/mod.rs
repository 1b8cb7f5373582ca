//! Acquisition pipeline
//!
//! Orchestrates the three cache tiers: a request is served from the
//! preprocessed tier when possible, otherwise rebuilt from the raw tier, which
//! itself is filled from the [`DataSource`] on a miss. Every tier is keyed by
//! the full region/year selection, so a broader request never returns a
//! narrower cached table.

pub mod facilities;
pub mod mortality;
pub mod population;

use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::aggregation::{
    RegionAggregate, RegionPopulation, aggregate_regions, count_facilities, events_from_table,
    population_to_table, regions_from_table, regions_to_table,
};
use crate::cache::{CacheKey, CacheStore, CacheTier};
use crate::config::PipelineConfig;
use crate::error::{Result, SimError};
use crate::lookup::HolidayCalendar;
use crate::source::{DataSource, Dataset, POPULATION_DATASET};
use crate::utils::arrow::concat_pages;

pub use facilities::preprocess_facilities;
pub use mortality::{MortalityRecord, decode_mortality, enrich, region_events};
pub use population::clean_population;

/// Cache dataset name of the region aggregate table
pub const REGIONS_DATASET: &str = "REGIONS";

/// Acquisition pipeline over a [`DataSource`] and a [`CacheStore`]
pub struct Pipeline<S: DataSource> {
    source: S,
    cache: CacheStore,
    config: PipelineConfig,
    calendar: HolidayCalendar,
}

impl<S: DataSource> Pipeline<S> {
    /// Create a pipeline; the holiday calendar is built once from `config`
    #[must_use]
    pub fn new(source: S, config: PipelineConfig) -> Self {
        let calendar = HolidayCalendar::new(&config.holidays);
        Self {
            source,
            cache: CacheStore::new(&config.cache_dir),
            config,
            calendar,
        }
    }

    /// Pipeline configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Data source the raw tier is filled from
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Underlying cache store
    #[must_use]
    pub const fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Acquire the preprocessed table of `dataset` for a selection
    ///
    /// # Arguments
    /// * `dataset` - Registry to acquire
    /// * `regions` - States (UF abbreviations) to request
    /// * `years` - Years to request
    ///
    /// # Errors
    /// Source failures propagate unchanged; an empty selection is rejected
    pub fn acquire(&self, dataset: Dataset, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
        match dataset {
            Dataset::Mortality => self.acquire_mortality(regions, years),
            Dataset::Facilities => self.acquire_facilities(regions, years),
        }
    }

    /// Acquire `dataset` for the configured regions and years
    pub fn acquire_default(&self, dataset: Dataset) -> Result<RecordBatch> {
        self.acquire(dataset, &self.config.regions, &self.config.years)
    }

    /// Enriched suicide records for a selection
    pub fn acquire_mortality(&self, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
        validate_selection(regions, years)?;
        let key = CacheKey::new(Dataset::Mortality.name(), regions, years);
        if let Some(enriched) = self.cache.load(CacheTier::Preprocessed, &key)? {
            return Ok(enriched);
        }

        log::info!("Preprocessing {key}");
        let raw = self.raw_table(Dataset::Mortality, regions, years)?;
        let records = decode_mortality(&raw, &self.calendar, &self.config.age_bins)?;

        let region_key = CacheKey::new(REGIONS_DATASET, regions, years);
        let regions_table = match self.cache.load(CacheTier::RegionAggregate, &region_key)? {
            Some(table) => regions_from_table(&table)?,
            None => self.build_regions(&region_events(&records), regions, years, &region_key)?,
        };

        let enriched = enrich(&records, &regions_table)?;
        self.cache.store(CacheTier::Preprocessed, &key, &enriched)?;
        Ok(enriched)
    }

    /// Mental-health facilities for a selection
    pub fn acquire_facilities(&self, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
        validate_selection(regions, years)?;
        let key = CacheKey::new(Dataset::Facilities.name(), regions, years);
        if let Some(facilities) = self.cache.load(CacheTier::Preprocessed, &key)? {
            return Ok(facilities);
        }

        log::info!("Preprocessing {key}");
        let raw = self.raw_table(Dataset::Facilities, regions, years)?;
        let facilities = preprocess_facilities(&raw)?;
        self.cache.store(CacheTier::Preprocessed, &key, &facilities)?;
        Ok(facilities)
    }

    /// Region aggregate table for a selection
    ///
    /// Served from the region tier when present, otherwise derived from the
    /// enriched records of the same selection.
    pub fn region_table(&self, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
        validate_selection(regions, years)?;
        let key = CacheKey::new(REGIONS_DATASET, regions, years);
        if let Some(table) = self.cache.load(CacheTier::RegionAggregate, &key)? {
            return Ok(table);
        }

        let enriched = self.acquire_mortality(regions, years)?;
        // Rebuilding the enriched table also fills the region tier
        if let Some(table) = self.cache.load(CacheTier::RegionAggregate, &key)? {
            return Ok(table);
        }
        let events = events_from_table(&enriched)?;
        regions_to_table(&self.build_regions(&events, regions, years, &key)?)
    }

    /// Cleaned municipality population table
    pub fn population(&self) -> Result<Vec<RegionPopulation>> {
        let key = CacheKey::unscoped(POPULATION_DATASET);
        let raw = match self.cache.load(CacheTier::Raw, &key)? {
            Some(raw) => raw,
            None => {
                log::info!("Fetching {POPULATION_DATASET} from source");
                let raw = self.source.fetch_population_table()?;
                self.cache.store(CacheTier::Raw, &key, &raw)?;
                raw
            }
        };
        clean_population(&raw)
    }

    /// Cleaned population as a table
    pub fn population_table(&self) -> Result<RecordBatch> {
        population_to_table(&self.population()?)
    }

    /// Raw table for a selection, fetched and cached on a miss
    fn raw_table(&self, dataset: Dataset, regions: &[String], years: &[i32]) -> Result<RecordBatch> {
        let key = CacheKey::new(dataset.name(), regions, years);
        if let Some(raw) = self.cache.load(CacheTier::Raw, &key)? {
            return Ok(raw);
        }

        log::info!(
            "Fetching {dataset} for {} / {} from source",
            regions.iter().join(","),
            years.iter().join(",")
        );
        let pages = self.source.fetch(dataset, regions, years)?;
        if pages.is_empty() {
            return Err(SimError::source_unavailable(
                dataset.name(),
                "source returned no pages",
            ));
        }
        let raw = concat_pages(&pages)?;
        self.cache.store(CacheTier::Raw, &key, &raw)?;
        Ok(raw)
    }

    fn build_regions(
        &self,
        events: &[(i64, i32)],
        regions: &[String],
        years: &[i32],
        key: &CacheKey,
    ) -> Result<Vec<RegionAggregate>> {
        let facility_counts = count_facilities(&self.acquire_facilities(regions, years)?)?;
        let population = self.population()?;
        let aggregates = aggregate_regions(events, years, &facility_counts, &population);
        self.cache
            .store(CacheTier::RegionAggregate, key, &regions_to_table(&aggregates)?)?;
        Ok(aggregates)
    }
}

fn validate_selection(regions: &[String], years: &[i32]) -> Result<()> {
    if regions.is_empty() || years.is_empty() {
        return Err(SimError::InvalidInput(
            "at least one region and one year must be selected".to_string(),
        ));
    }
    Ok(())
}
