//! Region aggregation
//!
//! Per-municipality suicide rates (per 100,000 inhabitants) averaged over the
//! requested years, joined with facility density (facilities per 1,000
//! inhabitants). Every municipality of the population table appears exactly
//! once in the output, whether or not it had any recorded event.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::Result;
use crate::lookup::state_of_region;
use crate::schemas::{population_schema, region_schema};
use crate::utils::arrow::{f64_values, i64_values, string_values};
use crate::utils::logging::log_dropped_rows;

/// Incidence rates are expressed per this many inhabitants
pub const INCIDENCE_SCALE: f64 = 100_000.0;

/// Facility density is expressed per this many inhabitants
pub const FACILITY_SCALE: f64 = 1_000.0;

/// Facility count per municipality code
pub type FacilityCounts = FxHashMap<i64, i64>;

/// One municipality of the population table
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPopulation {
    pub code: i64,
    pub name: Option<String>,
    pub population: i64,
}

/// One row of the region table
#[derive(Debug, Clone, PartialEq)]
pub struct RegionAggregate {
    pub code: i64,
    pub name: Option<String>,
    pub state: Option<String>,
    pub population: i64,
    pub facilities: i64,
    pub facility_rate: Option<f64>,
    pub average_suicide_rate: Option<f64>,
}

fn per_capita(count: f64, population: i64, scale: f64) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    (population > 0).then(|| count / population as f64 * scale)
}

/// Aggregate events into one row per municipality
///
/// # Arguments
/// * `events` - `(municipality code, year)` of every enriched record
/// * `years` - Years the average is taken over; events in other years are ignored
/// * `facility_counts` - Facilities per municipality; absent means zero
/// * `population` - The full municipality list
///
/// # Returns
/// One [`RegionAggregate`] per distinct municipality code, in population
/// table order. A municipality without events in a year contributes a rate of
/// 0 for that year; rates are `None` when the population is not positive.
#[must_use]
pub fn aggregate_regions(
    events: &[(i64, i32)],
    years: &[i32],
    facility_counts: &FacilityCounts,
    population: &[RegionPopulation],
) -> Vec<RegionAggregate> {
    let years = years.iter().copied().sorted().dedup().collect_vec();
    let wanted: FxHashSet<i32> = years.iter().copied().collect();

    let mut counts: FxHashMap<(i64, i32), u64> = FxHashMap::default();
    for &(code, year) in events.iter().filter(|(_, year)| wanted.contains(year)) {
        *counts.entry((code, year)).or_default() += 1;
    }

    let mut seen = FxHashSet::default();
    let mut regions = Vec::with_capacity(population.len());
    for region in population {
        if !seen.insert(region.code) {
            log::warn!("Duplicate municipality {} in population table, keeping the first", region.code);
            continue;
        }

        #[allow(clippy::cast_precision_loss)]
        let yearly_rates: Option<Vec<f64>> = years
            .iter()
            .map(|&year| {
                let count = counts.get(&(region.code, year)).copied().unwrap_or(0);
                per_capita(count as f64, region.population, INCIDENCE_SCALE)
            })
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let average_suicide_rate = yearly_rates
            .filter(|rates| !rates.is_empty())
            .map(|rates| rates.iter().sum::<f64>() / rates.len() as f64);

        let facilities = facility_counts.get(&region.code).copied().unwrap_or(0);
        #[allow(clippy::cast_precision_loss)]
        let facility_rate = per_capita(facilities as f64, region.population, FACILITY_SCALE);

        regions.push(RegionAggregate {
            code: region.code,
            name: region.name.clone(),
            state: state_of_region(region.code).map(str::to_string),
            population: region.population,
            facilities,
            facility_rate,
            average_suicide_rate,
        });
    }

    log::info!(
        "Aggregated {} events into {} regions over {} year(s)",
        events.len(),
        regions.len(),
        years.len()
    );
    regions
}

/// Count distinct facilities per municipality
///
/// A facility listed in several competence months or years counts once, so
/// over a multi-year selection the count is the number of facilities that
/// existed at any point, not the sum of yearly listings. Rows without a
/// facility id count once each; rows without a municipality are skipped.
pub fn count_facilities(facilities: &RecordBatch) -> Result<FacilityCounts> {
    let ids = string_values(facilities, "CNES")?;
    let codes = i64_values(facilities, "CODUFMUN")?;

    let mut distinct: FxHashSet<(i64, String)> = FxHashSet::default();
    let mut counts = FacilityCounts::default();
    for (code, id) in codes.into_iter().zip(ids) {
        let Some(code) = code else { continue };
        let first_seen = match id {
            Some(id) => distinct.insert((code, id)),
            None => true,
        };
        if first_seen {
            *counts.entry(code).or_default() += 1;
        }
    }
    Ok(counts)
}

/// Extract `(CODMUN, year)` pairs from an enriched mortality table
///
/// Records without a municipality code cannot be attributed and are skipped.
pub fn events_from_table(enriched: &RecordBatch) -> Result<Vec<(i64, i32)>> {
    let codes = i64_values(enriched, "CODMUN")?;
    let years = i64_values(enriched, "year")?;
    let events = codes
        .into_iter()
        .zip(years)
        .filter_map(|(code, year)| Some((code?, i32::try_from(year?).ok()?)))
        .collect_vec();
    log_dropped_rows(
        "region events",
        enriched.num_rows() - events.len(),
        enriched.num_rows(),
        "no municipality or year",
    );
    Ok(events)
}

/// Read the cleaned population table
pub fn population_from_table(table: &RecordBatch) -> Result<Vec<RegionPopulation>> {
    let codes = i64_values(table, "CODMUN")?;
    let names = string_values(table, "name_muni")?;
    let populations = i64_values(table, "pop_muni")?;
    Ok(codes
        .into_iter()
        .zip(names)
        .zip(populations)
        .filter_map(|((code, name), population)| {
            Some(RegionPopulation {
                code: code?,
                name,
                population: population?,
            })
        })
        .collect())
}

/// Build the cleaned population table
pub fn population_to_table(population: &[RegionPopulation]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(population.iter().map(|r| r.code))),
        Arc::new(StringArray::from_iter(population.iter().map(|r| r.name.as_deref()))),
        Arc::new(Int64Array::from_iter_values(population.iter().map(|r| r.population))),
    ];
    Ok(RecordBatch::try_new(population_schema(), columns)?)
}

/// Build the region table
pub fn regions_to_table(regions: &[RegionAggregate]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(regions.iter().map(|r| r.code))),
        Arc::new(StringArray::from_iter(regions.iter().map(|r| r.name.as_deref()))),
        Arc::new(StringArray::from_iter(regions.iter().map(|r| r.state.as_deref()))),
        Arc::new(Int64Array::from_iter_values(regions.iter().map(|r| r.population))),
        Arc::new(Int64Array::from_iter_values(regions.iter().map(|r| r.facilities))),
        Arc::new(Float64Array::from_iter(regions.iter().map(|r| r.facility_rate))),
        Arc::new(Float64Array::from_iter(
            regions.iter().map(|r| r.average_suicide_rate),
        )),
    ];
    Ok(RecordBatch::try_new(region_schema(), columns)?)
}

/// Read a region table back into [`RegionAggregate`]s
pub fn regions_from_table(table: &RecordBatch) -> Result<Vec<RegionAggregate>> {
    let codes = i64_values(table, "CODMUN")?;
    let names = string_values(table, "name_muni")?;
    let states = string_values(table, "state")?;
    let populations = i64_values(table, "pop_muni")?;
    let facilities = i64_values(table, "num_facilities")?;
    let facility_rates = f64_values(table, "facility_rate")?;
    let average_rates = f64_values(table, "average_suicide_rate")?;

    Ok((0..table.num_rows())
        .filter_map(|i| {
            Some(RegionAggregate {
                code: codes[i]?,
                name: names[i].clone(),
                state: states[i].clone(),
                population: populations[i]?,
                facilities: facilities[i].unwrap_or(0),
                facility_rate: facility_rates[i],
                average_suicide_rate: average_rates[i],
            })
        })
        .collect())
}
