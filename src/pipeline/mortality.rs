//! Mortality (SIM) cleaning, decoding and feature derivation.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray,
};
use arrow::datatypes::Date32Type;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::aggregation::RegionAggregate;
use crate::error::Result;
use crate::features::{CalendarFeatures, DayPeriod, age_group, day_period, decode_age, decode_date};
use crate::lookup::{
    CodedField, HolidayCalendar, cause_category, is_suicide_code, state_of_region, suicide_method,
};
use crate::schemas::{MORTALITY_SELECTION, enriched_mortality_schema};
use crate::utils::arrow::{project_as_strings, string_values};
use crate::utils::logging::log_dropped_rows;

/// A cleaned, decoded suicide record before the region join
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityRecord {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub cause: String,
    pub place: Option<&'static str>,
    pub region: Option<i64>,
    pub age: Option<f64>,
    pub sex: Option<&'static str>,
    pub race: Option<&'static str>,
    pub education: Option<&'static str>,
    pub marital_status: Option<&'static str>,
    pub calendar: CalendarFeatures,
    pub day_period: Option<DayPeriod>,
    pub state: Option<&'static str>,
    pub age_group: Option<String>,
    pub method: &'static str,
}

/// Trimmed value; blank cells count as missing
fn cell(column: &[Option<String>], row: usize) -> Option<&str> {
    column[row].as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Select, clean and decode the suicide records of a raw SIM table
///
/// Rows whose 3-character cause category is not a suicide code are dropped,
/// as are rows whose date of death does not decode. Unmapped codes and
/// unparseable numbers become missing values.
///
/// # Arguments
/// * `raw` - Concatenated raw pages
/// * `holidays` - Calendar used for the holiday flag
/// * `age_bins` - Edges of the age-group buckets
pub fn decode_mortality(
    raw: &RecordBatch,
    holidays: &HolidayCalendar,
    age_bins: &[f64],
) -> Result<Vec<MortalityRecord>> {
    let selected = project_as_strings(raw, &MORTALITY_SELECTION)?;
    let column = |name: &str| string_values(&selected, name);
    let dates = column("DTOBITO")?;
    let times = column("HORAOBITO")?;
    let causes = column("CAUSABAS")?;
    let places = column(CodedField::PlaceOfDeath.column())?;
    let regions = column("CODMUNRES")?;
    let ages = column("IDADE")?;
    let sexes = column(CodedField::Sex.column())?;
    let races = column(CodedField::Race.column())?;
    let educations = column(CodedField::Education.column())?;
    let marital = column(CodedField::MaritalStatus.column())?;

    let mut records = Vec::new();
    let mut invalid_dates = 0usize;

    for row in 0..selected.num_rows() {
        let cause = cause_category(cell(&causes, row).unwrap_or_default());
        let Some(method) = suicide_method(cause) else {
            continue;
        };
        let Some(date) = cell(&dates, row).and_then(decode_date) else {
            invalid_dates += 1;
            continue;
        };

        let region = cell(&regions, row).and_then(|code| code.parse::<i64>().ok());
        let age = cell(&ages, row).and_then(decode_age);
        let time = cell(&times, row).map(str::to_string);
        let translate = |field: CodedField, values: &[Option<String>]| {
            cell(values, row).and_then(|code| field.translate(code))
        };

        records.push(MortalityRecord {
            date,
            day_period: time.as_deref().and_then(day_period),
            time,
            cause: cause.to_string(),
            place: translate(CodedField::PlaceOfDeath, &places),
            region,
            age,
            sex: translate(CodedField::Sex, &sexes),
            race: translate(CodedField::Race, &races),
            education: translate(CodedField::Education, &educations),
            marital_status: translate(CodedField::MaritalStatus, &marital),
            calendar: CalendarFeatures::derive(date, holidays),
            state: region.and_then(state_of_region),
            age_group: age.and_then(|age| age_group(age, age_bins)),
            method,
        });
    }

    log_dropped_rows(
        "SIM suicide records",
        invalid_dates,
        records.len() + invalid_dates,
        "invalid date of death",
    );
    debug_assert!(records.iter().all(|r| is_suicide_code(&r.cause)));
    log::info!(
        "Selected {} suicide records out of {} raw records",
        records.len(),
        raw.num_rows()
    );
    Ok(records)
}

/// `(CODMUN, year)` of every record with a known municipality
#[must_use]
pub fn region_events(records: &[MortalityRecord]) -> Vec<(i64, i32)> {
    records
        .iter()
        .filter_map(|r| Some((r.region?, r.calendar.year)))
        .collect()
}

/// Left-join records with the region table and build the enriched table
///
/// Records whose municipality is unknown keep null region columns.
pub fn enrich(records: &[MortalityRecord], regions: &[RegionAggregate]) -> Result<RecordBatch> {
    let by_code: FxHashMap<i64, &RegionAggregate> = regions.iter().map(|r| (r.code, r)).collect();
    let joined: Vec<Option<&RegionAggregate>> = records
        .iter()
        .map(|r| r.region.and_then(|code| by_code.get(&code).copied()))
        .collect();
    let unmatched = joined.iter().filter(|r| r.is_none()).count();
    if unmatched > 0 {
        log::debug!("{unmatched} records did not match any region");
    }

    let strings = |f: &dyn Fn(&MortalityRecord) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from_iter(records.iter().map(f)))
    };
    let ints = |f: &dyn Fn(&MortalityRecord) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(records.iter().map(f)))
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from_iter_values(
            records.iter().map(|r| Date32Type::from_naive_date(r.date)),
        )),
        strings(&|r| r.time.as_deref()),
        strings(&|r| Some(r.cause.as_str())),
        strings(&|r| r.place),
        Arc::new(Int64Array::from_iter(records.iter().map(|r| r.region))),
        Arc::new(Float64Array::from_iter(records.iter().map(|r| r.age))),
        strings(&|r| r.sex),
        strings(&|r| r.race),
        strings(&|r| r.education),
        strings(&|r| r.marital_status),
        ints(&|r| i64::from(r.calendar.year)),
        ints(&|r| i64::from(r.calendar.month)),
        ints(&|r| i64::from(r.calendar.day)),
        strings(&|r| Some(r.calendar.season.display_name())),
        strings(&|r| Some(r.calendar.weekday)),
        Arc::new(BooleanArray::from_iter(
            records.iter().map(|r| Some(r.calendar.holiday)),
        )),
        strings(&|r| r.state),
        Arc::new(StringArray::from_iter(
            joined.iter().map(|r| r.and_then(|r| r.name.as_deref())),
        )),
        Arc::new(Int64Array::from_iter(joined.iter().map(|r| r.map(|r| r.population)))),
        Arc::new(Float64Array::from_iter(
            joined.iter().map(|r| r.and_then(|r| r.facility_rate)),
        )),
        Arc::new(Float64Array::from_iter(
            joined.iter().map(|r| r.and_then(|r| r.average_suicide_rate)),
        )),
        strings(&|r| r.age_group.as_deref()),
        strings(&|r| Some(r.method)),
        strings(&|r| r.day_period.map(DayPeriod::display_name)),
    ];

    Ok(RecordBatch::try_new(enriched_mortality_schema(), columns)?)
}
