//! Population table cleaning.

use arrow::record_batch::RecordBatch;

use crate::aggregation::RegionPopulation;
use crate::error::Result;
use crate::utils::arrow::string_values;
use crate::utils::logging::log_dropped_rows;

/// Drop the trailing check digit of a 7-digit municipality code
#[must_use]
pub fn strip_check_digit(code: &str) -> Option<i64> {
    let code = code.trim();
    let mut chars = code.chars();
    chars.next_back()?;
    let body = chars.as_str();
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    body.parse().ok()
}

/// Remove the `" - UF"` state suffix from a municipality name
#[must_use]
pub fn strip_state_suffix(name: &str) -> &str {
    let name = name.trim();
    match name.rsplit_once(" - ") {
        Some((head, uf)) if uf.len() == 2 && uf.chars().all(|c| c.is_ascii_uppercase()) => {
            head.trim_end()
        }
        _ => name,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_population(value: &str) -> Option<i64> {
    let value = value.trim();
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Clean the raw population table (`D1C`, `D1N`, `V`)
///
/// Rows whose code or population does not parse are dropped.
pub fn clean_population(raw: &RecordBatch) -> Result<Vec<RegionPopulation>> {
    let codes = string_values(raw, "D1C")?;
    let names = string_values(raw, "D1N")?;
    let populations = string_values(raw, "V")?;

    let regions: Vec<RegionPopulation> = codes
        .iter()
        .zip(&names)
        .zip(&populations)
        .filter_map(|((code, name), population)| {
            Some(RegionPopulation {
                code: strip_check_digit(code.as_deref()?)?,
                name: name.as_deref().map(|n| strip_state_suffix(n).to_string()),
                population: parse_population(population.as_deref()?)?,
            })
        })
        .collect();

    log_dropped_rows(
        "population",
        raw.num_rows() - regions.len(),
        raw.num_rows(),
        "unparseable code or population",
    );
    Ok(regions)
}
