use arrow::array::Array;
use sim_analytics::aggregation::regions_from_table;
use sim_analytics::query::{dataset_by_name, filter_selection};
use sim_analytics::utils::arrow::{f64_values, i64_values, string_values};
use sim_analytics::{CacheKey, CacheTier, Dataset, Pipeline, SimError};

use crate::utils::{CURITIBA, FakeSource, JOINVILLE, cnes_page, regions, sim_page, test_config};

const YEARS: [i32; 2] = [2015, 2016];

#[test]
fn test_end_to_end_acquisition() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let enriched = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR", "SC"]), &YEARS)
        .unwrap();
    assert_eq!(enriched.num_rows(), 5);

    for column in ["season", "weekday", "day_period", "age_group", "method", "state"] {
        let array = enriched.column_by_name(column).unwrap();
        assert_eq!(array.null_count(), 0, "column {column} has nulls");
    }
    let causes = string_values(&enriched, "CAUSABAS").unwrap();
    assert!(causes.iter().flatten().all(|c| c.starts_with('X')));

    let states = string_values(&enriched, "state").unwrap();
    assert_eq!(states.iter().flatten().filter(|s| *s == "PR").count(), 3);
    assert_eq!(states.iter().flatten().filter(|s| *s == "SC").count(), 2);

    // Curitiba: 1 and 2 events over 100 000 people; Joinville: 1 and 1 over 50 000
    let rates = f64_values(&enriched, "average_suicide_rate").unwrap();
    let codes = i64_values(&enriched, "CODMUN").unwrap();
    for (code, rate) in codes.iter().zip(&rates) {
        let expected = if *code == Some(CURITIBA) { 1.5 } else { 2.0 };
        assert!((rate.unwrap() - expected).abs() < 1e-9);
    }
}

#[test]
fn test_holiday_flag_in_recent_year() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::synthetic()
        .with_page(
            Dataset::Mortality,
            "PR",
            2021,
            sim_page(&[
                ("25122021", "2200", "X700", "410690", "440"),
                ("15032021", "1000", "X700", "410690", "440"),
            ]),
        )
        .with_page(
            Dataset::Facilities,
            "PR",
            2021,
            cnes_page(&[("1", "202101", "410690", "39", "0", "0")]),
        );
    let pipeline = Pipeline::new(source, test_config(dir.path()));

    let enriched = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR"]), &[2021])
        .unwrap();
    assert_eq!(
        string_values(&enriched, "holiday").unwrap(),
        vec![Some("true".to_string()), Some("false".to_string())]
    );
}

#[test]
fn test_region_table_aggregates() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let table = pipeline
        .region_table(&regions(&["PR", "SC"]), &YEARS)
        .unwrap();
    let aggregates = regions_from_table(&table).unwrap();
    assert_eq!(aggregates.len(), 2);

    let curitiba = aggregates.iter().find(|r| r.code == CURITIBA).unwrap();
    assert_eq!(curitiba.name.as_deref(), Some("Curitiba"));
    assert_eq!(curitiba.state.as_deref(), Some("PR"));
    assert_eq!(curitiba.population, 100_000);
    // facility 1 is listed in two months, facility 2 offers psychotherapy
    assert_eq!(curitiba.facilities, 2);
    assert!((curitiba.facility_rate.unwrap() - 0.02).abs() < 1e-12);
    assert!((curitiba.average_suicide_rate.unwrap() - 1.5).abs() < 1e-9);

    let joinville = aggregates.iter().find(|r| r.code == JOINVILLE).unwrap();
    assert_eq!(joinville.facilities, 1);
    assert!((joinville.average_suicide_rate.unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn test_second_request_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));
    let selection = regions(&["PR", "SC"]);

    let first = pipeline.acquire(Dataset::Mortality, &selection, &YEARS).unwrap();
    let fetches = pipeline_calls(&pipeline);
    assert_eq!(fetches, 3, "SIM, CNES and population are each fetched once");

    // same selection in a different order
    let second = pipeline
        .acquire(Dataset::Mortality, &regions(&["SC", "PR"]), &[2016, 2015])
        .unwrap();
    assert_eq!(pipeline_calls(&pipeline), fetches);
    assert_eq!(first, second);
}

#[test]
fn test_preprocessing_rebuilds_from_raw_tier() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));
    let selection = regions(&["PR", "SC"]);

    let first = pipeline.acquire(Dataset::Mortality, &selection, &YEARS).unwrap();
    let key = CacheKey::new(Dataset::Mortality.name(), &selection, &YEARS);
    assert!(pipeline.cache().contains(CacheTier::Raw, &key));
    pipeline
        .cache()
        .invalidate(CacheTier::Preprocessed, &key)
        .unwrap();

    let fetches = pipeline_calls(&pipeline);
    let rebuilt = pipeline.acquire(Dataset::Mortality, &selection, &YEARS).unwrap();
    assert_eq!(pipeline_calls(&pipeline), fetches);
    assert_eq!(first, rebuilt);
}

#[test]
fn test_broader_selection_is_a_cache_miss() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let narrow = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR"]), &[2015])
        .unwrap();
    assert_eq!(narrow.num_rows(), 1);

    let broad = pipeline
        .acquire(Dataset::Mortality, &regions(&["PR", "SC"]), &YEARS)
        .unwrap();
    assert_eq!(broad.num_rows(), 5);
    assert!(
        source(&pipeline)
            .calls()
            .contains(&"SIM:PR,SC:2015,2016".to_string())
    );

    let narrowed = filter_selection(&broad, &regions(&["PR"]), &[2015]).unwrap();
    assert_eq!(narrowed.num_rows(), 1);
    assert_eq!(
        string_values(&narrowed, "CAUSABAS").unwrap(),
        string_values(&narrow, "CAUSABAS").unwrap()
    );
}

#[test]
fn test_source_failure_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::failing(), test_config(dir.path()));
    let selection = regions(&["PR"]);

    let result = pipeline.acquire(Dataset::Mortality, &selection, &[2015]);
    assert!(matches!(result, Err(SimError::SourceUnavailable { .. })));

    let key = CacheKey::new(Dataset::Mortality.name(), &selection, &[2015]);
    assert!(!pipeline.cache().contains(CacheTier::Raw, &key));
    assert!(!pipeline.cache().contains(CacheTier::Preprocessed, &key));
}

#[test]
fn test_missing_page_is_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let result = pipeline.acquire(Dataset::Facilities, &regions(&["RS"]), &[2015]);
    assert!(matches!(result, Err(SimError::SourceUnavailable { .. })));
}

#[test]
fn test_empty_selection_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let result = pipeline.acquire(Dataset::Mortality, &[], &YEARS);
    assert!(matches!(result, Err(SimError::InvalidInput(_))));
    assert!(source(&pipeline).calls().is_empty());
}

#[test]
fn test_datasets_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(FakeSource::synthetic(), test_config(dir.path()));

    let facilities = dataset_by_name(&pipeline, "CNES").unwrap();
    // facility 3 offers neither psychosocial care nor social service
    assert_eq!(facilities.num_rows(), 4);
    assert_eq!(dataset_by_name(&pipeline, "REGIONS").unwrap().num_rows(), 2);
    assert!(matches!(
        dataset_by_name(&pipeline, "UNKNOWN"),
        Err(SimError::InvalidInput(_))
    ));
}

fn source(pipeline: &Pipeline<FakeSource>) -> &FakeSource {
    pipeline.source()
}

fn pipeline_calls(pipeline: &Pipeline<FakeSource>) -> usize {
    source(pipeline).calls().len()
}
