use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;
use sim_analytics::{DataSource, Dataset, PipelineConfig, Result, SimError};

/// Municipality codes of the synthetic dataset
pub const CURITIBA: i64 = 410690;
pub const JOINVILLE: i64 = 420910;

/// Build a page of string columns
#[must_use]
pub fn page(columns: &[(&str, Vec<&str>)]) -> RecordBatch {
    RecordBatch::try_from_iter(columns.iter().map(|(name, values)| {
        (
            *name,
            Arc::new(StringArray::from(values.clone())) as ArrayRef,
        )
    }))
    .expect("valid test page")
}

/// One SIM page; rows are (date, time, cause, municipality, age)
#[must_use]
pub fn sim_page(rows: &[(&str, &str, &str, &str, &str)]) -> RecordBatch {
    let n = rows.len();
    page(&[
        ("DTOBITO", rows.iter().map(|r| r.0).collect()),
        ("HORAOBITO", rows.iter().map(|r| r.1).collect()),
        ("CAUSABAS", rows.iter().map(|r| r.2).collect()),
        ("LOCOCOR", vec!["3"; n]),
        ("CODMUNRES", rows.iter().map(|r| r.3).collect()),
        ("IDADE", rows.iter().map(|r| r.4).collect()),
        ("SEXO", vec!["1"; n]),
        ("RACACOR", vec!["1"; n]),
        ("ESC", vec!["4"; n]),
        ("ESTCIV", vec!["1"; n]),
    ])
}

/// One CNES page; rows are (id, competence, municipality, unit type, psychotherapy, social service)
#[must_use]
pub fn cnes_page(rows: &[(&str, &str, &str, &str, &str, &str)]) -> RecordBatch {
    let n = rows.len();
    page(&[
        ("CNES", rows.iter().map(|r| r.0).collect()),
        ("COMPETEN", rows.iter().map(|r| r.1).collect()),
        ("CODUFMUN", rows.iter().map(|r| r.2).collect()),
        ("NATUREZA", vec!["01"; n]),
        ("TP_UNID", rows.iter().map(|r| r.3).collect()),
        ("SERAP02P", rows.iter().map(|r| r.4).collect()),
        ("SERAP02T", rows.iter().map(|r| r.5).collect()),
    ])
}

/// In-memory source recording every fetch
#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<(Dataset, String, i32), RecordBatch>,
    population: Option<RecordBatch>,
    fail: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeSource {
    /// Two states, two years: 5 suicide records and 3 other deaths
    #[must_use]
    pub fn synthetic() -> Self {
        let mut pages = HashMap::new();
        let mut add = |dataset, region: &str, year, batch| {
            pages.insert((dataset, region.to_string(), year), batch);
        };

        add(
            Dataset::Mortality,
            "PR",
            2015,
            sim_page(&[
                ("20032015", "0530", "X700", "410690", "435"),
                ("21032015", "1000", "I219", "410690", "470"),
            ]),
        );
        add(
            Dataset::Mortality,
            "PR",
            2016,
            sim_page(&[
                ("05062016", "1430", "X800", "410690", "452"),
                ("25122016", "2010", "X720", "410690", "428"),
            ]),
        );
        add(
            Dataset::Mortality,
            "SC",
            2015,
            sim_page(&[
                ("10102015", "0800", "X640", "420910", "461"),
                ("11102015", "0900", "J189", "420910", "480"),
            ]),
        );
        add(
            Dataset::Mortality,
            "SC",
            2016,
            sim_page(&[
                ("1012016", "1100", "X700", "420910", "419"),
                ("02012016", "1200", "C349", "420910", "455"),
            ]),
        );

        add(
            Dataset::Facilities,
            "PR",
            2015,
            cnes_page(&[
                ("1", "201501", "410690", "39", "0", "0"),
                ("2", "201501", "410690", "05", "1", "0"),
            ]),
        );
        add(
            Dataset::Facilities,
            "PR",
            2016,
            cnes_page(&[("1", "201601", "410690", "39", "0", "0")]),
        );
        add(
            Dataset::Facilities,
            "SC",
            2015,
            cnes_page(&[("3", "201501", "420910", "05", "0", "0")]),
        );
        add(
            Dataset::Facilities,
            "SC",
            2016,
            cnes_page(&[("4", "201601", "420910", "05", "0", "1")]),
        );

        Self {
            pages,
            population: Some(page(&[
                ("D1C", vec!["4106902", "4209102"]),
                ("D1N", vec!["Curitiba - PR", "Joinville - SC"]),
                ("V", vec!["100000", "50000"]),
            ])),
            ..Self::default()
        }
    }

    /// Add or replace the page served for `(dataset, region, year)`
    #[must_use]
    pub fn with_page(mut self, dataset: Dataset, region: &str, year: i32, page: RecordBatch) -> Self {
        self.pages.insert((dataset, region.to_string(), year), page);
        self
    }

    /// A source whose every fetch fails
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Fetches served so far, as `DATASET` or `DATASET:REGIONS:YEARS`
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl DataSource for FakeSource {
    fn fetch(&self, dataset: Dataset, regions: &[String], years: &[i32]) -> Result<Vec<RecordBatch>> {
        self.calls.borrow_mut().push(format!(
            "{dataset}:{}:{}",
            regions.join(","),
            years.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        ));
        if self.fail {
            return Err(SimError::source_unavailable(dataset.name(), "connection refused"));
        }
        let mut pages = Vec::new();
        for region in regions {
            for year in years {
                let page = self
                    .pages
                    .get(&(dataset, region.clone(), *year))
                    .ok_or_else(|| {
                        SimError::source_unavailable(dataset.name(), format!("no page {region} {year}"))
                    })?;
                pages.push(page.clone());
            }
        }
        Ok(pages)
    }

    fn fetch_population_table(&self) -> Result<RecordBatch> {
        self.calls.borrow_mut().push("POPULATION".to_string());
        if self.fail {
            return Err(SimError::source_unavailable("POPULATION", "connection refused"));
        }
        self.population
            .clone()
            .ok_or_else(|| SimError::source_unavailable("POPULATION", "no table"))
    }
}

/// Configuration over a temporary cache directory
#[must_use]
pub fn test_config(cache_dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::with_cache_dir(cache_dir);
    config.regions = vec!["PR".to_string(), "SC".to_string()];
    config.years = vec![2015, 2016];
    config
}

/// Selection helper
#[must_use]
pub fn regions(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}
