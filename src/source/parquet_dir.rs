//! Source backed by a directory of pre-downloaded Parquet pages.
//!
//! Layout: `<root>/<DATASET>/*.parquet` and `<root>/POPULATION/*.parquet`.
//! A page belongs to (region, year) when its upper-cased file stem contains
//! `<UF><YYYY>`, `<UF>_<YYYY>` or `<UF><YY>` (e.g. `DOPR2015`, `STSC1501`).

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;

use super::{DataSource, Dataset, POPULATION_DATASET};
use crate::error::{Result, SimError};
use crate::utils::arrow::concat_pages;
use crate::utils::io::{find_parquet_files, read_parquet_table};
use crate::utils::logging::{create_main_progress_bar, finish_progress_bar};

/// Serves registry pages from local Parquet files
#[derive(Debug, Clone)]
pub struct ParquetDirectorySource {
    root: PathBuf,
}

impl ParquetDirectorySource {
    /// Source reading from `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dataset_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Whether a page file stem belongs to `region` and `year`
#[must_use]
pub fn page_matches(stem: &str, region: &str, year: i32) -> bool {
    let stem = stem.to_uppercase();
    let region = region.to_uppercase();
    let short_year = year.rem_euclid(100);
    [
        format!("{region}{year}"),
        format!("{region}_{year}"),
        format!("{region}{short_year:02}"),
    ]
    .iter()
    .any(|pattern| stem.contains(pattern.as_str()))
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

impl DataSource for ParquetDirectorySource {
    fn fetch(
        &self,
        dataset: Dataset,
        regions: &[String],
        years: &[i32],
    ) -> Result<Vec<RecordBatch>> {
        let dir = self.dataset_dir(dataset.name());
        let files = find_parquet_files(&dir)
            .map_err(|e| SimError::source_unavailable(dataset.name(), e))?;

        let wanted = regions.len() * years.len();
        let pb = create_main_progress_bar(wanted as u64, Some("Fetching pages"));
        let mut pages = Vec::new();

        for region in regions {
            for &year in years {
                let matching: Vec<&PathBuf> = files
                    .iter()
                    .filter(|path| page_matches(file_stem(path), region, year))
                    .collect();
                if matching.is_empty() {
                    return Err(SimError::source_unavailable(
                        dataset.name(),
                        format!("no page for {region} {year} in {}", dir.display()),
                    ));
                }
                for path in matching {
                    pages.push(
                        read_parquet_table(path)
                            .map_err(|e| SimError::source_unavailable(dataset.name(), e))?,
                    );
                }
                pb.inc(1);
            }
        }

        finish_progress_bar(&pb, Some("Pages fetched"));
        log::info!(
            "Fetched {} {} pages for {} region(s) and {} year(s)",
            pages.len(),
            dataset,
            regions.len(),
            years.len()
        );
        Ok(pages)
    }

    fn fetch_population_table(&self) -> Result<RecordBatch> {
        let dir = self.dataset_dir(POPULATION_DATASET);
        let files = find_parquet_files(&dir)
            .map_err(|e| SimError::source_unavailable(POPULATION_DATASET, e))?;
        if files.is_empty() {
            return Err(SimError::source_unavailable(
                POPULATION_DATASET,
                format!("no population table in {}", dir.display()),
            ));
        }
        let pages = files
            .iter()
            .map(|path| read_parquet_table(path))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| SimError::source_unavailable(POPULATION_DATASET, e))?;
        concat_pages(&pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::io::write_parquet_atomic;
    use arrow::array::{ArrayRef, StringArray};
    use std::sync::Arc;

    #[test]
    fn test_page_matches() {
        assert!(page_matches("DOPR2015", "PR", 2015));
        assert!(page_matches("stsc1501", "SC", 2015));
        assert!(page_matches("sim_RS_2019", "RS", 2019));
        assert!(!page_matches("DOPR2015", "SC", 2015));
        assert!(!page_matches("DOPR2015", "PR", 2016));
    }

    #[test]
    fn test_missing_page_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let page = RecordBatch::try_from_iter(vec![(
            "CAUSABAS",
            Arc::new(StringArray::from(vec!["X700"])) as ArrayRef,
        )])
        .unwrap();
        write_parquet_atomic(&dir.path().join("SIM").join("DOPR2015.parquet"), &page).unwrap();

        let source = ParquetDirectorySource::new(dir.path());
        let pages = source
            .fetch(Dataset::Mortality, &["PR".to_string()], &[2015])
            .unwrap();
        assert_eq!(pages.len(), 1);

        let err = source
            .fetch(Dataset::Mortality, &["PR".to_string()], &[2015, 2016])
            .unwrap_err();
        assert!(matches!(err, SimError::SourceUnavailable { .. }));

        let err = source.fetch_population_table().unwrap_err();
        assert!(matches!(err, SimError::SourceUnavailable { .. }));
    }
}
