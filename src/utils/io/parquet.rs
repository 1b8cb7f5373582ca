//! Parquet file operations
//!
//! Reading Parquet files into a single Arrow table, atomic table writes, and
//! Parquet file discovery.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use tempfile::NamedTempFile;

use crate::error::{Result, SimError};
use crate::utils::logging::{TableIo, log_table_io_done, log_table_io_start, log_warning};

/// Default batch size for Parquet reading
pub const DEFAULT_BATCH_SIZE: usize = 16384;

/// Validates that a directory exists and is a directory
///
/// # Errors
/// Returns an error if the directory does not exist or is not a directory
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(SimError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Directory does not exist: {}", dir.display()),
        )));
    }
    Ok(())
}

/// Read a Parquet file into a single Arrow table
///
/// Schema-level metadata is dropped so a table read back compares equal to
/// the table that was written.
///
/// # Arguments
/// * `path` - Path to the Parquet file
///
/// # Returns
/// All row groups concatenated into one `RecordBatch`; an empty file yields
/// an empty table with the stored schema
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid Parquet
pub fn read_parquet_table(path: &Path) -> Result<RecordBatch> {
    let start = std::time::Instant::now();
    log_table_io_start(TableIo::Read, path);

    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(DEFAULT_BATCH_SIZE);
    let schema = Arc::new(Schema::new(builder.schema().fields().clone()));
    let reader = builder.build()?;

    let batches = reader
        .map(|batch| -> Result<RecordBatch> {
            let batch = batch?;
            Ok(RecordBatch::try_new(
                Arc::clone(&schema),
                batch.columns().to_vec(),
            )?)
        })
        .collect::<Result<Vec<_>>>()?;

    let table = arrow::compute::concat_batches(&schema, &batches)?;
    log_table_io_done(
        TableIo::Read,
        path,
        table.num_rows(),
        table.num_columns(),
        start.elapsed(),
    );
    Ok(table)
}

/// Write a table to `path` atomically
///
/// The table is written and flushed to a temporary file in the target
/// directory, then renamed over `path`. Readers observe either the previous
/// file or the complete new one.
///
/// # Errors
/// Returns an error if the directory cannot be created or the write fails
pub fn write_parquet_atomic(path: &Path, table: &RecordBatch) -> Result<()> {
    let start = std::time::Instant::now();
    log_table_io_start(TableIo::Write, path);

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = ArrowWriter::try_new(tmp.as_file_mut(), table.schema(), Some(props))?;
        writer.write(table)?;
        writer.close()?;
    }
    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SimError::Io(e.error))?;

    log_table_io_done(
        TableIo::Write,
        path,
        table.num_rows(),
        table.num_columns(),
        start.elapsed(),
    );
    Ok(())
}

/// Find all Parquet files in a directory, sorted by file name
///
/// # Errors
/// Returns an error if the directory cannot be read
pub fn find_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(dir)?;

    let parquet_files = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "parquet"))
        .sorted()
        .collect_vec();

    if parquet_files.is_empty() {
        log_warning("No Parquet files found in directory", Some(dir));
    } else {
        log::debug!("Found {} parquet files in {}", parquet_files.len(), dir.display());
    }

    Ok(parquet_files)
}
