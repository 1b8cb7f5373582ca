//! Log lines for cache tiers, table files and row-level data quality.
//!
//! Every tier transition of the pipeline goes through [`log_cache_event`] so a
//! run's log reads as a trace of which selection came from where.

use std::fmt;
use std::path::Path;
use std::time::Duration;

/// What happened to a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    Hit,
    Miss,
    /// Entry written with this many rows
    Stored(usize),
    Invalidated,
}

/// Log a cache transition for `(tier, key)`
///
/// Hits and misses are `info`, stores carry the row count, invalidations are
/// `debug`.
pub fn log_cache_event(tier: impl fmt::Display, key: impl fmt::Display, event: CacheEvent) {
    match event {
        CacheEvent::Hit => log::info!("Cache hit: {tier} {key}"),
        CacheEvent::Miss => log::info!("Cache miss: {tier} {key}"),
        CacheEvent::Stored(rows) => log::info!("Cached {rows} rows as {tier} {key}"),
        CacheEvent::Invalidated => log::debug!("Invalidated {tier} {key}"),
    }
}

/// Direction of a table file transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableIo {
    Read,
    Write,
}

/// Log the start of a table file transfer at `debug`
pub fn log_table_io_start(io: TableIo, path: &Path) {
    match io {
        TableIo::Read => log::debug!("Reading table from {}", path.display()),
        TableIo::Write => log::debug!("Writing table to {}", path.display()),
    }
}

/// Log a finished table file transfer with its row and column count
pub fn log_table_io_done(io: TableIo, path: &Path, rows: usize, columns: usize, elapsed: Duration) {
    let verb = match io {
        TableIo::Read => "Read",
        TableIo::Write => "Wrote",
    };
    log::debug!(
        "{verb} {rows} rows x {columns} columns at {} in {elapsed:?}",
        path.display()
    );
}

/// Warn about rows a cleaning stage discarded
///
/// Nothing is logged when `dropped` is zero.
///
/// # Arguments
/// * `stage` - Table or stage the rows belonged to, e.g. `"population"`
/// * `dropped` - Number of discarded rows
/// * `total` - Rows the stage started with
/// * `reason` - Why the rows were discarded
pub fn log_dropped_rows(stage: &str, dropped: usize, total: usize, reason: &str) {
    if dropped == 0 {
        return;
    }
    log::warn!("{stage}: dropped {dropped} of {total} rows ({reason})");
}

/// Log a warning, optionally tied to a file
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => log::warn!("{message}: {}", path.display()),
        None => log::warn!("{message}"),
    }
}
