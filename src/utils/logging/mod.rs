//! Logging utilities for log output and progress tracking

pub mod log;
pub mod progress;

pub use self::log::{
    CacheEvent, TableIo, log_cache_event, log_dropped_rows, log_table_io_done, log_table_io_start,
    log_warning,
};
pub use self::progress::{create_main_progress_bar, finish_progress_bar};
