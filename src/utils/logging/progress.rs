//! Progress reporting for the long blocking steps (source fetch, distance
//! matrix construction), using the indicatif crate.

use indicatif::{ProgressBar, ProgressStyle};

/// Default style for a main progress bar
pub const DEFAULT_MAIN_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}) {msg}";

/// Work below this many units is not worth drawing a bar for
pub const MIN_VISIBLE_LENGTH: u64 = 1_000;

/// Create a main progress bar with a standardized style
///
/// # Arguments
/// * `length` - Total length for the progress bar
/// * `description` - Optional description to display as the initial message
///
/// # Returns
/// A configured `ProgressBar`, hidden when `length` is below [`MIN_VISIBLE_LENGTH`]
#[must_use]
pub fn create_main_progress_bar(length: u64, description: Option<&str>) -> ProgressBar {
    if length < MIN_VISIBLE_LENGTH {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(length);
    let style = ProgressStyle::default_bar()
        .template(DEFAULT_MAIN_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    if let Some(desc) = description {
        pb.set_message(desc.to_string());
    }

    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
