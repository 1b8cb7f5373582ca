//! Utility modules shared across the pipeline and the clustering engine.

pub mod arrow;
pub mod io;
pub mod logging;
