//! Arrow schemas of the tables the pipeline produces.

pub mod facilities;
pub mod mortality;
pub mod regions;

pub use facilities::{FACILITY_SELECTION, facilities_schema};
pub use mortality::{MORTALITY_SELECTION, enriched_mortality_schema};
pub use regions::{population_schema, region_schema};
