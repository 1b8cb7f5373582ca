//! Static lookup tables: administrative regions, cause-of-death groupings,
//! categorical translations and calendar rules.

pub mod calendar;
pub mod dictionary;
pub mod methods;
pub mod states;
pub mod translations;

pub use calendar::{HolidayCalendar, Jurisdiction, Season, weekday_name};
pub use dictionary::data_dictionary;
pub use methods::{cause_category, is_suicide_code, suicide_method};
pub use states::state_of_region;
pub use translations::{CodedField, facility_nature};
