//! Feature derivation
//!
//! Stateless functions mapping the raw date, time and code fields of a
//! mortality record to derived categorical features. Everything that depends
//! on configuration (holiday calendar, age bins) is passed in explicitly.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::lookup::calendar::{HolidayCalendar, Season, weekday_name};

/// Period of the day an event happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPeriod {
    /// 00:00 - 05:59
    Night,
    /// 06:00 - 11:59
    Morning,
    /// 12:00 - 17:59
    Afternoon,
    /// 18:00 - 23:59
    Evening,
}

impl DayPeriod {
    /// Label stored in the enriched table
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Night => "Night",
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
        }
    }
}

impl fmt::Display for DayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Map an `HHMM` time-of-day string to a [`DayPeriod`]
///
/// Non-numeric input and numeric values outside `[0, 2400)` (e.g. the `9999`
/// "unknown" sentinel) yield `None`.
#[must_use]
pub fn day_period(time: &str) -> Option<DayPeriod> {
    if time.is_empty() || !time.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: u32 = time.parse().ok()?;
    match value {
        0..600 => Some(DayPeriod::Night),
        600..1200 => Some(DayPeriod::Morning),
        1200..1800 => Some(DayPeriod::Afternoon),
        1800..2400 => Some(DayPeriod::Evening),
        _ => None,
    }
}

/// Decode a `DDMMYYYY` date; 7-digit values have lost their leading zero
#[must_use]
pub fn decode_date(raw: &str) -> Option<NaiveDate> {
    match raw.len() {
        8 => NaiveDate::parse_from_str(raw, "%d%m%Y").ok(),
        7 => NaiveDate::parse_from_str(&format!("0{raw}"), "%d%m%Y").ok(),
        _ => None,
    }
}

/// Decode a 3-character registry age code into years
///
/// The first digit is the unit (0 minutes, 1 hours, 2 days, 3 months,
/// 4 years, 5 hundreds of years plus the remainder), the rest the amount.
#[must_use]
pub fn decode_age(code: &str) -> Option<f64> {
    let mut chars = code.chars();
    let unit = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let amount: f64 = rest.parse().ok()?;
    match unit {
        '0' => Some(amount / (365.0 * 24.0 * 60.0)),
        '1' => Some(amount / (365.0 * 24.0)),
        '2' => Some(amount / 365.0),
        '3' => Some(amount / 12.0),
        '4' => Some(amount),
        '5' => Some(100.0 + amount),
        _ => None,
    }
}

/// Label of the `(lower, upper]` bucket `age` falls into
///
/// Ages at or below the first edge, or above the last, have no bucket.
#[must_use]
pub fn age_group(age: f64, bins: &[f64]) -> Option<String> {
    if age.is_nan() {
        return None;
    }
    bins.windows(2)
        .find(|edge| edge[0] < age && age <= edge[1])
        .map(|edge| format!("({}, {}]", edge[0], edge[1]))
}

/// Calendar features derived from an event date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub season: Season,
    pub weekday: &'static str,
    pub holiday: bool,
}

impl CalendarFeatures {
    /// Derive every calendar feature of `date`
    #[must_use]
    pub fn derive(date: NaiveDate, holidays: &HolidayCalendar) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            season: Season::from_date(date),
            weekday: weekday_name(date.weekday()),
            holiday: holidays.is_near_holiday(date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HolidayConfig;

    #[test]
    fn test_day_period() {
        assert_eq!(day_period("0530"), Some(DayPeriod::Night));
        assert_eq!(day_period("0000"), Some(DayPeriod::Night));
        assert_eq!(day_period("0600"), Some(DayPeriod::Morning));
        assert_eq!(day_period("1759"), Some(DayPeriod::Afternoon));
        assert_eq!(day_period("1800"), Some(DayPeriod::Evening));
        assert_eq!(day_period("2359"), Some(DayPeriod::Evening));
        assert_eq!(day_period("2400"), None);
        assert_eq!(day_period("9999"), None);
        assert_eq!(day_period("abcd"), None);
        assert_eq!(day_period(""), None);
        assert_eq!(day_period("-100"), None);
    }

    #[test]
    fn test_decode_date() {
        assert_eq!(decode_date("20032015"), NaiveDate::from_ymd_opt(2015, 3, 20));
        assert_eq!(decode_date("5012016"), NaiveDate::from_ymd_opt(2016, 1, 5));
        assert_eq!(decode_date("32132015"), None);
        assert_eq!(decode_date("2015"), None);
    }

    #[test]
    fn test_decode_age() {
        assert_eq!(decode_age("435"), Some(35.0));
        assert_eq!(decode_age("502"), Some(102.0));
        assert_eq!(decode_age("306"), Some(0.5));
        assert_eq!(decode_age("999"), None);
        assert_eq!(decode_age("4"), None);
        assert_eq!(decode_age("4ab"), None);
    }

    #[test]
    fn test_age_group() {
        let bins: Vec<f64> = (1..=10).map(|i| f64::from(i * 10)).collect();
        assert_eq!(age_group(35.0, &bins).as_deref(), Some("(30, 40]"));
        assert_eq!(age_group(20.0, &bins).as_deref(), Some("(10, 20]"));
        assert_eq!(age_group(100.0, &bins).as_deref(), Some("(90, 100]"));
        assert_eq!(age_group(10.0, &bins), None);
        assert_eq!(age_group(101.0, &bins), None);
        assert_eq!(age_group(f64::NAN, &bins), None);
    }

    #[test]
    fn test_calendar_features() {
        let calendar = HolidayCalendar::new(&HolidayConfig::default());
        let features =
            CalendarFeatures::derive(NaiveDate::from_ymd_opt(2015, 12, 26).unwrap(), &calendar);
        assert_eq!(features.year, 2015);
        assert_eq!(features.month, 12);
        assert_eq!(features.day, 26);
        assert_eq!(features.season, Season::Summer);
        assert_eq!(features.weekday, "Saturday");
        assert!(features.holiday);
    }
}
