//! Calendar rules: seasons, weekday names and public holidays.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::config::HolidayConfig;

/// Leap year every date is re-anchored to before the season lookup
pub const SEASON_REFERENCE_YEAR: i32 = 2000;

/// Seasons of the year, Southern-hemisphere convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    /// Dec 21 - Mar 20
    Summer,
    /// Mar 21 - Jun 20
    Autumn,
    /// Jun 21 - Sep 22
    Winter,
    /// Sep 23 - Dec 20
    Spring,
}

impl Season {
    /// Season a date falls into
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        // 2000 is a leap year, so Feb 29 always survives the re-anchoring
        let anchored = date
            .with_year(SEASON_REFERENCE_YEAR)
            .unwrap_or(date);
        let md = (anchored.month(), anchored.day());
        match md {
            (1, _) | (2, _) => Self::Summer,
            (3, d) if d <= 20 => Self::Summer,
            (3, _) | (4, _) | (5, _) => Self::Autumn,
            (6, d) if d <= 20 => Self::Autumn,
            (6, _) | (7, _) | (8, _) => Self::Winter,
            (9, d) if d <= 22 => Self::Winter,
            (9, _) | (10, _) | (11, _) => Self::Spring,
            (12, d) if d <= 20 => Self::Spring,
            _ => Self::Summer,
        }
    }

    /// Label stored in the enriched table
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
            Self::Spring => "Spring",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// English weekday name, Monday first
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Jurisdictions with a known public-holiday calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Jurisdiction {
    /// Brazilian national holidays
    #[default]
    Brazil,
}

impl Jurisdiction {
    /// Public holidays observed in `year`
    #[must_use]
    pub fn holidays(self, year: i32) -> Vec<NaiveDate> {
        match self {
            Self::Brazil => brazil_holidays(year),
        }
    }
}

/// Easter Sunday (Gregorian computus, anonymous algorithm)
#[must_use]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// National holidays; optional points such as Carnaval and Corpus Christi are not included
fn brazil_holidays(year: i32) -> Vec<NaiveDate> {
    let fixed: &[(u32, u32)] = &[
        (1, 1),   // Confraternização Universal
        (4, 21),  // Tiradentes
        (5, 1),   // Dia do Trabalhador
        (9, 7),   // Independência
        (10, 12), // Nossa Senhora Aparecida
        (11, 2),  // Finados
        (11, 15), // Proclamação da República
        (12, 25), // Natal
    ];
    let mut days: Vec<NaiveDate> = fixed
        .iter()
        .filter_map(|&(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .collect();
    if year >= 2024 {
        // Consciência Negra became national in 2024
        days.extend(NaiveDate::from_ymd_opt(year, 11, 20));
    }
    if let Some(easter) = easter_sunday(year) {
        days.push(easter - Duration::days(2)); // Sexta-feira Santa
    }
    days.sort_unstable();
    days
}

/// Public holidays of a jurisdiction, derived for whatever year a date falls in
#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    jurisdiction: Jurisdiction,
    window: Duration,
}

impl HolidayCalendar {
    /// Build the calendar described by `config`
    #[must_use]
    pub fn new(config: &HolidayConfig) -> Self {
        log::debug!(
            "Using {:?} holiday calendar with a {} day window",
            config.jurisdiction,
            config.window_days
        );
        Self {
            jurisdiction: config.jurisdiction,
            window: Duration::days(config.window_days.max(0)),
        }
    }

    /// Public holidays observed in `year`, sorted
    #[must_use]
    pub fn holidays_in(&self, year: i32) -> Vec<NaiveDate> {
        self.jurisdiction.holidays(year)
    }

    /// Whether `date` lies within the closed window around any holiday
    ///
    /// The window may reach into the neighbouring year, whose holidays are
    /// consulted as well.
    #[must_use]
    pub fn is_near_holiday(&self, date: NaiveDate) -> bool {
        let (Some(from), Some(to)) = (
            date.checked_sub_signed(self.window),
            date.checked_add_signed(self.window),
        ) else {
            return false;
        };
        (from.year()..=to.year())
            .flat_map(|year| self.holidays_in(year))
            .any(|holiday| from <= holiday && holiday <= to)
    }
}
