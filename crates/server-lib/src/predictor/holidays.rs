//! National-holiday calendar collaborator
//!
//! The calendar is exported by the offline pipeline as a plain list of
//! ISO dates covering the current and next calendar year. When the
//! export is absent the off-day feature degrades to weekend-only; that
//! degradation is silent at request time and logged once at startup.

use std::collections::HashSet;

use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Parse a list of `YYYY-MM-DD` strings, skipping unparseable entries
    pub fn from_iso_dates<S: AsRef<str>>(raw: &[S]) -> Self {
        Self {
            dates: raw
                .iter()
                .filter_map(|s| NaiveDate::parse_from_str(s.as_ref(), "%Y-%m-%d").ok())
                .collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
