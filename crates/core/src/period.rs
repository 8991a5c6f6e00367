//! Reporting periods: a calendar year, optionally narrowed to one month.

use crate::config::EngineConfig;
use crate::{ReportError, ReportResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use medstat_types::Month;
use serde::Serialize;

/// A validated reporting period.
///
/// Construction checks the year against the configured range and the month against `1..=12`, so
/// an invalid request is rejected before any record is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<Month>,
}

impl Period {
    /// Validate and build a period.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidPeriod` if the year lies outside the configured range or the
    /// month is not within `1..=12`.
    pub fn new(year: i32, month: Option<u32>, config: &EngineConfig) -> ReportResult<Self> {
        if year < config.min_year() || year > config.max_year() {
            return Err(ReportError::InvalidPeriod(format!(
                "year {year} is outside the supported range {}..={}",
                config.min_year(),
                config.max_year()
            )));
        }
        let month = month
            .map(Month::new)
            .transpose()
            .map_err(|e| ReportError::InvalidPeriod(e.to_string()))?;

        Ok(Self { year, month })
    }

    pub fn annual(year: i32, config: &EngineConfig) -> ReportResult<Self> {
        Self::new(year, None, config)
    }

    pub fn monthly(year: i32, month: u32, config: &EngineConfig) -> ReportResult<Self> {
        Self::new(year, Some(month), config)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn is_monthly(&self) -> bool {
        self.month.is_some()
    }

    /// The equivalent period one year earlier, used for year-over-year comparison.
    ///
    /// This is not re-validated against the configured range: the prior period of the earliest
    /// supported year is still a meaningful thing to ask the record source for.
    pub fn previous(&self) -> Period {
        Period {
            year: self.year - 1,
            month: self.month,
        }
    }

    /// Whether `timestamp` falls inside this period.
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        timestamp.year() == self.year
            && self
                .month
                .map_or(true, |m| timestamp.month() == m.number())
    }

    /// Number of day buckets for a daily breakdown of this period.
    ///
    /// For a monthly period this is the length of that month; an annual period has no daily
    /// breakdown and reports the longest possible month.
    pub fn days_in_month(&self) -> u32 {
        match self.month {
            Some(m) => days_in_month(self.year, m.number()),
            None => 31,
        }
    }

    /// Human-readable label, e.g. `"2024"` or `"March 2024"`.
    pub fn label(&self) -> String {
        match self.month {
            Some(m) => format!("{} {}", m.name(), self.year),
            None => self.year.to_string(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // Both dates exist for any year EngineConfig accepts (and its predecessor).
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => end.signed_duration_since(start).num_days() as u32,
        _ => 31,
    }
}
