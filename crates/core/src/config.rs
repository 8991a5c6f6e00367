//! Engine runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the report assembler. Report generation never reads process-wide environment
//! variables, so concurrent requests always see the same settings.

use crate::constants::{DEFAULT_MAX_YEAR, DEFAULT_MIN_YEAR, DEFAULT_ORGANISATION_NAME};
use crate::{ReportError, ReportResult};
use medstat_types::NonEmptyText;

/// Years chrono can represent as calendar dates without overflow concerns.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    min_year: i32,
    max_year: i32,
    organisation_name: NonEmptyText,
    log_unknown_categories: bool,
}

impl EngineConfig {
    /// Create a new `EngineConfig`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if the year range is inverted or falls outside `1..=9999`.
    pub fn new(
        min_year: i32,
        max_year: i32,
        organisation_name: NonEmptyText,
        log_unknown_categories: bool,
    ) -> ReportResult<Self> {
        if !SUPPORTED_YEARS.contains(&min_year) || !SUPPORTED_YEARS.contains(&max_year) {
            return Err(ReportError::Config(format!(
                "year range {min_year}..={max_year} must lie within 1..=9999"
            )));
        }
        if min_year > max_year {
            return Err(ReportError::Config(format!(
                "min_year {min_year} is after max_year {max_year}"
            )));
        }

        Ok(Self {
            min_year,
            max_year,
            organisation_name,
            log_unknown_categories,
        })
    }

    /// Configuration with the default year range and unknown-category logging disabled.
    pub fn with_organisation(organisation_name: NonEmptyText) -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            max_year: DEFAULT_MAX_YEAR,
            organisation_name,
            log_unknown_categories: false,
        }
    }

    /// Build a configuration from optional raw environment values.
    ///
    /// Callers read the environment once at startup and pass the values in; `None` or blank
    /// values fall back to the defaults in [`crate::constants`].
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Config` if any value fails to parse or the resulting range is
    /// invalid.
    pub fn from_env_values(
        min_year: Option<String>,
        max_year: Option<String>,
        organisation_name: Option<String>,
        log_unknown_categories: Option<String>,
    ) -> ReportResult<Self> {
        Self::new(
            year_from_env_value("min_year", min_year, DEFAULT_MIN_YEAR)?,
            year_from_env_value("max_year", max_year, DEFAULT_MAX_YEAR)?,
            organisation_from_env_value(organisation_name)?,
            flag_from_env_value("log_unknown_categories", log_unknown_categories)?,
        )
    }

    pub fn min_year(&self) -> i32 {
        self.min_year
    }

    pub fn max_year(&self) -> i32 {
        self.max_year
    }

    pub fn organisation_name(&self) -> &NonEmptyText {
        &self.organisation_name
    }

    pub fn log_unknown_categories(&self) -> bool {
        self.log_unknown_categories
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a year bound from an optional string value, defaulting when absent or blank.
pub fn year_from_env_value(name: &str, value: Option<String>, default: i32) -> ReportResult<i32> {
    match non_blank(value) {
        None => Ok(default),
        Some(v) => v
            .parse::<i32>()
            .map_err(|e| ReportError::Config(format!("{name} must be an integer year: {e}"))),
    }
}

/// Parse the organisation name, falling back to [`DEFAULT_ORGANISATION_NAME`].
pub fn organisation_from_env_value(value: Option<String>) -> ReportResult<NonEmptyText> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_ORGANISATION_NAME.to_string());
    NonEmptyText::new(raw).map_err(|e| ReportError::Config(format!("organisation name: {e}")))
}

/// Parse a boolean flag. Accepts `true/false`, `yes/no`, `on/off` and `1/0`; absent means `false`.
pub fn flag_from_env_value(name: &str, value: Option<String>) -> ReportResult<bool> {
    let Some(v) = non_blank(value) else {
        return Ok(false);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(ReportError::Config(format!(
            "{name} must be a boolean flag, got '{other}'"
        ))),
    }
}
