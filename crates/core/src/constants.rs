//! Constants used throughout the medstat core crate.
//!
//! Defaults for configuration, fixed labels shared by the aggregator and narrative generator, and
//! the breakdown names that make up every report.

/// Earliest reporting year accepted when no explicit range is configured.
pub const DEFAULT_MIN_YEAR: i32 = 1900;

/// Latest reporting year accepted when no explicit range is configured.
pub const DEFAULT_MAX_YEAR: i32 = 2100;

/// Organisation name used in narratives when none is configured.
pub const DEFAULT_ORGANISATION_NAME: &str = "the hospital";

/// Label of the bucket that collects unknown or blank categorical values.
pub const OTHER_LABEL: &str = "Other";

/// Sentence used for every narrative section when a report has no records.
pub const NO_DATA_AVAILABLE: &str = "No data available for this period.";

/// English day names, indexed by ISO weekday number minus one (Monday first).
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const MONTHLY_BREAKDOWN: &str = "monthly";
pub const DAILY_BREAKDOWN: &str = "daily";
pub const DAY_OF_WEEK_BREAKDOWN: &str = "day_of_week";
pub const HOUR_OF_DAY_BREAKDOWN: &str = "hour_of_day";
pub const STATUS_BREAKDOWN: &str = "status";
pub const CATEGORY_BREAKDOWN: &str = "category";
pub const MONTHLY_BY_CATEGORY_BREAKDOWN: &str = "monthly_by_category";
pub const DAILY_BY_CATEGORY_BREAKDOWN: &str = "daily_by_category";
