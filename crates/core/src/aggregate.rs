//! Grouping of raw records into buckets.
//!
//! Time-unit groupings are always *dense*: every key of the unit's domain is present, in
//! ascending order, with zero-count buckets where no record fell. Categorical groupings are
//! *sparse*: one bucket per value actually observed, with unknown or blank values folded into a
//! single trailing "Other" bucket. Every record lands in exactly one bucket of a breakdown.

use crate::constants::{DAY_NAMES, OTHER_LABEL};
use crate::period::Period;
use crate::profile::ReportProfile;
use crate::record::RawRecord;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Time unit of a dense breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Calendar month, 1 to 12.
    Month,
    /// Day of the month, 1 to the length of the period's month.
    DayOfMonth,
    /// ISO weekday, Monday = 1 to Sunday = 7.
    DayOfWeek,
    /// Hour of the day, 0 to 23.
    Hour,
}

impl TimeUnit {
    /// The full key domain of this unit for `period`.
    pub fn domain(self, period: &Period) -> RangeInclusive<u32> {
        match self {
            TimeUnit::Month => 1..=12,
            TimeUnit::DayOfMonth => 1..=period.days_in_month(),
            TimeUnit::DayOfWeek => 1..=7,
            TimeUnit::Hour => 0..=23,
        }
    }

    pub fn key_of(self, timestamp: &NaiveDateTime) -> u32 {
        match self {
            TimeUnit::Month => timestamp.month(),
            TimeUnit::DayOfMonth => timestamp.day(),
            TimeUnit::DayOfWeek => timestamp.weekday().number_from_monday(),
            TimeUnit::Hour => timestamp.hour(),
        }
    }

    /// Display label for a key of this unit.
    pub fn label(self, key: u32) -> String {
        match self {
            TimeUnit::Month => medstat_types::month_name(key)
                .map(str::to_string)
                .unwrap_or_else(|| key.to_string()),
            TimeUnit::DayOfMonth => key.to_string(),
            TimeUnit::DayOfWeek => key
                .checked_sub(1)
                .and_then(|i| DAY_NAMES.get(i as usize))
                .map(|d| d.to_string())
                .unwrap_or_else(|| key.to_string()),
            TimeUnit::Hour => format!("{key:02}:00"),
        }
    }

    /// Noun used in narrative text, e.g. "month".
    pub fn noun(self) -> &'static str {
        match self {
            TimeUnit::Month => "month",
            TimeUnit::DayOfMonth => "day",
            TimeUnit::DayOfWeek => "weekday",
            TimeUnit::Hour => "hour",
        }
    }
}

/// Identity of a bucket within its breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    Time(u32),
    Category(String),
    Other,
}

/// One grouping cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    key: BucketKey,
    label: String,
    count: u64,
    value_total: f64,
    /// Chart colour of a declared status; `None` for every other bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    colour: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    breakdown: Vec<Bucket>,
}

impl Bucket {
    pub fn new(key: BucketKey, label: impl Into<String>, count: u64) -> Self {
        Self {
            key,
            label: label.into(),
            count,
            value_total: 0.0,
            colour: None,
            breakdown: Vec::new(),
        }
    }

    pub fn with_colour(mut self, colour: &'static str) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn with_value_total(mut self, value_total: f64) -> Self {
        self.value_total = value_total;
        self
    }

    pub fn with_breakdown(mut self, breakdown: Vec<Bucket>) -> Self {
        self.breakdown = breakdown;
        self
    }

    pub fn key(&self) -> &BucketKey {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of the numeric payloads of the records in this bucket.
    pub fn value_total(&self) -> f64 {
        self.value_total
    }

    pub fn colour(&self) -> Option<&'static str> {
        self.colour
    }

    /// Sub-buckets of a cross-tabulation; empty otherwise.
    pub fn breakdown(&self) -> &[Bucket] {
        &self.breakdown
    }

    fn from_tally(key: BucketKey, label: String, tally: Tally) -> Self {
        Self::new(key, label, tally.count).with_value_total(tally.value_total)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    count: u64,
    value_total: f64,
}

impl Tally {
    fn add(&mut self, record: &RawRecord) {
        self.count += 1;
        if let Some(v) = record.finite_value() {
            self.value_total += v;
        }
    }
}

/// Group records into the dense, ascending domain of `unit`.
pub fn group_by_time<'a>(
    records: impl IntoIterator<Item = &'a RawRecord>,
    unit: TimeUnit,
    period: &Period,
) -> Vec<Bucket> {
    partition_by_time(records, unit, period)
        .into_iter()
        .map(|(key, members)| {
            let mut tally = Tally::default();
            members.iter().for_each(|r| tally.add(r));
            Bucket::from_tally(BucketKey::Time(key), unit.label(key), tally)
        })
        .collect()
}

/// Group records by status against the profile's closed vocabulary.
///
/// Buckets follow the vocabulary's declaration order and only statuses that occur are emitted.
/// Statuses outside the vocabulary go to a trailing "Other" bucket; when `log_unknown` is set each
/// occurrence is logged for data-quality review.
pub fn group_by_status<'a>(
    records: impl IntoIterator<Item = &'a RawRecord>,
    profile: &ReportProfile,
    log_unknown: bool,
) -> Vec<Bucket> {
    let mut known = vec![Tally::default(); profile.statuses.len()];
    let mut other = Tally::default();

    for record in records {
        let slot = profile
            .classify_status(&record.status)
            .and_then(|meta| profile.statuses.iter().position(|s| s.key == meta.key));
        match slot {
            Some(i) => known[i].add(record),
            None => {
                if log_unknown {
                    tracing::debug!(
                        record_id = record.id,
                        status = %record.status,
                        kind = %profile.kind,
                        "unknown status folded into Other"
                    );
                }
                other.add(record);
            }
        }
    }

    let mut buckets: Vec<Bucket> = profile
        .statuses
        .iter()
        .zip(known)
        .filter(|(_, tally)| tally.count > 0)
        .map(|(meta, tally)| {
            Bucket::from_tally(
                BucketKey::Category(meta.key.to_string()),
                meta.label.to_string(),
                tally,
            )
            .with_colour(meta.colour)
        })
        .collect();
    push_other(&mut buckets, other);
    buckets
}

/// Group records by their open category dimension.
///
/// Categories are trimmed and emitted in alphabetical order. Blank categories, and categories
/// that spell "Other" in any case, share the single trailing "Other" bucket.
pub fn group_by_category<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Vec<Bucket> {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut other = Tally::default();

    for record in records {
        let category = record.category.trim();
        if category.is_empty() || category.eq_ignore_ascii_case(OTHER_LABEL) {
            other.add(record);
        } else {
            tallies.entry(category).or_default().add(record);
        }
    }

    let mut buckets: Vec<Bucket> = tallies
        .into_iter()
        .map(|(category, tally)| {
            Bucket::from_tally(
                BucketKey::Category(category.to_string()),
                category.to_string(),
                tally,
            )
        })
        .collect();
    push_other(&mut buckets, other);
    buckets
}

/// Two-level grouping: dense time buckets on the outside, sparse category buckets inside.
pub fn cross_tabulate<'a>(
    records: impl IntoIterator<Item = &'a RawRecord>,
    unit: TimeUnit,
    period: &Period,
) -> Vec<Bucket> {
    partition_by_time(records, unit, period)
        .into_iter()
        .map(|(key, members)| {
            let mut tally = Tally::default();
            members.iter().for_each(|r| tally.add(r));
            let inner = group_by_category(members.iter().copied());
            Bucket::from_tally(BucketKey::Time(key), unit.label(key), tally).with_breakdown(inner)
        })
        .collect()
}

/// Split records into the dense key domain of `unit`, preserving input order within each key.
fn partition_by_time<'a>(
    records: impl IntoIterator<Item = &'a RawRecord>,
    unit: TimeUnit,
    period: &Period,
) -> Vec<(u32, Vec<&'a RawRecord>)> {
    let domain = unit.domain(period);
    let start = *domain.start();
    let mut slots: Vec<(u32, Vec<&'a RawRecord>)> = domain.map(|k| (k, Vec::new())).collect();

    for record in records {
        let key = unit.key_of(&record.timestamp);
        match key.checked_sub(start).and_then(|i| slots.get_mut(i as usize)) {
            Some((_, members)) => members.push(record),
            None => tracing::warn!(
                record_id = record.id,
                key,
                unit = ?unit,
                "record outside time domain skipped"
            ),
        }
    }

    slots
}

fn push_other(buckets: &mut Vec<Bucket>, other: Tally) {
    if other.count > 0 {
        buckets.push(Bucket::from_tally(
            BucketKey::Other,
            OTHER_LABEL.to_string(),
            other,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::record::ReportKind;
    use chrono::NaiveDate;
    use medstat_types::NonEmptyText;
    use proptest::prelude::*;

    fn config() -> EngineConfig {
        EngineConfig::with_organisation(NonEmptyText::new("Test Hospital").unwrap())
    }

    fn record(id: u64, month: u32, day: u32, hour: u32, status: &str, category: &str) -> RawRecord {
        let ts = NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        RawRecord::new(id, ts, status, category)
    }

    fn counts(buckets: &[Bucket]) -> Vec<u64> {
        buckets.iter().map(Bucket::count).collect()
    }

    #[test]
    fn monthly_grouping_is_dense_and_ordered() {
        let period = Period::annual(2024, &config()).unwrap();
        let mut records: Vec<RawRecord> = (0..5)
            .map(|i| record(i, 3, 10, 9, "COMPLETED", "Cardiology"))
            .collect();
        records.extend((5..12).map(|i| record(i, 7, 2, 14, "COMPLETED", "Oncology")));

        let buckets = group_by_time(&records, TimeUnit::Month, &period);

        assert_eq!(buckets.len(), 12);
        assert_eq!(counts(&buckets), vec![0, 0, 5, 0, 0, 0, 7, 0, 0, 0, 0, 0]);
        assert_eq!(buckets[0].label(), "January");
        assert_eq!(buckets[6].key(), &BucketKey::Time(7));
    }

    #[test]
    fn empty_input_still_yields_full_domains() {
        let annual = Period::annual(2024, &config()).unwrap();
        let monthly = Period::monthly(2024, 2, &config()).unwrap();
        let none: Vec<RawRecord> = Vec::new();

        assert_eq!(group_by_time(&none, TimeUnit::Month, &annual).len(), 12);
        assert_eq!(group_by_time(&none, TimeUnit::DayOfWeek, &annual).len(), 7);
        assert_eq!(group_by_time(&none, TimeUnit::Hour, &annual).len(), 24);
        assert_eq!(group_by_time(&none, TimeUnit::DayOfMonth, &monthly).len(), 29);
        assert!(group_by_category(&none).is_empty());
    }

    #[test]
    fn weekday_and_hour_keys() {
        let period = Period::annual(2024, &config()).unwrap();
        // 2024-01-01 was a Monday.
        let records = vec![
            record(1, 1, 1, 0, "COMPLETED", "A"),
            record(2, 1, 7, 23, "COMPLETED", "A"),
        ];
        let days = group_by_time(&records, TimeUnit::DayOfWeek, &period);
        assert_eq!(days[0].label(), "Monday");
        assert_eq!(days[0].count(), 1);
        assert_eq!(days[6].label(), "Sunday");
        assert_eq!(days[6].count(), 1);

        let hours = group_by_time(&records, TimeUnit::Hour, &period);
        assert_eq!(hours[0].label(), "00:00");
        assert_eq!(hours[0].count(), 1);
        assert_eq!(hours[23].count(), 1);
    }

    #[test]
    fn value_totals_are_summed_per_bucket() {
        let period = Period::annual(2024, &config()).unwrap();
        let records = vec![
            record(1, 2, 1, 8, "COMPLETED", "A").with_value(30.0),
            record(2, 2, 3, 8, "COMPLETED", "A").with_value(45.5),
            record(3, 2, 4, 8, "COMPLETED", "A"),
        ];
        let buckets = group_by_time(&records, TimeUnit::Month, &period);
        assert_eq!(buckets[1].count(), 3);
        assert!((buckets[1].value_total() - 75.5).abs() < 1e-9);
    }

    #[test]
    fn status_grouping_follows_vocabulary_order_and_folds_unknowns() {
        let profile = ReportKind::Appointment.profile();
        let records = vec![
            record(1, 1, 1, 9, "SCHEDULED", "A"),
            record(2, 1, 1, 9, "completed", "A"),
            record(3, 1, 1, 9, "ARCHIVED", "A"),
            record(4, 1, 1, 9, "COMPLETED", "A"),
            record(5, 1, 1, 9, "mystery", "A"),
        ];

        let buckets = group_by_status(&records, profile, true);

        let labels: Vec<&str> = buckets.iter().map(Bucket::label).collect();
        assert_eq!(labels, vec!["Completed", "Scheduled", "Other"]);
        assert_eq!(counts(&buckets), vec![2, 1, 2]);
        assert_eq!(buckets[2].key(), &BucketKey::Other);

        assert_eq!(buckets[0].colour(), profile.status("COMPLETED").map(|s| s.colour));
        assert_eq!(buckets[1].colour(), Some("#1565C0"));
        assert_eq!(buckets[2].colour(), None);
    }

    #[test]
    fn category_grouping_is_alphabetical_with_blank_as_other() {
        let records = vec![
            record(1, 1, 1, 9, "COMPLETED", "Oncology"),
            record(2, 1, 1, 9, "COMPLETED", " Cardiology "),
            record(3, 1, 1, 9, "COMPLETED", ""),
            record(4, 1, 1, 9, "COMPLETED", "Cardiology"),
        ];
        let buckets = group_by_category(&records);
        let labels: Vec<&str> = buckets.iter().map(Bucket::label).collect();
        assert_eq!(labels, vec!["Cardiology", "Oncology", "Other"]);
        assert_eq!(counts(&buckets), vec![2, 1, 1]);
    }

    #[test]
    fn literal_other_category_shares_the_other_bucket() {
        let records = vec![
            record(1, 1, 1, 9, "COMPLETED", "Other"),
            record(2, 1, 1, 9, "COMPLETED", ""),
            record(3, 1, 1, 9, "COMPLETED", " other "),
            record(4, 1, 1, 9, "COMPLETED", "Renal"),
        ];
        let buckets = group_by_category(&records);

        let others: Vec<&Bucket> = buckets.iter().filter(|b| b.label() == OTHER_LABEL).collect();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].key(), &BucketKey::Other);
        assert_eq!(others[0].count(), 3);
        assert_eq!(buckets.last().map(Bucket::label), Some(OTHER_LABEL));
    }

    #[test]
    fn cross_tab_nests_categories_inside_months() {
        let period = Period::annual(2024, &config()).unwrap();
        let records = vec![
            record(1, 3, 1, 9, "COMPLETED", "Cardiology"),
            record(2, 3, 2, 9, "COMPLETED", "Oncology"),
            record(3, 3, 3, 9, "COMPLETED", "Cardiology"),
            record(4, 5, 3, 9, "COMPLETED", "Oncology"),
        ];
        let buckets = cross_tabulate(&records, TimeUnit::Month, &period);

        assert_eq!(buckets.len(), 12);
        assert!(buckets[0].breakdown().is_empty());
        let march = &buckets[2];
        assert_eq!(march.count(), 3);
        assert_eq!(counts(march.breakdown()), vec![2, 1]);
        assert_eq!(buckets[4].breakdown()[0].label(), "Oncology");
    }

    proptest! {
        #[test]
        fn monthly_breakdown_always_has_twelve_ascending_buckets(
            months in proptest::collection::vec(1u32..=12, 0..200)
        ) {
            let period = Period::annual(2024, &config()).unwrap();
            let records: Vec<RawRecord> = months
                .iter()
                .enumerate()
                .map(|(i, m)| record(i as u64, *m, 1, 0, "COMPLETED", "A"))
                .collect();
            let buckets = group_by_time(&records, TimeUnit::Month, &period);
            prop_assert_eq!(buckets.len(), 12);
            for (i, bucket) in buckets.iter().enumerate() {
                prop_assert_eq!(bucket.key(), &BucketKey::Time(i as u32 + 1));
            }
        }

        #[test]
        fn every_breakdown_partitions_its_input(
            rows in proptest::collection::vec(
                (1u32..=12, 1u32..=28, 0u32..24, 0usize..6, 0usize..4),
                0..150,
            )
        ) {
            let period = Period::annual(2024, &config()).unwrap();
            let statuses = ["COMPLETED", "CANCELLED", "SCHEDULED", "NO_SHOW", "LOST", "??"];
            let categories = ["Cardiology", "Oncology", "", "Renal"];
            let records: Vec<RawRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, (m, d, h, s, c))| record(i as u64, *m, *d, *h, statuses[*s], categories[*c]))
                .collect();
            let total = records.len() as u64;
            let profile = ReportKind::Appointment.profile();

            let sum = |b: &[Bucket]| b.iter().map(Bucket::count).sum::<u64>();
            prop_assert_eq!(sum(&group_by_time(&records, TimeUnit::Month, &period)), total);
            prop_assert_eq!(sum(&group_by_time(&records, TimeUnit::DayOfWeek, &period)), total);
            prop_assert_eq!(sum(&group_by_time(&records, TimeUnit::Hour, &period)), total);
            prop_assert_eq!(sum(&group_by_status(&records, profile, false)), total);
            prop_assert_eq!(sum(&group_by_category(&records)), total);

            let cross = cross_tabulate(&records, TimeUnit::Month, &period);
            prop_assert_eq!(sum(&cross), total);
            for outer in &cross {
                prop_assert_eq!(sum(outer.breakdown()), outer.count());
            }
        }
    }
}
