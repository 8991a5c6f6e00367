//! Derived metrics: rates, averages, year-over-year change and the headline summary.
//!
//! All arithmetic is done on unrounded `f64` values. Rounding to one decimal place happens only
//! when a [`Percentage`] is displayed or serialised, so rounded figures never feed back into
//! further calculation. Zero denominators are not errors: they resolve to `0.0`.

use crate::aggregate::{Bucket, BucketKey};
use crate::classify::{self, TrendLabel};
use crate::profile::{Outcome, ReportProfile};
use crate::record::RawRecord;
use serde::{Serialize, Serializer};

/// Round half-up to `places` decimal places.
///
/// The scaled value is first snapped to nine decimals so that binary representation error
/// (`1.15 * 10 == 11.499999…`) does not flip the rounding direction. Non-finite input yields
/// `0.0`.
pub fn round_half_up(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places as i32);
    let scaled = (value * factor * 1e9).round() / 1e9;
    (scaled + 0.5).floor() / factor
}

/// Format a plain figure with one decimal place, rounded half-up.
pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", round_half_up(value, 1))
}

/// A percentage held at full precision, rounded to one decimal only for presentation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.0);

    /// Wrap a raw percentage. Non-finite values collapse to zero.
    pub fn new(raw: f64) -> Self {
        if raw.is_finite() {
            Self(raw)
        } else {
            Self::ZERO
        }
    }

    pub fn raw(self) -> f64 {
        self.0
    }

    pub fn rounded(self) -> f64 {
        round_half_up(self.0, 1)
    }
}

impl std::fmt::Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.rounded())
    }
}

impl Serialize for Percentage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.rounded())
    }
}

fn serialize_one_decimal<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_half_up(*value, 1))
}

/// `numerator / denominator × 100`, or `0.0` when the denominator is zero.
pub fn rate(numerator: u64, denominator: u64) -> Percentage {
    if denominator == 0 {
        return Percentage::ZERO;
    }
    Percentage::new(numerator as f64 / denominator as f64 * 100.0)
}

/// `total / period_count`, or `0.0` for an empty domain.
pub fn average(total: f64, period_count: u32) -> f64 {
    if period_count == 0 || !total.is_finite() {
        return 0.0;
    }
    total / f64::from(period_count)
}

/// Percentage change from `previous` to `current`.
///
/// A zero `previous` is defined as "no comparable change" and yields `0.0` rather than an
/// infinite or undefined value.
pub fn year_over_year_change(current: u64, previous: u64) -> Percentage {
    if previous == 0 {
        return Percentage::ZERO;
    }
    Percentage::new((current as f64 - previous as f64) / previous as f64 * 100.0)
}

/// A lightweight reference to a selected bucket (peak, low, top category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketRef {
    pub key: BucketKey,
    pub label: String,
    pub count: u64,
}

impl From<&Bucket> for BucketRef {
    fn from(bucket: &Bucket) -> Self {
        Self {
            key: bucket.key().clone(),
            label: bucket.label().to_string(),
            count: bucket.count(),
        }
    }
}

/// Numeric summary of one breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSet {
    total: u64,
    #[serde(serialize_with = "serialize_one_decimal")]
    average_per_bucket: f64,
    peak: Option<BucketRef>,
    low: Option<BucketRef>,
    peak_share: Percentage,
    previous_total: u64,
    year_over_year: Percentage,
    trend: TrendLabel,
}

impl MetricSet {
    /// Compute the metrics of `current`, comparing against the same breakdown of the prior
    /// period.
    pub fn compute(current: &[Bucket], previous: &[Bucket]) -> Self {
        let total = bucket_total(current);
        let previous_total = bucket_total(previous);
        let (peak, low) = match classify::peak_and_low(current) {
            Some((peak, low)) => (Some(BucketRef::from(peak)), Some(BucketRef::from(low))),
            None => (None, None),
        };
        let peak_share = rate(peak.as_ref().map_or(0, |p| p.count), total);

        Self {
            total,
            average_per_bucket: average(total as f64, current.len() as u32),
            peak,
            low,
            peak_share,
            previous_total,
            year_over_year: year_over_year_change(total, previous_total),
            trend: TrendLabel::between(total, previous_total),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn average_per_bucket(&self) -> f64 {
        self.average_per_bucket
    }

    pub fn peak(&self) -> Option<&BucketRef> {
        self.peak.as_ref()
    }

    pub fn low(&self) -> Option<&BucketRef> {
        self.low.as_ref()
    }

    /// The peak bucket's share of the total.
    pub fn peak_share(&self) -> Percentage {
        self.peak_share
    }

    pub fn previous_total(&self) -> u64 {
        self.previous_total
    }

    pub fn year_over_year(&self) -> Percentage {
        self.year_over_year
    }

    pub fn trend(&self) -> TrendLabel {
        self.trend
    }
}

pub(crate) fn bucket_total(buckets: &[Bucket]) -> u64 {
    buckets.iter().map(Bucket::count).sum()
}

/// Shares of the total by status outcome role.
///
/// `other` covers statuses outside the declared vocabulary, so the four shares add up to 100%
/// (before rounding) whenever the total is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OutcomeRates {
    pub success: Percentage,
    pub failure: Percentage,
    pub open: Percentage,
    pub other: Percentage,
}

impl OutcomeRates {
    /// Derive outcome shares from a status breakdown.
    pub fn from_status_buckets(buckets: &[Bucket], profile: &ReportProfile) -> Self {
        let total = bucket_total(buckets);
        let (mut success, mut failure, mut open, mut other) = (0, 0, 0, 0);

        for bucket in buckets {
            let outcome = match bucket.key() {
                BucketKey::Category(key) => profile.status(key).map(|s| s.outcome),
                _ => None,
            };
            match outcome {
                Some(Outcome::Success) => success += bucket.count(),
                Some(Outcome::Failure) => failure += bucket.count(),
                Some(Outcome::Open) => open += bucket.count(),
                None => other += bucket.count(),
            }
        }

        Self {
            success: rate(success, total),
            failure: rate(failure, total),
            open: rate(open, total),
            other: rate(other, total),
        }
    }
}

/// Totals of the optional numeric payload.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PayloadStats {
    #[serde(serialize_with = "serialize_one_decimal")]
    pub total: f64,
    /// Mean over the records that carry a payload; `0.0` when none do.
    #[serde(serialize_with = "serialize_one_decimal")]
    pub average: f64,
    pub records_with_value: u64,
}

impl PayloadStats {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a RawRecord>) -> Self {
        let (total, n) = records
            .into_iter()
            .filter_map(RawRecord::finite_value)
            .fold((0.0, 0u64), |(sum, n), v| (sum + v, n + 1));

        Self {
            total,
            average: if n == 0 { 0.0 } else { total / n as f64 },
            records_with_value: n,
        }
    }
}

/// Headline metrics snapshot of a report; the sole numeric input to the narrative generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub previous_total: u64,
    pub year_over_year: Percentage,
    pub trend: TrendLabel,
    pub outcomes: OutcomeRates,
    pub payload: PayloadStats,
    /// Average records per bucket of the primary time breakdown.
    #[serde(serialize_with = "serialize_one_decimal")]
    pub average_per_bucket: f64,
    pub busiest: Option<BucketRef>,
    pub quietest: Option<BucketRef>,
    pub busiest_weekday: Option<BucketRef>,
    pub peak_hour: Option<BucketRef>,
    pub top_category: Option<BucketRef>,
    pub top_category_share: Percentage,
    /// Number of distinct category buckets, "Other" included.
    pub category_count: usize,
    /// Second half of the year against the first; annual reports only.
    pub half_year_trend: Option<TrendLabel>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
