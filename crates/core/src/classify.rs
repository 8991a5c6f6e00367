//! Peak/low selection and trend labelling.
//!
//! Selection is deterministic: on equal counts the bucket met first in list order wins, for both
//! the peak and the low. Narratives name specific months and days, so this must not depend on
//! hashing or sort stability.

use crate::aggregate::{Bucket, BucketKey};
use serde::{Deserialize, Serialize};

/// Direction of change between two totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendLabel {
    /// Plain sign comparison; no significance threshold is applied.
    pub fn between(current: u64, previous: u64) -> Self {
        match current.cmp(&previous) {
            std::cmp::Ordering::Greater => TrendLabel::Increasing,
            std::cmp::Ordering::Less => TrendLabel::Decreasing,
            std::cmp::Ordering::Equal => TrendLabel::Stable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Increasing => "increasing",
            TrendLabel::Decreasing => "decreasing",
            TrendLabel::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the peak and low buckets, or `None` for an empty list.
///
/// An all-zero list resolves both to the first bucket.
pub fn peak_and_low(buckets: &[Bucket]) -> Option<(&Bucket, &Bucket)> {
    let first = buckets.first()?;
    let mut peak = first;
    let mut low = first;

    for bucket in &buckets[1..] {
        if bucket.count() > peak.count() {
            peak = bucket;
        }
        if bucket.count() < low.count() {
            low = bucket;
        }
    }

    Some((peak, low))
}

/// Compare July to December against January to June of a dense monthly breakdown.
///
/// Returns `None` unless `monthly` holds exactly the twelve month buckets.
pub fn half_year_trend(monthly: &[Bucket]) -> Option<TrendLabel> {
    if monthly.len() != 12 || !monthly.iter().all(|b| matches!(b.key(), BucketKey::Time(_))) {
        return None;
    }
    let (first, second) = monthly.split_at(6);
    let sum = |half: &[Bucket]| half.iter().map(Bucket::count).sum::<u64>();
    Some(TrendLabel::between(sum(second), sum(first)))
}
