//! Templated narrative text.
//!
//! [`generate`] is a pure function of the headline [`Summary`] and a few contextual labels: no
//! I/O, no clock, no randomness. Identical inputs always produce identical text. A report with no
//! records gets the explicit [`NO_DATA_AVAILABLE`] sentence in every section instead of
//! zero-filled templates.

use crate::classify::TrendLabel;
use crate::constants::NO_DATA_AVAILABLE;
use crate::metrics::{one_decimal, BucketRef, Percentage, Summary};
use crate::period::Period;
use crate::profile::{ReportProfile, RuleTrigger};
use serde::Serialize;
use std::collections::BTreeMap;

/// Fixed narrative section keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Introduction,
    Trends,
    Impact,
    Conclusion,
    Recommendations,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Introduction,
        Section::Trends,
        Section::Impact,
        Section::Conclusion,
        Section::Recommendations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Introduction => "introduction",
            Section::Trends => "trends",
            Section::Impact => "impact",
            Section::Conclusion => "conclusion",
            Section::Recommendations => "recommendations",
        }
    }

    /// Heading used by plain-text renderers.
    pub fn heading(&self) -> &'static str {
        match self {
            Section::Introduction => "Introduction",
            Section::Trends => "Trends",
            Section::Impact => "Impact",
            Section::Conclusion => "Conclusion",
            Section::Recommendations => "Recommendations",
        }
    }
}

/// Narrative text keyed by section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Narrative(BTreeMap<Section, String>);

impl Narrative {
    /// Text of one section; empty if the section is absent.
    pub fn section(&self, section: Section) -> &str {
        self.0.get(&section).map(String::as_str).unwrap_or("")
    }

    /// First section, in fixed order, that has no text.
    pub fn missing_section(&self) -> Option<Section> {
        Section::ALL.into_iter().find(|s| !self.0.contains_key(s))
    }

    /// Sections in fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
        self.0.iter().map(|(s, text)| (*s, text.as_str()))
    }
}

/// Labels the templates need besides the numbers.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeContext<'a> {
    pub profile: &'static ReportProfile,
    pub organisation: &'a str,
    pub period: &'a Period,
    pub summary: &'a Summary,
}

/// Produce every narrative section for a report.
pub fn generate(ctx: &NarrativeContext<'_>) -> Narrative {
    if ctx.summary.is_empty() {
        return Narrative(
            Section::ALL
                .into_iter()
                .map(|s| (s, NO_DATA_AVAILABLE.to_string()))
                .collect(),
        );
    }

    let mut sections = BTreeMap::new();
    sections.insert(Section::Introduction, introduction(ctx));
    sections.insert(Section::Trends, trends(ctx));
    sections.insert(Section::Impact, impact(ctx));
    sections.insert(Section::Conclusion, conclusion(ctx));
    sections.insert(Section::Recommendations, recommendations(ctx));
    Narrative(sections)
}

fn introduction(ctx: &NarrativeContext<'_>) -> String {
    let s = ctx.summary;
    format!(
        "This {} for {} covers {}. A total of {} {} recorded, an average of {} per {}.",
        ctx.profile.title.to_lowercase(),
        ctx.organisation,
        ctx.period,
        count_phrase(s.total, ctx.profile),
        if s.total == 1 { "was" } else { "were" },
        one_decimal(s.average_per_bucket),
        bucket_noun(ctx.period),
    )
}

fn trends(ctx: &NarrativeContext<'_>) -> String {
    let s = ctx.summary;
    let mut out = Vec::new();

    if let (Some(busiest), Some(quietest)) = (&s.busiest, &s.quietest) {
        out.push(format!(
            "Activity peaked {} with {} and was lowest {} with {}.",
            when(ctx.period, busiest),
            count_phrase(busiest.count, ctx.profile),
            when(ctx.period, quietest),
            count_phrase(quietest.count, ctx.profile),
        ));
    }

    if let Some(half) = s.half_year_trend {
        let comparison = match half {
            TrendLabel::Increasing => "higher than",
            TrendLabel::Decreasing => "lower than",
            TrendLabel::Stable => "level with",
        };
        out.push(format!(
            "Volume in the second half of the year was {comparison} the first half."
        ));
    }

    match (&s.busiest_weekday, &s.peak_hour) {
        (Some(day), Some(hour)) => out.push(format!(
            "{} was the busiest day of the week, with activity heaviest around {}.",
            day.label, hour.label
        )),
        (Some(day), None) => out.push(format!("{} was the busiest day of the week.", day.label)),
        _ => {}
    }

    out.join(" ")
}

fn impact(ctx: &NarrativeContext<'_>) -> String {
    let s = ctx.summary;
    let p = ctx.profile;
    let previous = ctx.period.previous();
    let mut out = Vec::new();

    if s.previous_total == 0 {
        out.push(format!(
            "No {} were recorded in {}, so no year-over-year comparison is available (change reported as {}).",
            p.record_noun_plural, previous, s.year_over_year
        ));
    } else {
        let baseline = count_phrase(s.previous_total, p);
        out.push(match s.trend {
            TrendLabel::Increasing | TrendLabel::Decreasing if s.year_over_year.rounded() == 0.0 => {
                format!("Volume was broadly unchanged from {baseline} in {previous}.")
            }
            TrendLabel::Increasing => format!(
                "Compared with {baseline} in {previous}, volume increased by {}.",
                s.year_over_year
            ),
            TrendLabel::Decreasing => format!(
                "Compared with {baseline} in {previous}, volume decreased by {}.",
                Percentage::new(s.year_over_year.raw().abs())
            ),
            TrendLabel::Stable => {
                format!("Volume was unchanged from {baseline} in {previous}.")
            }
        });
    }

    out.push(format!(
        "The {} was {} and the {} was {}.",
        p.success_rate_label, s.outcomes.success, p.failure_rate_label, s.outcomes.failure
    ));
    if s.outcomes.open.raw() > 0.0 {
        out.push(format!(
            "{} of {} remained open at the end of the period.",
            s.outcomes.open, p.record_noun_plural
        ));
    }
    if s.outcomes.other.raw() > 0.0 {
        out.push(format!(
            "{} of {} carried an unrecognised status.",
            s.outcomes.other, p.record_noun_plural
        ));
    }

    if s.payload.records_with_value > 0 {
        let unit = if p.payload_unit.is_empty() {
            String::new()
        } else {
            format!(" {}", p.payload_unit)
        };
        out.push(format!(
            "Total {} amounted to {}{unit}, averaging {}{unit} per {}.",
            p.payload_label,
            one_decimal(s.payload.total),
            one_decimal(s.payload.average),
            p.record_noun,
        ));
    }

    out.join(" ")
}

fn conclusion(ctx: &NarrativeContext<'_>) -> String {
    let s = ctx.summary;
    let p = ctx.profile;
    let mut out = Vec::new();

    if s.previous_total == 0 {
        out.push(format!(
            "Overall, {} establishes the baseline for future comparisons of {} at {}.",
            ctx.period, p.record_noun_plural, ctx.organisation
        ));
    } else {
        let direction = match s.trend {
            TrendLabel::Increasing => "on the rise",
            TrendLabel::Decreasing => "in decline",
            TrendLabel::Stable => "steady",
        };
        out.push(format!(
            "Overall, {} at {} were {direction} compared with the previous year.",
            p.record_noun_plural, ctx.organisation
        ));
    }

    if let Some(top) = &s.top_category {
        out.push(format!(
            "The {} {} accounted for the largest share of activity ({}).",
            p.category_noun, top.label, s.top_category_share
        ));
    }

    out.join(" ")
}

fn recommendations(ctx: &NarrativeContext<'_>) -> String {
    let advice: Vec<&str> = ctx
        .profile
        .rules
        .iter()
        .filter(|rule| fires(rule.trigger, ctx.summary))
        .map(|rule| rule.advice)
        .collect();

    if advice.is_empty() {
        "Current performance is within expected ranges; maintain existing operational practices."
            .to_string()
    } else {
        advice.join(" ")
    }
}

/// Whether a recommendation trigger holds for `summary`.
///
/// Year-over-year triggers need a non-zero previous total, category concentration needs more
/// than one category, and payload triggers need at least one record carrying a payload.
pub fn fires(trigger: RuleTrigger, summary: &Summary) -> bool {
    let has_baseline = summary.previous_total > 0;
    match trigger {
        RuleTrigger::FailureRateAbove(t) => summary.outcomes.failure.raw() > t,
        RuleTrigger::SuccessRateBelow(t) => summary.outcomes.success.raw() < t,
        RuleTrigger::OpenRateAbove(t) => summary.outcomes.open.raw() > t,
        RuleTrigger::YearOverYearBelow(t) => has_baseline && summary.year_over_year.raw() < t,
        RuleTrigger::YearOverYearAbove(t) => has_baseline && summary.year_over_year.raw() > t,
        RuleTrigger::TopCategoryShareAbove(t) => {
            summary.category_count > 1 && summary.top_category_share.raw() > t
        }
        RuleTrigger::AveragePayloadAbove(t) => {
            summary.payload.records_with_value > 0 && summary.payload.average > t
        }
    }
}

fn count_phrase(n: u64, profile: &ReportProfile) -> String {
    if n == 1 {
        format!("1 {}", profile.record_noun)
    } else {
        format!("{n} {}", profile.record_noun_plural)
    }
}

fn bucket_noun(period: &Period) -> &'static str {
    if period.is_monthly() {
        "day"
    } else {
        "month"
    }
}

fn when(period: &Period, bucket: &BucketRef) -> String {
    if period.is_monthly() {
        format!("on day {}", bucket.label)
    } else {
        format!("in {}", bucket.label)
    }
}
