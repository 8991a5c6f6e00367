//! Report assembly.
//!
//! [`ReportAssembler`] validates the requested period, fetches the records of that period and of
//! the one before it, then hands both collections to [`assemble`]. Everything after the fetch is
//! a pure function of the two collections and the [`EngineConfig`]: the same input always gives
//! the same report.
//!
//! Breakdowns produced for an annual period:
//! `monthly`, `day_of_week`, `hour_of_day`, `status`, `category`, `monthly_by_category`.
//! A single-month period swaps the monthly views for `daily` and `daily_by_category`.

use crate::aggregate::{self, Bucket, TimeUnit};
use crate::classify::{self, TrendLabel};
use crate::config::EngineConfig;
use crate::constants::{
    CATEGORY_BREAKDOWN, DAILY_BREAKDOWN, DAILY_BY_CATEGORY_BREAKDOWN, DAY_OF_WEEK_BREAKDOWN,
    HOUR_OF_DAY_BREAKDOWN, MONTHLY_BREAKDOWN, MONTHLY_BY_CATEGORY_BREAKDOWN, STATUS_BREAKDOWN,
};
use crate::metrics::{year_over_year_change, MetricSet, OutcomeRates, PayloadStats, Summary};
use crate::narrative::{self, NarrativeContext};
use crate::period::Period;
use crate::profile::ReportProfile;
use crate::record::{RawRecord, ReportKind};
use crate::report::{Breakdown, BreakdownKind, Report, ReportBuilder};
use crate::source::RecordSource;
use crate::{ReportError, ReportResult};
use medstat_types::NonEmptyText;

/// Generates reports from a [`RecordSource`].
#[derive(Debug, Clone)]
pub struct ReportAssembler<S> {
    config: EngineConfig,
    source: S,
}

impl<S: RecordSource> ReportAssembler<S> {
    pub fn new(config: EngineConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Generate the report of `kind` for a year, or for one month of it.
    ///
    /// # Arguments
    ///
    /// * `kind` - Which service's report to build.
    /// * `year` - Calendar year; must lie within the configured range.
    /// * `month` - `Some(1..=12)` for a monthly report, `None` for the whole year.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidPeriod` before anything is fetched if the year or month is
    /// out of range, and `ReportError::Fetch` if either fetch fails. No partial report is ever
    /// returned.
    pub fn generate(&self, kind: ReportKind, year: i32, month: Option<u32>) -> ReportResult<Report> {
        let period = Period::new(year, month, &self.config)?;
        self.generate_for(kind, period)
    }

    /// Generate a report for an already validated period.
    pub fn generate_for(&self, kind: ReportKind, period: Period) -> ReportResult<Report> {
        let current = self.source.fetch(kind, &period)?;
        let previous = self.source.fetch(kind, &period.previous())?;
        assemble(&self.config, kind, period, current, previous)
    }
}

/// Build a report from already fetched records.
///
/// Records whose timestamps fall outside their period are dropped with a warning rather than
/// counted into the wrong bucket.
///
/// # Errors
///
/// Returns `ReportError::InvalidReport` if the assembled tree fails validation, which indicates
/// a bug rather than bad input.
pub fn assemble(
    config: &EngineConfig,
    kind: ReportKind,
    period: Period,
    current: Vec<RawRecord>,
    previous: Vec<RawRecord>,
) -> ReportResult<Report> {
    let _span = tracing::info_span!("assemble", kind = %kind, period = %period).entered();
    let profile = kind.profile();
    let previous_period = period.previous();
    let current = within(current, &period);
    let previous = within(previous, &previous_period);

    let mut primary = None;
    let mut weekday = None;
    let mut hour = None;
    let mut status = None;
    let mut category = None;
    let mut breakdowns = Vec::new();

    for (name, breakdown_kind) in plan(&period) {
        let buckets = group(
            breakdown_kind,
            &current,
            &period,
            profile,
            config.log_unknown_categories(),
        );
        let prior = group(breakdown_kind, &previous, &previous_period, profile, false);
        let metrics = MetricSet::compute(&buckets, &prior);
        tracing::debug!(
            breakdown = name,
            buckets = buckets.len(),
            total = metrics.total(),
            "breakdown computed"
        );

        let index = breakdowns.len();
        match name {
            MONTHLY_BREAKDOWN | DAILY_BREAKDOWN => primary = Some(index),
            DAY_OF_WEEK_BREAKDOWN => weekday = Some(index),
            HOUR_OF_DAY_BREAKDOWN => hour = Some(index),
            STATUS_BREAKDOWN => status = Some(index),
            CATEGORY_BREAKDOWN => category = Some(index),
            _ => {}
        }

        let name = NonEmptyText::new(name)
            .map_err(|e| ReportError::InvalidReport(format!("breakdown name: {e}")))?;
        breakdowns.push(Breakdown::new(name, breakdown_kind, buckets, metrics));
    }

    let pick = |slot: Option<usize>| slot.and_then(|i| breakdowns.get(i));
    let summary = summarise(
        &period,
        profile,
        &current,
        previous.len() as u64,
        Picked {
            primary: pick(primary),
            weekday: pick(weekday),
            hour: pick(hour),
            status: pick(status),
            category: pick(category),
        },
    );

    let organisation = config.organisation_name().clone();
    let narrative = narrative::generate(&NarrativeContext {
        profile,
        organisation: organisation.as_str(),
        period: &period,
        summary: &summary,
    });

    let report = breakdowns
        .into_iter()
        .fold(ReportBuilder::new(kind, period, organisation), ReportBuilder::breakdown)
        .summary(summary)
        .narrative(narrative)
        .build()?;

    tracing::info!(
        kind = %kind,
        period = %period,
        total = report.summary().total,
        previous_total = report.summary().previous_total,
        "report assembled"
    );
    Ok(report)
}

/// Breakdown names and kinds for a period, in report order.
fn plan(period: &Period) -> Vec<(&'static str, BreakdownKind)> {
    let (primary, cross_tab, unit) = if period.is_monthly() {
        (DAILY_BREAKDOWN, DAILY_BY_CATEGORY_BREAKDOWN, TimeUnit::DayOfMonth)
    } else {
        (MONTHLY_BREAKDOWN, MONTHLY_BY_CATEGORY_BREAKDOWN, TimeUnit::Month)
    };

    vec![
        (primary, BreakdownKind::Time(unit)),
        (DAY_OF_WEEK_BREAKDOWN, BreakdownKind::Time(TimeUnit::DayOfWeek)),
        (HOUR_OF_DAY_BREAKDOWN, BreakdownKind::Time(TimeUnit::Hour)),
        (STATUS_BREAKDOWN, BreakdownKind::Status),
        (CATEGORY_BREAKDOWN, BreakdownKind::Category),
        (cross_tab, BreakdownKind::CrossTab(unit)),
    ]
}

fn group(
    kind: BreakdownKind,
    records: &[RawRecord],
    period: &Period,
    profile: &ReportProfile,
    log_unknown: bool,
) -> Vec<Bucket> {
    match kind {
        BreakdownKind::Time(unit) => aggregate::group_by_time(records, unit, period),
        BreakdownKind::Status => aggregate::group_by_status(records, profile, log_unknown),
        BreakdownKind::Category => aggregate::group_by_category(records),
        BreakdownKind::CrossTab(unit) => aggregate::cross_tabulate(records, unit, period),
    }
}

fn within(records: Vec<RawRecord>, period: &Period) -> Vec<RawRecord> {
    let fetched = records.len();
    let kept: Vec<RawRecord> = records
        .into_iter()
        .filter(|r| period.contains(&r.timestamp))
        .collect();
    if kept.len() < fetched {
        tracing::warn!(
            period = %period,
            dropped = fetched - kept.len(),
            "records outside the requested period dropped"
        );
    }
    kept
}

struct Picked<'a> {
    primary: Option<&'a Breakdown>,
    weekday: Option<&'a Breakdown>,
    hour: Option<&'a Breakdown>,
    status: Option<&'a Breakdown>,
    category: Option<&'a Breakdown>,
}

fn summarise(
    period: &Period,
    profile: &ReportProfile,
    current: &[RawRecord],
    previous_total: u64,
    picked: Picked<'_>,
) -> Summary {
    let total = current.len() as u64;
    let primary = picked.primary.map(Breakdown::metrics);
    let busiest_of = |b: Option<&Breakdown>| {
        b.filter(|_| total > 0)
            .and_then(|b| b.metrics().peak().cloned())
    };

    Summary {
        total,
        previous_total,
        year_over_year: year_over_year_change(total, previous_total),
        trend: TrendLabel::between(total, previous_total),
        outcomes: picked
            .status
            .map(|b| OutcomeRates::from_status_buckets(b.buckets(), profile))
            .unwrap_or_default(),
        payload: PayloadStats::from_records(current),
        average_per_bucket: primary.map_or(0.0, MetricSet::average_per_bucket),
        busiest: primary.and_then(|m| m.peak().cloned()),
        quietest: primary.and_then(|m| m.low().cloned()),
        busiest_weekday: busiest_of(picked.weekday),
        peak_hour: busiest_of(picked.hour),
        top_category: picked.category.and_then(|b| b.metrics().peak().cloned()),
        top_category_share: picked
            .category
            .map(|b| b.metrics().peak_share())
            .unwrap_or_default(),
        category_count: picked.category.map_or(0, |b| b.buckets().len()),
        half_year_trend: if period.is_monthly() {
            None
        } else {
            picked
                .primary
                .and_then(|b| classify::half_year_trend(b.buckets()))
        },
    }
}
