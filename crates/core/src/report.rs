//! The assembled report tree.
//!
//! A [`Report`] is built once through [`ReportBuilder::build`], which checks the structural
//! invariants (dense time breakdowns, partitioned counts, complete narrative) before handing out
//! an immutable value. There are no setters; renderers only ever read it.

use crate::aggregate::{Bucket, BucketKey, TimeUnit};
use crate::metrics::{bucket_total, MetricSet, Summary};
use crate::narrative::Narrative;
use crate::period::Period;
use crate::record::ReportKind;
use crate::{ReportError, ReportResult};
use medstat_types::NonEmptyText;
use serde::Serialize;

/// How a breakdown's buckets were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakdownKind {
    Time(TimeUnit),
    Status,
    Category,
    CrossTab(TimeUnit),
}

/// One point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    /// Status colour for status breakdowns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<&'static str>,
}

/// One named grouping view within a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    name: NonEmptyText,
    kind: BreakdownKind,
    buckets: Vec<Bucket>,
    metrics: MetricSet,
}

impl Breakdown {
    pub fn new(
        name: NonEmptyText,
        kind: BreakdownKind,
        buckets: Vec<Bucket>,
        metrics: MetricSet,
    ) -> Self {
        Self {
            name,
            kind,
            buckets,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn kind(&self) -> BreakdownKind {
        self.kind
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn metrics(&self) -> &MetricSet {
        &self.metrics
    }

    /// Ordered `(label, value)` points for chart renderers.
    pub fn chart_series(&self) -> Vec<ChartPoint> {
        self.buckets
            .iter()
            .map(|b| ChartPoint {
                label: b.label().to_string(),
                value: b.count() as f64,
                colour: b.colour(),
            })
            .collect()
    }
}

/// Root of the report tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    kind: ReportKind,
    title: &'static str,
    organisation: NonEmptyText,
    period: Period,
    summary: Summary,
    breakdowns: Vec<Breakdown>,
    narrative: Narrative,
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn organisation(&self) -> &str {
        self.organisation.as_str()
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn breakdowns(&self) -> &[Breakdown] {
        &self.breakdowns
    }

    pub fn breakdown(&self, name: &str) -> Option<&Breakdown> {
        self.breakdowns.iter().find(|b| b.name() == name)
    }

    pub fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// Chart series of the named breakdown.
    pub fn chart_series(&self, name: &str) -> Option<Vec<ChartPoint>> {
        self.breakdown(name).map(Breakdown::chart_series)
    }
}

/// Fluent constructor for [`Report`].
#[derive(Debug)]
pub struct ReportBuilder {
    kind: ReportKind,
    period: Period,
    organisation: NonEmptyText,
    summary: Option<Summary>,
    breakdowns: Vec<Breakdown>,
    narrative: Option<Narrative>,
}

impl ReportBuilder {
    pub fn new(kind: ReportKind, period: Period, organisation: NonEmptyText) -> Self {
        Self {
            kind,
            period,
            organisation,
            summary: None,
            breakdowns: Vec::new(),
            narrative: None,
        }
    }

    pub fn summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn breakdown(mut self, breakdown: Breakdown) -> Self {
        self.breakdowns.push(breakdown);
        self
    }

    pub fn narrative(mut self, narrative: Narrative) -> Self {
        self.narrative = Some(narrative);
        self
    }

    /// Validate and freeze the report.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidReport` if:
    /// - the summary or narrative is missing, or the narrative lacks a section,
    /// - two breakdowns share a name,
    /// - a time breakdown is not exactly its dense ascending domain,
    /// - a breakdown's bucket counts do not add up to the summary total,
    /// - a cross-tabulation's inner buckets do not add up to their outer bucket.
    pub fn build(self) -> ReportResult<Report> {
        let summary = self
            .summary
            .ok_or_else(|| ReportError::InvalidReport("summary is missing".into()))?;
        let narrative = self
            .narrative
            .ok_or_else(|| ReportError::InvalidReport("narrative is missing".into()))?;
        if let Some(missing) = narrative.missing_section() {
            return Err(ReportError::InvalidReport(format!(
                "narrative section '{}' is missing",
                missing.as_str()
            )));
        }

        for (i, breakdown) in self.breakdowns.iter().enumerate() {
            if self.breakdowns[..i]
                .iter()
                .any(|b| b.name() == breakdown.name())
            {
                return Err(ReportError::InvalidReport(format!(
                    "duplicate breakdown '{}'",
                    breakdown.name()
                )));
            }
            validate_breakdown(breakdown, &self.period, summary.total)?;
        }

        Ok(Report {
            kind: self.kind,
            title: self.kind.profile().title,
            organisation: self.organisation,
            period: self.period,
            summary,
            breakdowns: self.breakdowns,
            narrative,
        })
    }
}

fn validate_breakdown(breakdown: &Breakdown, period: &Period, total: u64) -> ReportResult<()> {
    let name = breakdown.name();
    let buckets = breakdown.buckets();

    if let BreakdownKind::Time(unit) | BreakdownKind::CrossTab(unit) = breakdown.kind() {
        let dense = buckets
            .iter()
            .map(Bucket::key)
            .eq(unit.domain(period).map(BucketKey::Time).collect::<Vec<_>>().iter());
        if !dense {
            return Err(ReportError::InvalidReport(format!(
                "breakdown '{name}' does not cover the full {:?} domain in order",
                unit
            )));
        }
    }

    let counted = bucket_total(buckets);
    if counted != total {
        return Err(ReportError::InvalidReport(format!(
            "breakdown '{name}' counts {counted} records but the report has {total}"
        )));
    }

    if let BreakdownKind::CrossTab(_) = breakdown.kind() {
        if let Some(outer) = buckets
            .iter()
            .find(|b| bucket_total(b.breakdown()) != b.count())
        {
            return Err(ReportError::InvalidReport(format!(
                "breakdown '{name}' bucket '{}' does not partition into its categories",
                outer.label()
            )));
        }
    }

    Ok(())
}
