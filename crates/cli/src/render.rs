//! Plain-text rendering of a report for terminal output.

use medstat_core::metrics::one_decimal;
use medstat_core::Report;
use std::fmt::Write;

const LABEL_WIDTH: usize = 24;

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    let profile = report.kind().profile();
    let summary = report.summary();
    let per = if report.period().is_monthly() { "day" } else { "month" };

    writeln!(out, "{}", report.title())?;
    writeln!(out, "{} | {}", report.organisation(), report.period())?;
    writeln!(out)?;

    writeln!(out, "Summary")?;
    writeln!(
        out,
        "  Total {}: {} (previous period {}, change {}, {})",
        profile.record_noun_plural,
        summary.total,
        summary.previous_total,
        summary.year_over_year,
        summary.trend
    )?;
    writeln!(
        out,
        "  {}: {}",
        capitalise(profile.success_rate_label),
        summary.outcomes.success
    )?;
    writeln!(
        out,
        "  {}: {}",
        capitalise(profile.failure_rate_label),
        summary.outcomes.failure
    )?;
    writeln!(
        out,
        "  Average per {per}: {}",
        one_decimal(summary.average_per_bucket)
    )?;
    if summary.payload.records_with_value > 0 {
        writeln!(
            out,
            "  {}: total {}, average {}{}",
            capitalise(profile.payload_label),
            one_decimal(summary.payload.total),
            one_decimal(summary.payload.average),
            unit_suffix(profile.payload_unit)
        )?;
    }

    for breakdown in report.breakdowns() {
        writeln!(out)?;
        writeln!(out, "Breakdown: {}", breakdown.name())?;
        if breakdown.buckets().is_empty() {
            writeln!(out, "  (none)")?;
        }
        for bucket in breakdown.buckets() {
            writeln!(out, "  {:<LABEL_WIDTH$}{:>8}", bucket.label(), bucket.count())?;
            for inner in bucket.breakdown() {
                writeln!(out, "    {:<22}{:>8}", inner.label(), inner.count())?;
            }
        }
    }

    for (section, text) in report.narrative().iter() {
        writeln!(out)?;
        writeln!(out, "{}", section.heading())?;
        writeln!(out, "  {text}")?;
    }

    Ok(())
}

fn capitalise(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn unit_suffix(unit: &str) -> String {
    if unit.is_empty() {
        String::new()
    } else {
        format!(" {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use medstat_core::constants::NO_DATA_AVAILABLE;
    use medstat_core::{assemble, EngineConfig, NonEmptyText, Period, RawRecord, ReportKind};

    fn config() -> EngineConfig {
        EngineConfig::with_organisation(NonEmptyText::new("Riverside General").unwrap())
    }

    #[test]
    fn renders_headline_breakdowns_and_narrative() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        let records = vec![
            RawRecord::new(1, ts, "COMPLETED", "M-01").with_value(240.0),
            RawRecord::new(2, ts, "INTERRUPTED", "M-02").with_value(90.0),
        ];
        let period = Period::annual(2024, &config()).unwrap();
        let report = assemble(&config(), ReportKind::Dialysis, period, records, vec![]).unwrap();

        let text = render_text(&report);
        assert!(text.starts_with("Dialysis Activity Report\nRiverside General | 2024\n"));
        assert!(text.contains("Total dialysis sessions: 2"));
        assert!(text.contains("Breakdown: monthly"));
        assert!(text.contains("Breakdown: status"));
        assert!(text.contains("minutes"));
        assert!(text.contains("\nRecommendations\n"));
    }

    #[test]
    fn renders_empty_report() {
        let period = Period::monthly(2024, 2, &config()).unwrap();
        let report = assemble(&config(), ReportKind::Lab, period, vec![], vec![]).unwrap();

        let text = render_text(&report);
        assert!(text.contains("Breakdown: daily"));
        assert!(text.contains("(none)"));
        assert_eq!(text.matches(NO_DATA_AVAILABLE).count(), 5);
    }

    #[test]
    fn capitalises_labels() {
        assert_eq!(capitalise("completion rate"), "Completion rate");
        assert_eq!(capitalise(""), "");
    }
}
