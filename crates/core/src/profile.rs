//! Static per-kind report metadata.
//!
//! Every [`ReportKind`] maps to exactly one [`ReportProfile`]: the closed status vocabulary with
//! its display metadata, the wording the narrative uses for records, categories and the numeric
//! payload, and the recommendation rules. The tables are `static` and looked up by key, so no
//! per-call mapping code exists anywhere else in the engine.

use crate::record::ReportKind;
use serde::Serialize;

/// The role a status plays when computing outcome rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Counts towards the success (completion) rate.
    Success,
    /// Counts towards the failure (cancellation) rate.
    Failure,
    /// Still in progress or awaiting action.
    Open,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Open => "open",
        }
    }
}

/// Display metadata for one declared status.
#[derive(Debug, PartialEq, Eq)]
pub struct StatusMeta {
    /// Canonical upper-case key, e.g. `"NO_SHOW"`.
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Hex colour handed to chart renderers.
    pub colour: &'static str,
    pub outcome: Outcome,
}

/// Condition under which a recommendation is emitted.
///
/// Percentages are compared unrounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleTrigger {
    FailureRateAbove(f64),
    SuccessRateBelow(f64),
    OpenRateAbove(f64),
    YearOverYearBelow(f64),
    YearOverYearAbove(f64),
    TopCategoryShareAbove(f64),
    AveragePayloadAbove(f64),
}

#[derive(Debug, PartialEq)]
pub struct RecommendationRule {
    pub trigger: RuleTrigger,
    pub advice: &'static str,
}

/// Static description of one report kind.
#[derive(Debug)]
pub struct ReportProfile {
    pub kind: ReportKind,
    pub title: &'static str,
    pub record_noun: &'static str,
    pub record_noun_plural: &'static str,
    pub category_noun: &'static str,
    pub statuses: &'static [StatusMeta],
    pub payload_label: &'static str,
    /// Unit appended to payload figures; empty for currency amounts.
    pub payload_unit: &'static str,
    pub success_rate_label: &'static str,
    pub failure_rate_label: &'static str,
    pub rules: &'static [RecommendationRule],
}

impl ReportProfile {
    pub fn for_kind(kind: ReportKind) -> &'static ReportProfile {
        match kind {
            ReportKind::Clinic => &CLINIC,
            ReportKind::Ward => &WARD,
            ReportKind::Appointment => &APPOINTMENT,
            ReportKind::Dialysis => &DIALYSIS,
            ReportKind::Prescription => &PRESCRIPTION,
            ReportKind::Lab => &LAB,
        }
    }

    /// Match a raw status string against the declared vocabulary.
    ///
    /// Matching ignores case, surrounding whitespace, and treats `-` and spaces as `_`, so
    /// `"no show"` and `"No-Show"` both resolve to `NO_SHOW`. Returns `None` for values outside
    /// the vocabulary; callers fold those into the "Other" bucket.
    pub fn classify_status(&self, raw: &str) -> Option<&'static StatusMeta> {
        let normalised = normalise_status(raw);
        self.status(&normalised)
    }

    /// Look up a status by its canonical key.
    pub fn status(&self, key: &str) -> Option<&'static StatusMeta> {
        self.statuses.iter().find(|s| s.key == key)
    }
}

fn normalise_status(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

// ============================================================================
// Profiles
// ============================================================================

static CLINIC: ReportProfile = ReportProfile {
    kind: ReportKind::Clinic,
    title: "Clinic Statistics Report",
    record_noun: "clinic visit",
    record_noun_plural: "clinic visits",
    category_noun: "clinic",
    statuses: &[
        StatusMeta {
            key: "COMPLETED",
            label: "Completed",
            description: "Patient was seen by the clinician",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "CANCELLED",
            label: "Cancelled",
            description: "Visit was cancelled before it took place",
            colour: "#C62828",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "NO_SHOW",
            label: "No show",
            description: "Patient did not attend",
            colour: "#EF6C00",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "SCHEDULED",
            label: "Scheduled",
            description: "Visit is booked but not yet held",
            colour: "#1565C0",
            outcome: Outcome::Open,
        },
    ],
    payload_label: "consultation time",
    payload_unit: "minutes",
    success_rate_label: "attendance rate",
    failure_rate_label: "missed-visit rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(20.0),
            advice: "Introduce reminder calls or messages ahead of clinic visits to reduce cancellations and no-shows.",
        },
        RecommendationRule {
            trigger: RuleTrigger::TopCategoryShareAbove(40.0),
            advice: "Review staffing in the busiest clinic, which carries a disproportionate share of visits.",
        },
        RecommendationRule {
            trigger: RuleTrigger::YearOverYearAbove(15.0),
            advice: "Plan additional clinic sessions to absorb the sustained growth in demand.",
        },
        RecommendationRule {
            trigger: RuleTrigger::YearOverYearBelow(-15.0),
            advice: "Investigate the fall in clinic activity and review referral pathways.",
        },
    ],
};

static WARD: ReportProfile = ReportProfile {
    kind: ReportKind::Ward,
    title: "Ward Statistics Report",
    record_noun: "admission",
    record_noun_plural: "admissions",
    category_noun: "ward",
    statuses: &[
        StatusMeta {
            key: "DISCHARGED",
            label: "Discharged",
            description: "Patient left the ward after treatment",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "TRANSFERRED",
            label: "Transferred",
            description: "Patient moved to another ward or facility",
            colour: "#6A1B9A",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "DECEASED",
            label: "Deceased",
            description: "Patient died during the admission",
            colour: "#424242",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "ADMITTED",
            label: "Admitted",
            description: "Patient is still on the ward",
            colour: "#1565C0",
            outcome: Outcome::Open,
        },
    ],
    payload_label: "length of stay",
    payload_unit: "days",
    success_rate_label: "discharge rate",
    failure_rate_label: "mortality rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::AveragePayloadAbove(7.0),
            advice: "Review discharge planning, as the average length of stay exceeds one week.",
        },
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(5.0),
            advice: "Conduct a mortality review for the reporting period.",
        },
        RecommendationRule {
            trigger: RuleTrigger::TopCategoryShareAbove(35.0),
            advice: "Rebalance bed allocation, as one ward is absorbing a large share of admissions.",
        },
        RecommendationRule {
            trigger: RuleTrigger::OpenRateAbove(25.0),
            advice: "Audit long-running admissions that remain open at the end of the period.",
        },
    ],
};

static APPOINTMENT: ReportProfile = ReportProfile {
    kind: ReportKind::Appointment,
    title: "Appointment Analytics Report",
    record_noun: "appointment",
    record_noun_plural: "appointments",
    category_noun: "specialization",
    statuses: &[
        StatusMeta {
            key: "COMPLETED",
            label: "Completed",
            description: "Appointment took place",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "CANCELLED",
            label: "Cancelled",
            description: "Appointment was cancelled",
            colour: "#C62828",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "NO_SHOW",
            label: "No show",
            description: "Patient did not attend",
            colour: "#EF6C00",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "SCHEDULED",
            label: "Scheduled",
            description: "Appointment is booked",
            colour: "#1565C0",
            outcome: Outcome::Open,
        },
    ],
    payload_label: "waiting time",
    payload_unit: "minutes",
    success_rate_label: "completion rate",
    failure_rate_label: "cancellation rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(20.0),
            advice: "Send automated appointment reminders to bring the cancellation rate down.",
        },
        RecommendationRule {
            trigger: RuleTrigger::AveragePayloadAbove(30.0),
            advice: "Stagger booking slots to reduce average waiting time below thirty minutes.",
        },
        RecommendationRule {
            trigger: RuleTrigger::TopCategoryShareAbove(40.0),
            advice: "Add capacity in the most requested specialization.",
        },
        RecommendationRule {
            trigger: RuleTrigger::OpenRateAbove(30.0),
            advice: "Follow up on appointments still marked as scheduled to confirm their outcome.",
        },
    ],
};

static DIALYSIS: ReportProfile = ReportProfile {
    kind: ReportKind::Dialysis,
    title: "Dialysis Activity Report",
    record_noun: "dialysis session",
    record_noun_plural: "dialysis sessions",
    category_noun: "machine",
    statuses: &[
        StatusMeta {
            key: "COMPLETED",
            label: "Completed",
            description: "Session ran to completion",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "INTERRUPTED",
            label: "Interrupted",
            description: "Session stopped early",
            colour: "#EF6C00",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "CANCELLED",
            label: "Cancelled",
            description: "Session did not start",
            colour: "#C62828",
            outcome: Outcome::Failure,
        },
    ],
    payload_label: "session time",
    payload_unit: "minutes",
    success_rate_label: "completion rate",
    failure_rate_label: "interruption rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(10.0),
            advice: "Review machine maintenance logs and vascular access issues behind interrupted sessions.",
        },
        RecommendationRule {
            trigger: RuleTrigger::TopCategoryShareAbove(50.0),
            advice: "Distribute sessions more evenly across machines to limit wear on the busiest unit.",
        },
        RecommendationRule {
            trigger: RuleTrigger::YearOverYearAbove(20.0),
            advice: "Assess whether additional dialysis stations are needed to meet rising demand.",
        },
    ],
};

static PRESCRIPTION: ReportProfile = ReportProfile {
    kind: ReportKind::Prescription,
    title: "Prescription Report",
    record_noun: "prescription",
    record_noun_plural: "prescriptions",
    category_noun: "medication",
    statuses: &[
        StatusMeta {
            key: "DISPENSED",
            label: "Dispensed",
            description: "Medication handed to the patient",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "CANCELLED",
            label: "Cancelled",
            description: "Prescription withdrawn",
            colour: "#C62828",
            outcome: Outcome::Failure,
        },
        StatusMeta {
            key: "PENDING",
            label: "Pending",
            description: "Awaiting dispensing",
            colour: "#F9A825",
            outcome: Outcome::Open,
        },
    ],
    payload_label: "prescription cost",
    payload_unit: "",
    success_rate_label: "dispensing rate",
    failure_rate_label: "cancellation rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::OpenRateAbove(15.0),
            advice: "Clear the backlog of pending prescriptions and review pharmacy staffing.",
        },
        RecommendationRule {
            trigger: RuleTrigger::TopCategoryShareAbove(30.0),
            advice: "Check stock levels for the most prescribed medication to avoid shortages.",
        },
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(10.0),
            advice: "Audit cancelled prescriptions for prescribing errors.",
        },
    ],
};

static LAB: ReportProfile = ReportProfile {
    kind: ReportKind::Lab,
    title: "Laboratory Report",
    record_noun: "lab request",
    record_noun_plural: "lab requests",
    category_noun: "test type",
    statuses: &[
        StatusMeta {
            key: "COMPLETED",
            label: "Completed",
            description: "Result reported",
            colour: "#2E7D32",
            outcome: Outcome::Success,
        },
        StatusMeta {
            key: "IN_PROGRESS",
            label: "In progress",
            description: "Sample is being processed",
            colour: "#1565C0",
            outcome: Outcome::Open,
        },
        StatusMeta {
            key: "PENDING",
            label: "Pending",
            description: "Sample not yet received",
            colour: "#F9A825",
            outcome: Outcome::Open,
        },
        StatusMeta {
            key: "REJECTED",
            label: "Rejected",
            description: "Sample rejected by the laboratory",
            colour: "#C62828",
            outcome: Outcome::Failure,
        },
    ],
    payload_label: "turnaround time",
    payload_unit: "hours",
    success_rate_label: "completion rate",
    failure_rate_label: "rejection rate",
    rules: &[
        RecommendationRule {
            trigger: RuleTrigger::AveragePayloadAbove(24.0),
            advice: "Prioritise turnaround improvements, as results take more than a day on average.",
        },
        RecommendationRule {
            trigger: RuleTrigger::FailureRateAbove(5.0),
            advice: "Retrain sample collection staff to reduce rejected samples.",
        },
        RecommendationRule {
            trigger: RuleTrigger::SuccessRateBelow(80.0),
            advice: "Follow up outstanding requests so that more results are reported within the period.",
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_matching_profile() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportProfile::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn status_keys_are_canonical_and_unique() {
        for kind in ReportKind::ALL {
            let profile = kind.profile();
            for (i, status) in profile.statuses.iter().enumerate() {
                assert_eq!(status.key, normalise_status(status.key));
                assert!(profile.statuses[i + 1..].iter().all(|s| s.key != status.key));
            }
        }
    }

    #[test]
    fn classify_normalises_case_and_separators() {
        let profile = ReportKind::Appointment.profile();
        assert_eq!(profile.classify_status("no show").map(|s| s.key), Some("NO_SHOW"));
        assert_eq!(profile.classify_status(" No-Show ").map(|s| s.key), Some("NO_SHOW"));
        assert_eq!(profile.classify_status("completed").map(|s| s.key), Some("COMPLETED"));
    }

    #[test]
    fn classify_returns_none_for_unknown_status() {
        let profile = ReportKind::Lab.profile();
        assert!(profile.classify_status("LOST_IN_TRANSIT").is_none());
        assert!(profile.classify_status("").is_none());
    }

    #[test]
    fn every_profile_declares_success_and_failure_statuses() {
        for kind in ReportKind::ALL {
            let profile = kind.profile();
            assert!(profile.statuses.iter().any(|s| s.outcome == Outcome::Success));
            assert!(profile.statuses.iter().any(|s| s.outcome == Outcome::Failure));
        }
    }

    #[test]
    fn outcome_names_match_wire_form() {
        for outcome in [Outcome::Success, Outcome::Failure, Outcome::Open] {
            assert_eq!(serde_json::to_value(outcome).unwrap(), outcome.as_str());
        }
    }
}
