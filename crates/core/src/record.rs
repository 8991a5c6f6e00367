//! Raw operational records and the report kinds they belong to.

use crate::profile::ReportProfile;
use crate::ReportError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The family of report a record collection feeds.
///
/// Each variant has exactly one static
/// [`ReportProfile`] describing its vocabulary and narrative wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Clinic,
    Ward,
    Appointment,
    Dialysis,
    Prescription,
    Lab,
}

impl ReportKind {
    pub const ALL: [ReportKind; 6] = [
        ReportKind::Clinic,
        ReportKind::Ward,
        ReportKind::Appointment,
        ReportKind::Dialysis,
        ReportKind::Prescription,
        ReportKind::Lab,
    ];

    /// Returns the wire name used in URLs, dataset keys and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Clinic => "clinic",
            ReportKind::Ward => "ward",
            ReportKind::Appointment => "appointment",
            ReportKind::Dialysis => "dialysis",
            ReportKind::Prescription => "prescription",
            ReportKind::Lab => "lab",
        }
    }

    /// Returns the static profile for this kind.
    pub fn profile(self) -> &'static ReportProfile {
        ReportProfile::for_kind(self)
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ReportError::UnknownKind(s.to_string()))
    }
}

/// One clinical or operational event as delivered by the record source.
///
/// `status` is matched against the report kind's declared vocabulary; values outside it are
/// folded into the "Other" bucket rather than rejected. `category` is the open dimension
/// (specialization, ward, machine, medication or test type). `value` is the optional numeric
/// payload such as a duration or a cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: u64,
    pub timestamp: NaiveDateTime,
    pub status: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn new(
        id: u64,
        timestamp: NaiveDateTime,
        status: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            timestamp,
            status: status.into(),
            category: category.into(),
            value: None,
        }
    }

    /// Attach a numeric payload.
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// The numeric payload, ignoring non-finite values.
    pub(crate) fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}
