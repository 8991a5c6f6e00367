//! # Medstat Core
//!
//! Statistical reporting engine for hospital services.
//!
//! This crate turns flat collections of operational records (appointments, ward admissions,
//! dialysis sessions, prescriptions, lab requests, clinic visits) into immutable [`Report`]
//! trees:
//! - Dense time breakdowns and sparse categorical breakdowns of the records
//! - Rates, averages, peak/low selection and year-over-year comparison
//! - Templated narrative text derived only from the computed figures
//!
//! **No I/O in the engine**: records arrive through a [`RecordSource`], and rendering (JSON,
//! text, charts) happens in the front-end crates `medstat-cli` and `api-rest`.

pub mod aggregate;
pub mod assemble;
pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod narrative;
pub mod period;
pub mod profile;
pub mod record;
pub mod report;
pub mod source;

pub use assemble::{assemble, ReportAssembler};
pub use config::EngineConfig;
pub use error::{FetchError, ReportError, ReportResult};
pub use medstat_types::NonEmptyText;
pub use metrics::{Percentage, Summary};
pub use narrative::{Narrative, Section};
pub use period::Period;
pub use profile::ReportProfile;
pub use record::{RawRecord, ReportKind};
pub use report::{Breakdown, BreakdownKind, ChartPoint, Report, ReportBuilder};
pub use source::{load_dataset, Dataset, DatasetDir, InMemorySource, RecordSource};
