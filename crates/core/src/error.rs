use std::path::PathBuf;

/// Failures raised by a [`RecordSource`](crate::source::RecordSource) while fetching records.
///
/// The engine never retries these; they are wrapped in [`ReportError::Fetch`] and returned to the
/// caller unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to read dataset {path}: {source}", path = path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse YAML dataset: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("unknown report kind: {0}")]
    UnknownKind(String),
    #[error("failed to fetch records: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid report: {0}")]
    InvalidReport(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type ReportResult<T> = std::result::Result<T, ReportError>;
