//! Record sources.
//!
//! The engine never queries storage itself. A [`RecordSource`] hands it a flat collection of
//! records for one report kind and period; the assembler asks once for the requested period and
//! once for the prior period. Failures are returned as [`FetchError`] and never retried.
//!
//! Two file-backed sources are provided for the front-ends:
//! - [`load_dataset`] reads a single JSON or YAML file holding records for every kind, which can
//!   then be served from memory with [`InMemorySource`].
//! - [`DatasetDir`] reads `<root>/<kind>.json` on every fetch.

use crate::error::FetchError;
use crate::period::Period;
use crate::record::{RawRecord, ReportKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub trait RecordSource {
    /// Return the records of `kind` that fall inside `period`.
    fn fetch(&self, kind: ReportKind, period: &Period) -> Result<Vec<RawRecord>, FetchError>;
}

impl<S: RecordSource + ?Sized> RecordSource for &S {
    fn fetch(&self, kind: ReportKind, period: &Period) -> Result<Vec<RawRecord>, FetchError> {
        (**self).fetch(kind, period)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    fn fetch(&self, kind: ReportKind, period: &Period) -> Result<Vec<RawRecord>, FetchError> {
        (**self).fetch(kind, period)
    }
}

/// Records for any number of report kinds, as stored in a dataset file.
///
/// ```yaml
/// records:
///   appointment:
///     - { id: 1, timestamp: "2024-03-04T09:00:00", status: COMPLETED, category: Cardiology }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub records: BTreeMap<ReportKind, Vec<RawRecord>>,
}

/// Load a dataset from a `.yaml`/`.yml` or JSON file.
///
/// The format is chosen by extension; anything that is not YAML is parsed as JSON.
///
/// # Errors
///
/// Returns `FetchError::Read` if the file cannot be read, or `FetchError::Json` /
/// `FetchError::Yaml` if it does not match the [`Dataset`] schema.
pub fn load_dataset(path: &Path) -> Result<Dataset, FetchError> {
    let contents = std::fs::read_to_string(path).map_err(|source| FetchError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let dataset = if is_yaml {
        serde_yaml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };
    Ok(dataset)
}

/// Serves records held in memory, filtering by period on every fetch.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    dataset: Dataset,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        Self { dataset }
    }

    /// Add records for `kind`, appending to any already present.
    pub fn with_records(mut self, kind: ReportKind, records: Vec<RawRecord>) -> Self {
        self.dataset.records.entry(kind).or_default().extend(records);
        self
    }
}

impl RecordSource for InMemorySource {
    fn fetch(&self, kind: ReportKind, period: &Period) -> Result<Vec<RawRecord>, FetchError> {
        Ok(self
            .dataset
            .records
            .get(&kind)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| period.contains(&r.timestamp))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Reads `<root>/<kind>.json` (a JSON array of records) on every fetch.
///
/// A missing file means the kind has no records; an unreadable or malformed one is a fetch
/// failure.
#[derive(Debug, Clone)]
pub struct DatasetDir {
    root: PathBuf,
}

impl DatasetDir {
    /// # Errors
    ///
    /// Returns `FetchError::Unavailable` if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FetchError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(FetchError::Unavailable(format!(
                "dataset directory does not exist: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_for(&self, kind: ReportKind) -> PathBuf {
        self.root.join(format!("{}.json", kind.as_str()))
    }
}

impl RecordSource for DatasetDir {
    fn fetch(&self, kind: ReportKind, period: &Period) -> Result<Vec<RawRecord>, FetchError> {
        let path = self.file_for(kind);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no dataset file for kind");
            return Ok(Vec::new());
        }

        let contents =
            std::fs::read_to_string(&path).map_err(|source| FetchError::Read { path, source })?;
        let records: Vec<RawRecord> = serde_json::from_str(&contents)?;

        Ok(records
            .into_iter()
            .filter(|r| period.contains(&r.timestamp))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use chrono::NaiveDate;
    use medstat_types::NonEmptyText;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> EngineConfig {
        EngineConfig::with_organisation(NonEmptyText::new("Test Hospital").unwrap())
    }

    fn record(id: u64, year: i32, month: u32) -> RawRecord {
        let ts = NaiveDate::from_ymd_opt(year, month, 10)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        RawRecord::new(id, ts, "COMPLETED", "Haematology")
    }

    #[test]
    fn in_memory_source_filters_by_kind_and_period() {
        let source = InMemorySource::new()
            .with_records(ReportKind::Lab, vec![record(1, 2024, 1), record(2, 2023, 1)])
            .with_records(ReportKind::Ward, vec![record(3, 2024, 1)]);
        let period = Period::annual(2024, &config()).unwrap();

        let lab = source.fetch(ReportKind::Lab, &period).unwrap();
        assert_eq!(lab.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1]);
        let previous = source.fetch(ReportKind::Lab, &period.previous()).unwrap();
        assert_eq!(previous.len(), 1);
        assert!(source.fetch(ReportKind::Dialysis, &period).unwrap().is_empty());
    }

    #[test]
    fn loads_json_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{"records": {"dialysis": [
                {"id": 1, "timestamp": "2024-05-01T07:30:00", "status": "COMPLETED", "category": "M-01", "value": 240}
            ]}}"#,
        )
        .unwrap();

        let dataset = load_dataset(&path).unwrap();
        let sessions = &dataset.records[&ReportKind::Dialysis];
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].value, Some(240.0));
    }

    #[test]
    fn loads_yaml_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.yaml");
        fs::write(
            &path,
            "records:\n  prescription:\n    - id: 4\n      timestamp: \"2024-02-03T11:00:00\"\n      status: DISPENSED\n      category: Amoxicillin\n      value: 12.5\n",
        )
        .unwrap();

        let dataset = load_dataset(&path).unwrap();
        assert_eq!(dataset.records[&ReportKind::Prescription][0].category, "Amoxicillin");
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"rows": []}"#).unwrap();
        assert!(matches!(load_dataset(&path), Err(FetchError::Json(_))));
    }

    #[test]
    fn missing_dataset_file_is_read_error() {
        let err = load_dataset(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, FetchError::Read { .. }));
    }

    #[test]
    fn dataset_dir_reads_per_kind_files() {
        let dir = TempDir::new().unwrap();
        let records = vec![record(1, 2024, 3), record(2, 2022, 3)];
        fs::write(
            dir.path().join("lab.json"),
            serde_json::to_string(&records).unwrap(),
        )
        .unwrap();

        let source = DatasetDir::new(dir.path()).unwrap();
        let period = Period::annual(2024, &config()).unwrap();
        assert_eq!(source.fetch(ReportKind::Lab, &period).unwrap().len(), 1);
        assert!(source.fetch(ReportKind::Ward, &period).unwrap().is_empty());
    }

    #[test]
    fn dataset_dir_reports_malformed_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("ward.json"), "not json").unwrap();
        let source = DatasetDir::new(dir.path()).unwrap();
        let period = Period::annual(2024, &config()).unwrap();
        assert!(matches!(
            source.fetch(ReportKind::Ward, &period),
            Err(FetchError::Json(_))
        ));
    }

    #[test]
    fn dataset_dir_requires_directory() {
        assert!(matches!(
            DatasetDir::new("/definitely/not/here"),
            Err(FetchError::Unavailable(_))
        ));
    }
}
