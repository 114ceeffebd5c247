//! Record sources and the immutable record store.
//!
//! The store is filled once from a [`RecordSource`] and then shared read-only. Two sources
//! exist: the synthetic dataset compiled into the binary, and a YAML or JSON file named by
//! configuration. Both go through the same parser and the same validation, so a bad embedded
//! record fails exactly like a bad file record.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::EMBEDDED_RECORDS_YAML;
use crate::patient::{PatientId, PatientRecord};
use crate::validation::validate_records;
use crate::{RavError, RavResult};

/// Top-level shape of a records document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordsDocument {
    patients: Vec<PatientRecord>,
}

/// Somewhere patient records can be loaded from.
pub trait RecordSource {
    /// Short description used in log lines.
    fn describe(&self) -> String;

    /// Load every record from this source. Records are not yet validated.
    fn load_records(&self) -> RavResult<Vec<PatientRecord>>;
}

/// The synthetic dataset shipped with the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedRecords;

impl RecordSource for EmbeddedRecords {
    fn describe(&self) -> String {
        "embedded synthetic dataset".into()
    }

    fn load_records(&self) -> RavResult<Vec<PatientRecord>> {
        parse_records_yaml(EMBEDDED_RECORDS_YAML)
    }
}

/// Records read from a `.yaml`, `.yml` or `.json` file.
#[derive(Clone, Debug)]
pub struct FileRecords {
    path: PathBuf,
}

impl FileRecords {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileRecords {
    fn describe(&self) -> String {
        format!("records file {}", self.path.display())
    }

    fn load_records(&self) -> RavResult<Vec<PatientRecord>> {
        let extension = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let contents = std::fs::read_to_string(&self.path).map_err(|source| RavError::FileRead {
            path: self.path.clone(),
            source,
        })?;

        match extension.as_str() {
            "yaml" | "yml" => parse_records_yaml(&contents),
            "json" => parse_records_json(&contents),
            other => Err(RavError::UnsupportedFormat(format!(
                "expected .yaml, .yml or .json, got '{other}'"
            ))),
        }
    }
}

/// Parse a records document from YAML text.
///
/// Schema mismatches report the path of the failing field (for example
/// `patients[3].risk_score`).
///
/// # Errors
///
/// Returns `RavError::Schema` if the text does not match the records schema.
pub fn parse_records_yaml(yaml_text: &str) -> RavResult<Vec<PatientRecord>> {
    let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
    serde_path_to_error::deserialize::<_, RecordsDocument>(deserializer)
        .map(|doc| doc.patients)
        .map_err(|err| schema_error("records", err))
}

/// Parse a records document from JSON text.
///
/// # Errors
///
/// Returns `RavError::Schema` if the text does not match the records schema.
pub fn parse_records_json(json_text: &str) -> RavResult<Vec<PatientRecord>> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);
    serde_path_to_error::deserialize::<_, RecordsDocument>(&mut deserializer)
        .map(|doc| doc.patients)
        .map_err(|err| schema_error("records", err))
}

pub(crate) fn schema_error<E: std::fmt::Display>(
    document: &'static str,
    err: serde_path_to_error::Error<E>,
) -> RavError {
    let path = err.path().to_string();
    let path = if path.is_empty() || path == "." {
        "<root>".to_string()
    } else {
        path
    };
    RavError::Schema {
        document,
        path,
        message: err.into_inner().to_string(),
    }
}

/// Immutable, validated collection of patient records.
///
/// Cloning is cheap; clones share the same records.
#[derive(Clone, Debug)]
pub struct RecordStore {
    records: Arc<[PatientRecord]>,
}

impl RecordStore {
    /// Load and validate every record from `source`.
    ///
    /// # Errors
    ///
    /// Returns any load, schema or validation error. No store is produced on failure.
    pub fn load(source: &dyn RecordSource) -> RavResult<Self> {
        let records = source.load_records()?;
        let store = Self::from_records(records)?;
        tracing::info!(
            "loaded {} patient records from {}",
            store.len(),
            source.describe()
        );

        let mismatched = store
            .records()
            .iter()
            .filter(|r| !r.status_matches_band())
            .count();
        if mismatched > 0 {
            tracing::warn!(
                "{} records carry a risk status outside their score band",
                mismatched
            );
        }

        Ok(store)
    }

    /// Build a store from records already in memory.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any record is malformed or identifiers repeat.
    pub fn from_records(records: Vec<PatientRecord>) -> RavResult<Self> {
        validate_records(&records)?;
        Ok(Self {
            records: records.into(),
        })
    }

    /// All records, in source order.
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    pub fn get(&self, id: PatientId) -> Option<&PatientRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PatientId> + '_ {
        self.records.iter().map(|r| r.id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ONE_PATIENT_YAML: &str = r#"
patients:
  - id: 1
    name: Ada Example
    age: 70
    gender: Female
    insurance_id: MED-000000001
    risk_score: 2.5
    diagnosis_codes: [E11.9]
    condition_names: [Type 2 Diabetes]
    last_visit: 2024-12-01
    missing_codes: 1
    status: High Risk
"#;

    #[test]
    fn embedded_dataset_loads_and_validates() {
        let store = RecordStore::load(&EmbeddedRecords).unwrap();
        assert_eq!(store.len(), 10);

        let sarah = store.get(PatientId::new(1)).unwrap();
        assert_eq!(sarah.name.as_str(), "Sarah Johnson");
        assert_eq!(sarah.insurance_id.as_str(), "MED-789456123");
        assert!(sarah.quality.is_some());
        assert!(sarah.detail.profile.is_some());
    }

    #[test]
    fn parse_yaml_defaults_optional_sections() {
        let records = parse_records_yaml(ONE_PATIENT_YAML).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].quality.is_none());
        assert!(records[0].detail.diagnosis_history.is_empty());
    }

    #[test]
    fn parse_yaml_reports_field_path_on_missing_field() {
        let yaml = ONE_PATIENT_YAML.replace("    risk_score: 2.5\n", "");
        let err = parse_records_yaml(&yaml).unwrap_err();
        match err {
            RavError::Schema { path, message, .. } => {
                assert!(path.starts_with("patients"), "path was {path}");
                assert!(message.contains("risk_score"), "message was {message}");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn parse_yaml_rejects_unknown_fields() {
        let yaml = format!("{ONE_PATIENT_YAML}    favourite_colour: blue\n");
        assert!(matches!(
            parse_records_yaml(&yaml),
            Err(RavError::Schema { .. })
        ));
    }

    #[test]
    fn parse_yaml_rejects_unknown_status() {
        let yaml = ONE_PATIENT_YAML.replace("High Risk", "Extreme Risk");
        assert!(parse_records_yaml(&yaml).is_err());
    }

    #[test]
    fn parse_json_document() {
        let json = r#"{"patients": [{
            "id": 4, "name": "Json Patient", "age": 44, "gender": "Male",
            "insurance_id": "MED-4", "risk_score": 0.9,
            "diagnosis_codes": [], "condition_names": [],
            "last_visit": "2024-11-11", "missing_codes": 0, "status": "Moderate Risk"
        }]}"#;
        let records = parse_records_json(json).unwrap();
        assert_eq!(records[0].id, PatientId::new(4));
    }

    #[test]
    fn file_source_reads_yaml_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(ONE_PATIENT_YAML.as_bytes()).unwrap();

        let store = RecordStore::load(&FileRecords::new(&path)).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_source_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        std::fs::write(&path, "id,name\n").unwrap();

        let err = FileRecords::new(&path).load_records().unwrap_err();
        assert!(matches!(err, RavError::UnsupportedFormat(_)));
    }

    #[test]
    fn file_source_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileRecords::new(dir.path().join("absent.yaml"))
            .load_records()
            .unwrap_err();
        assert!(matches!(err, RavError::FileRead { .. }));
    }

    #[test]
    fn load_fails_fast_on_invalid_record() {
        let yaml = ONE_PATIENT_YAML.replace("age: 70", "age: 0");
        let records = parse_records_yaml(&yaml).unwrap();
        let err = RecordStore::from_records(records).unwrap_err();
        assert!(matches!(err, RavError::InvalidRecord { .. }));
    }

    #[test]
    fn empty_store_is_valid() {
        let store = RecordStore::from_records(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert!(store.get(PatientId::new(1)).is_none());
    }
}
