//! Coding and quality-measure education content.
//!
//! Content is keyed by code: ICD-10 and HCC codes map to [`CodeEducation`], HEDIS measure
//! codes map to [`MeasureEducation`]. Every lookup returns a [`Lookup`], so callers always
//! handle the unknown-code case explicitly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::EMBEDDED_EDUCATION_YAML;
use crate::store::schema_error;
use crate::RavResult;

/// Fallback title for a measure code with no education entry.
pub const UNKNOWN_MEASURE_TITLE: &str = "Unknown Measure";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeEducation {
    pub title: String,
    /// HCC the code rolls up to. Absent for HCC entries themselves.
    #[serde(default)]
    pub hcc: Option<String>,
    pub definition: String,
    pub clinical_criteria: Vec<String>,
    pub documentation_tips: Vec<String>,
    pub common_pitfalls: Vec<String>,
    #[serde(default)]
    pub risk_weight: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureEducation {
    pub title: String,
    pub description: String,
    pub specification: String,
    pub target: String,
    pub clinical_rationale: String,
    pub interventions: Vec<String>,
}

/// Outcome of a catalog lookup.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a, T> {
    Known { code: &'a str, entry: &'a T },
    Unknown,
}

impl<'a, T> Lookup<'a, T> {
    pub fn entry(self) -> Option<&'a T> {
        match self {
            Lookup::Known { entry, .. } => Some(entry),
            Lookup::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Lookup::Known { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EducationCatalog {
    #[serde(default)]
    codes: BTreeMap<String, CodeEducation>,
    #[serde(default)]
    measures: BTreeMap<String, MeasureEducation>,
}

impl EducationCatalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `RavError::Schema` if the embedded content does not match the schema.
    pub fn embedded() -> RavResult<Self> {
        Self::from_yaml(EMBEDDED_EDUCATION_YAML)
    }

    /// Parse a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `RavError::Schema` naming the failing field path.
    pub fn from_yaml(yaml_text: &str) -> RavResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);
        let catalog = serde_path_to_error::deserialize::<_, EducationCatalog>(deserializer)
            .map_err(|err| schema_error("education", err))?;
        tracing::debug!(
            "education catalog: {} codes, {} measures",
            catalog.codes.len(),
            catalog.measures.len()
        );
        Ok(catalog)
    }

    /// Look up education for an ICD-10 or HCC code.
    ///
    /// Surrounding whitespace is ignored, and a lowercase query falls back to the uppercase key.
    pub fn code(&self, code: &str) -> Lookup<'_, CodeEducation> {
        lookup(&self.codes, code)
    }

    /// Look up education for a HEDIS measure code.
    pub fn measure(&self, code: &str) -> Lookup<'_, MeasureEducation> {
        lookup(&self.measures, code)
    }

    /// Display title of a measure, or [`UNKNOWN_MEASURE_TITLE`].
    pub fn measure_title(&self, code: &str) -> &str {
        self.measure(code)
            .entry()
            .map_or(UNKNOWN_MEASURE_TITLE, |m| m.title.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codes.keys().map(String::as_str)
    }

    pub fn measures(&self) -> impl Iterator<Item = &str> {
        self.measures.keys().map(String::as_str)
    }
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, code: &str) -> Lookup<'a, T> {
    let code = code.trim();
    map.get_key_value(code)
        .or_else(|| map.get_key_value(&code.to_ascii_uppercase()))
        .map_or(Lookup::Unknown, |(code, entry)| Lookup::Known {
            code: code.as_str(),
            entry,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> EducationCatalog {
        EducationCatalog::embedded().unwrap()
    }

    #[test]
    fn embedded_catalog_has_codes_and_measures() {
        let catalog = catalog();
        assert_eq!(catalog.codes().collect::<Vec<_>>(), vec!["E11.9", "HCC-19", "I10"]);
        assert_eq!(catalog.measures().count(), 5);
    }

    #[test]
    fn known_code_returns_entry() {
        let catalog = catalog();
        let entry = catalog.code("E11.9").entry().unwrap();
        assert_eq!(entry.hcc.as_deref(), Some("HCC-19"));
        assert_eq!(entry.risk_weight, Some(0.318));
        assert_eq!(entry.clinical_criteria.len(), 4);
    }

    #[test]
    fn lookup_tolerates_case_and_whitespace() {
        let catalog = catalog();
        match catalog.code("  hcc-19 ") {
            Lookup::Known { code, entry } => {
                assert_eq!(code, "HCC-19");
                assert!(entry.hcc.is_none());
            }
            Lookup::Unknown => panic!("expected HCC-19 to be known"),
        }
    }

    #[test]
    fn unknown_code_falls_back() {
        let catalog = catalog();
        assert!(!catalog.code("Z99.89").is_known());
        assert_eq!(catalog.measure_title("XYZ"), UNKNOWN_MEASURE_TITLE);
        assert_eq!(
            catalog.measure_title("CBP"),
            "Controlling High Blood Pressure"
        );
    }

    #[test]
    fn from_yaml_rejects_missing_fields() {
        let err = EducationCatalog::from_yaml("codes:\n  X1:\n    title: Only a title\n").unwrap_err();
        assert!(err.to_string().contains("education schema mismatch"));
    }
}
