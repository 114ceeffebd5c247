//! Patient record model.
//!
//! Records are read once from a [`crate::store::RecordSource`] and never mutated afterwards.
//! The serde derives double as the data-file schema: unknown keys are rejected so that a typo
//! in a data file fails at load time instead of silently dropping a field.

use chrono::NaiveDate;
use rav_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::{HIGH_RISK_THRESHOLD, VERY_HIGH_RISK_THRESHOLD};

/// Stable identifier of a patient record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(u32);

impl PatientId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for PatientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for PatientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
            Gender::Other => "Other",
        }
    }

    /// Single-letter form used in compact table cells.
    pub fn initial(self) -> char {
        match self {
            Gender::Female => 'F',
            Gender::Male => 'M',
            Gender::Other => 'O',
        }
    }
}

/// Asserted risk category of a patient.
///
/// The category is carried as data and is not recomputed from the risk score. Use
/// [`RiskStatus::band_for_score`] to compare it against the score bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStatus {
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Very High Risk")]
    VeryHigh,
}

impl RiskStatus {
    pub const ALL: [RiskStatus; 3] = [RiskStatus::VeryHigh, RiskStatus::High, RiskStatus::Moderate];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskStatus::Moderate => "Moderate Risk",
            RiskStatus::High => "High Risk",
            RiskStatus::VeryHigh => "Very High Risk",
        }
    }

    /// Score band for a risk score: above 3.0 is very high, 2.0 to 3.0 is high, below 2.0 is
    /// moderate.
    pub fn band_for_score(score: f64) -> RiskStatus {
        if score > VERY_HIGH_RISK_THRESHOLD {
            RiskStatus::VeryHigh
        } else if score >= HIGH_RISK_THRESHOLD {
            RiskStatus::High
        } else {
            RiskStatus::Moderate
        }
    }

    /// Human-readable description of the score band for this category.
    pub fn band_label(self) -> &'static str {
        match self {
            RiskStatus::VeryHigh => "Risk Score > 3.0",
            RiskStatus::High => "Risk Score 2.0 - 3.0",
            RiskStatus::Moderate => "Risk Score < 2.0",
        }
    }
}

impl std::fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureStatus {
    Met,
    Gap,
    #[serde(rename = "Due Soon")]
    DueSoon,
}

impl MeasureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MeasureStatus::Met => "Met",
            MeasureStatus::Gap => "Gap",
            MeasureStatus::DueSoon => "Due Soon",
        }
    }
}

/// Result of one quality measure for one patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeasureResult {
    pub status: MeasureStatus,
    pub last_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub value: Option<String>,
}

/// HEDIS quality-measure summary attached to a patient.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QualityMeasureSummary {
    pub overall_score: u8,
    pub measures: BTreeMap<String, MeasureResult>,
    /// Stored count of measures in `Gap` status. Checked against `measures` at load time.
    pub gap_count: u32,
}

impl QualityMeasureSummary {
    /// Number of measures whose status is `Gap`, computed from the measures themselves.
    pub fn derived_gap_count(&self) -> u32 {
        self.count_with_status(MeasureStatus::Gap)
    }

    pub fn met_count(&self) -> u32 {
        self.count_with_status(MeasureStatus::Met)
    }

    fn count_with_status(&self, status: MeasureStatus) -> u32 {
        self.measures
            .values()
            .filter(|m| m.status == status)
            .count() as u32
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientProfile {
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub phone: String,
    pub emergency_contact: String,
    pub primary_care_provider: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosisEntry {
    pub date: NaiveDate,
    pub code: String,
    pub description: String,
    /// HCC the code maps to; `None` when the code carries no HCC.
    #[serde(default)]
    pub hcc: Option<String>,
    pub weight: f64,
}

/// An HCC documented in an earlier year but absent from current documentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissingRiskCode {
    pub hcc_code: String,
    pub condition: String,
    pub last_reported: NaiveDate,
    pub status: String,
    pub intervention: String,
    pub reasoning: String,
}

/// One component of the risk score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskFactor {
    pub condition: String,
    pub hcc: String,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Visit {
    pub date: NaiveDate,
    pub visit_type: String,
    pub provider: String,
    pub chief_complaint: String,
    pub assessment: String,
    pub plan: String,
}

/// Supporting clinical detail shown on the patient detail screen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClinicalDetail {
    #[serde(default)]
    pub profile: Option<PatientProfile>,
    #[serde(default)]
    pub diagnosis_history: Vec<DiagnosisEntry>,
    #[serde(default)]
    pub missing_risk_codes: Vec<MissingRiskCode>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub recent_visits: Vec<Visit>,
}

impl ClinicalDetail {
    /// Percent contribution of each risk factor to the summed weight, rounded to one decimal.
    ///
    /// Returns an empty list when there are no factors or the weights sum to zero.
    pub fn risk_contributions(&self) -> Vec<(&RiskFactor, f64)> {
        let total: f64 = self.risk_factors.iter().map(|f| f.weight).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        self.risk_factors
            .iter()
            .map(|f| (f, crate::aggregate::round_to(f.weight / total * 100.0, 1)))
            .collect()
    }
}

/// A single patient risk-adjustment record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: NonEmptyText,
    pub age: u32,
    pub gender: Gender,
    pub insurance_id: NonEmptyText,
    pub risk_score: f64,
    /// ICD-10 codes, positionally aligned with `condition_names`.
    pub diagnosis_codes: Vec<String>,
    pub condition_names: Vec<String>,
    pub last_visit: NaiveDate,
    pub missing_codes: u32,
    pub status: RiskStatus,
    #[serde(default)]
    pub quality: Option<QualityMeasureSummary>,
    #[serde(default)]
    pub detail: ClinicalDetail,
}

impl PatientRecord {
    /// Diagnosis codes paired with their condition names.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &str)> {
        self.diagnosis_codes
            .iter()
            .map(String::as_str)
            .zip(self.condition_names.iter().map(String::as_str))
    }

    /// Quality gap count, treating absent quality data as zero.
    pub fn quality_gaps(&self) -> u32 {
        self.quality.as_ref().map_or(0, |q| q.gap_count)
    }

    /// Whether the asserted status agrees with the score band of the risk score.
    pub fn status_matches_band(&self) -> bool {
        RiskStatus::band_for_score(self.risk_score) == self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_for_score_uses_inclusive_high_band() {
        assert_eq!(RiskStatus::band_for_score(4.23), RiskStatus::VeryHigh);
        assert_eq!(RiskStatus::band_for_score(3.0), RiskStatus::High);
        assert_eq!(RiskStatus::band_for_score(2.0), RiskStatus::High);
        assert_eq!(RiskStatus::band_for_score(1.99), RiskStatus::Moderate);
        assert_eq!(RiskStatus::band_for_score(0.0), RiskStatus::Moderate);
    }

    #[test]
    fn risk_status_round_trips_display_labels() {
        let parsed: RiskStatus = serde_json::from_str("\"Very High Risk\"").unwrap();
        assert_eq!(parsed, RiskStatus::VeryHigh);
        assert_eq!(parsed.to_string(), "Very High Risk");
        assert!(serde_json::from_str::<RiskStatus>("\"Low Risk\"").is_err());
    }

    #[test]
    fn patient_id_parses_trimmed_numbers() {
        assert_eq!("  7 ".parse::<PatientId>().unwrap(), PatientId::new(7));
        assert!("seven".parse::<PatientId>().is_err());
    }

    #[test]
    fn risk_contributions_split_total_weight() {
        let detail = ClinicalDetail {
            risk_factors: vec![
                RiskFactor {
                    condition: "Type 2 Diabetes".into(),
                    hcc: "HCC-19".into(),
                    weight: 1.0,
                },
                RiskFactor {
                    condition: "Age/Gender Factor".into(),
                    hcc: "Demo".into(),
                    weight: 3.0,
                },
            ],
            ..ClinicalDetail::default()
        };

        let contributions: Vec<f64> = detail
            .risk_contributions()
            .into_iter()
            .map(|(_, pct)| pct)
            .collect();
        assert_eq!(contributions, vec![25.0, 75.0]);
    }

    #[test]
    fn risk_contributions_empty_for_zero_weight() {
        let detail = ClinicalDetail {
            risk_factors: vec![RiskFactor {
                condition: "None".into(),
                hcc: "None".into(),
                weight: 0.0,
            }],
            ..ClinicalDetail::default()
        };
        assert!(detail.risk_contributions().is_empty());
    }
}
