//! Summary statistics over the full record set.
//!
//! These functions always take the unfiltered records. The "high risk" count matches on a
//! substring of the status label while [`RiskDistribution`] counts exact categories, so a
//! "Very High Risk" patient is counted once in the first and only under `very_high` in the
//! second.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::TOP_MISSING_HCC_LIMIT;
use crate::patient::{MeasureStatus, PatientRecord, RiskStatus};

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Number of patients whose status contains "High Risk" (both high and very high).
pub fn high_risk_count(records: &[PatientRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status.as_str().contains("High Risk"))
        .count()
}

pub fn total_missing_codes(records: &[PatientRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.missing_codes)).sum()
}

/// Mean risk score rounded to two decimals, or `None` for an empty record set.
pub fn mean_risk_score(records: &[PatientRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.risk_score).sum();
    Some(round_to(sum / records.len() as f64, 2))
}

/// Sum of quality gap counts; records without quality data contribute zero.
pub fn total_quality_gaps(records: &[PatientRecord]) -> u64 {
    records.iter().map(|r| u64::from(r.quality_gaps())).sum()
}

/// Patients per exact risk category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RiskDistribution {
    pub very_high: usize,
    pub high: usize,
    pub moderate: usize,
}

impl RiskDistribution {
    pub fn count(&self, status: RiskStatus) -> usize {
        match status {
            RiskStatus::VeryHigh => self.very_high,
            RiskStatus::High => self.high,
            RiskStatus::Moderate => self.moderate,
        }
    }
}

pub fn risk_distribution(records: &[PatientRecord]) -> RiskDistribution {
    let exact = |status: RiskStatus| records.iter().filter(|r| r.status == status).count();
    RiskDistribution {
        very_high: exact(RiskStatus::VeryHigh),
        high: exact(RiskStatus::High),
        moderate: exact(RiskStatus::Moderate),
    }
}

/// Headline figures for the list screen summary cards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    pub total_patients: usize,
    pub high_risk_patients: usize,
    pub total_missing_codes: u64,
    pub mean_risk_score: Option<f64>,
    pub total_quality_gaps: u64,
    pub distribution: RiskDistribution,
}

pub fn summarize(records: &[PatientRecord]) -> Summary {
    Summary {
        total_patients: records.len(),
        high_risk_patients: high_risk_count(records),
        total_missing_codes: total_missing_codes(records),
        mean_risk_score: mean_risk_score(records),
        total_quality_gaps: total_quality_gaps(records),
        distribution: risk_distribution(records),
    }
}

/// Mean HEDIS overall score (one decimal) over records that carry quality data.
pub fn mean_quality_score(records: &[PatientRecord]) -> Option<f64> {
    let scores: Vec<f64> = records
        .iter()
        .filter_map(|r| r.quality.as_ref())
        .map(|q| f64::from(q.overall_score))
        .collect();
    if scores.is_empty() {
        return None;
    }
    Some(round_to(scores.iter().sum::<f64>() / scores.len() as f64, 1))
}

/// Compliance of one quality measure across the population.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MeasureCompliance {
    pub code: String,
    /// Patients with the measure in `Met` status.
    pub met: usize,
    /// Patients for whom the measure is tracked at all.
    pub eligible: usize,
    /// `met / eligible` as a whole percentage.
    pub rate: u32,
}

/// Per-measure compliance, ordered by measure code.
pub fn measure_compliance(records: &[PatientRecord]) -> Vec<MeasureCompliance> {
    let mut tally: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for quality in records.iter().filter_map(|r| r.quality.as_ref()) {
        for (code, result) in &quality.measures {
            let entry = tally.entry(code.as_str()).or_default();
            entry.1 += 1;
            if result.status == MeasureStatus::Met {
                entry.0 += 1;
            }
        }
    }

    tally
        .into_iter()
        .map(|(code, (met, eligible))| MeasureCompliance {
            code: code.to_string(),
            met,
            eligible,
            rate: round_to(met as f64 / eligible as f64 * 100.0, 0) as u32,
        })
        .collect()
}

/// How often an HCC appears among patients' missing risk codes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissingHccCount {
    pub hcc_code: String,
    pub condition: String,
    pub count: usize,
}

/// The `limit` most frequent missing HCCs, most frequent first, ties broken by code.
pub fn top_missing_hccs(records: &[PatientRecord], limit: usize) -> Vec<MissingHccCount> {
    let mut tally: BTreeMap<&str, MissingHccCount> = BTreeMap::new();
    for missing in records.iter().flat_map(|r| &r.detail.missing_risk_codes) {
        tally
            .entry(missing.hcc_code.as_str())
            .or_insert_with(|| MissingHccCount {
                hcc_code: missing.hcc_code.clone(),
                condition: missing.condition.clone(),
                count: 0,
            })
            .count += 1;
    }

    let mut counts: Vec<MissingHccCount> = tally.into_values().collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}

/// Records whose asserted status differs from the band of their risk score.
pub fn band_mismatches(records: &[PatientRecord]) -> Vec<&PatientRecord> {
    records.iter().filter(|r| !r.status_matches_band()).collect()
}

/// Everything shown on the analytics screen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analytics {
    pub summary: Summary,
    pub mean_quality_score: Option<f64>,
    pub measure_compliance: Vec<MeasureCompliance>,
    pub top_missing_hccs: Vec<MissingHccCount>,
    pub band_mismatches: usize,
}

pub fn analyze(records: &[PatientRecord]) -> Analytics {
    Analytics {
        summary: summarize(records),
        mean_quality_score: mean_quality_score(records),
        measure_compliance: measure_compliance(records),
        top_missing_hccs: top_missing_hccs(records, TOP_MISSING_HCC_LIMIT),
        band_mismatches: band_mismatches(records).len(),
    }
}

/// Render an optional mean for display, using "N/A" when there is no data.
pub fn format_mean(value: Option<f64>, places: usize) -> String {
    match value {
        Some(v) => format!("{v:.places$}"),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{filter_and_sort, StatusFilter};
    use crate::store::{EmbeddedRecords, RecordStore};

    fn embedded() -> RecordStore {
        RecordStore::load(&EmbeddedRecords).unwrap()
    }

    #[test]
    fn summary_over_embedded_dataset() {
        let store = embedded();
        let summary = summarize(store.records());

        assert_eq!(summary.total_patients, 10);
        assert_eq!(summary.high_risk_patients, 7);
        assert_eq!(summary.total_missing_codes, 20);
        assert_eq!(summary.mean_risk_score, Some(2.57));
        assert_eq!(summary.total_quality_gaps, 6);
        assert_eq!(
            summary.distribution,
            RiskDistribution {
                very_high: 2,
                high: 5,
                moderate: 3,
            }
        );
    }

    #[test]
    fn empty_set_reports_no_data_instead_of_nan() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_patients, 0);
        assert_eq!(summary.mean_risk_score, None);
        assert_eq!(mean_quality_score(&[]), None);
        assert_eq!(format_mean(summary.mean_risk_score, 2), "N/A");
    }

    #[test]
    fn high_risk_count_uses_substring_but_distribution_is_exact() {
        let store = embedded();
        let records = store.records();
        let distribution = risk_distribution(records);
        assert_eq!(
            high_risk_count(records),
            distribution.very_high + distribution.high
        );
        assert_eq!(distribution.count(RiskStatus::High), 5);
    }

    #[test]
    fn missing_code_total_ignores_filtered_view() {
        let store = embedded();
        let before = total_missing_codes(store.records());
        let filtered = filter_and_sort(
            store.records(),
            "",
            &StatusFilter::from_param("moderate"),
            None,
        );
        assert!(filtered.len() < store.len());
        assert_eq!(total_missing_codes(store.records()), before);

        let mut reversed = store.records().to_vec();
        reversed.reverse();
        assert_eq!(total_missing_codes(&reversed), before);
    }

    #[test]
    fn measure_compliance_counts_met_over_tracked() {
        let store = embedded();
        let compliance = measure_compliance(store.records());
        let eye = compliance.iter().find(|m| m.code == "CDC-Eye").unwrap();
        // Tracked for patients 1, 4, 7, 8, 10; met for 7 and 10.
        assert_eq!((eye.met, eye.eligible, eye.rate), (2, 5, 40));

        let codes: Vec<&str> = compliance.iter().map(|m| m.code.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[test]
    fn mean_quality_score_skips_records_without_quality_data() {
        let store = embedded();
        // 75, 82, 90, 64, 78, 71, 85
        assert_eq!(mean_quality_score(store.records()), Some(77.9));
    }

    #[test]
    fn top_missing_hccs_orders_by_frequency_then_code() {
        let store = embedded();
        let top = top_missing_hccs(store.records(), 10);
        let codes: Vec<(&str, usize)> = top.iter().map(|m| (m.hcc_code.as_str(), m.count)).collect();
        assert_eq!(codes, vec![("HCC-18", 2), ("HCC-85", 2), ("HCC-137", 1)]);

        assert_eq!(top_missing_hccs(store.records(), 1).len(), 1);
    }

    #[test]
    fn analytics_reports_band_mismatches() {
        let store = embedded();
        let analytics = analyze(store.records());
        // Robert Chen: 3.12 asserted as High Risk.
        assert_eq!(analytics.band_mismatches, 1);
        assert_eq!(analytics.summary.total_patients, 10);
    }

    #[test]
    fn round_to_rounds_half_away_from_zero() {
        assert_eq!(round_to(2.573, 2), 2.57);
        assert_eq!(round_to(2.575, 1), 2.6);
        assert_eq!(round_to(40.0, 0), 40.0);
    }
}
