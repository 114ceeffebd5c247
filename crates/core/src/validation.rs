//! Load-time validation of patient records.
//!
//! Every record is checked before it enters a [`crate::store::RecordStore`]. A record that
//! fails any check aborts the load; nothing downstream ever sees a partially valid record.

use std::collections::HashSet;

use crate::constants::MAX_PATIENT_AGE;
use crate::patient::{PatientId, PatientRecord, QualityMeasureSummary};
use crate::{RavError, RavResult};

/// Validates a full record set: each record individually, then identifier uniqueness.
///
/// # Errors
///
/// Returns the first `RavError::InvalidRecord` or `RavError::DuplicatePatientId` found.
pub fn validate_records(records: &[PatientRecord]) -> RavResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        validate_record(record)?;
        if !seen.insert(record.id) {
            return Err(RavError::DuplicatePatientId(record.id));
        }
    }
    Ok(())
}

/// Validates the field-level invariants of a single record.
///
/// # Errors
///
/// Returns `RavError::InvalidRecord` naming the record and the failed invariant.
pub fn validate_record(record: &PatientRecord) -> RavResult<()> {
    let id = record.id;

    if id.value() == 0 {
        return Err(invalid(id, "id must be a positive integer".into()));
    }

    if record.age == 0 || record.age > MAX_PATIENT_AGE {
        return Err(invalid(
            id,
            format!("age must be between 1 and {MAX_PATIENT_AGE}, got {}", record.age),
        ));
    }

    if !record.risk_score.is_finite() || record.risk_score < 0.0 {
        return Err(invalid(
            id,
            format!("risk_score must be a non-negative number, got {}", record.risk_score),
        ));
    }

    if record.diagnosis_codes.len() != record.condition_names.len() {
        return Err(invalid(
            id,
            format!(
                "diagnosis_codes ({}) and condition_names ({}) must have the same length",
                record.diagnosis_codes.len(),
                record.condition_names.len()
            ),
        ));
    }

    if let Some(pos) = record
        .diagnosis_codes
        .iter()
        .chain(record.condition_names.iter())
        .position(|s| s.trim().is_empty())
    {
        return Err(invalid(
            id,
            format!("diagnosis code or condition name at position {pos} is blank"),
        ));
    }

    if let Some(quality) = &record.quality {
        validate_quality(id, quality)?;
    }

    validate_detail(record)
}

fn validate_quality(id: PatientId, quality: &QualityMeasureSummary) -> RavResult<()> {
    if quality.overall_score > 100 {
        return Err(invalid(
            id,
            format!(
                "quality overall_score must be 0-100, got {}",
                quality.overall_score
            ),
        ));
    }

    if quality.measures.keys().any(|code| code.trim().is_empty()) {
        return Err(invalid(id, "quality measure code cannot be blank".into()));
    }

    let derived = quality.derived_gap_count();
    if quality.gap_count != derived {
        return Err(invalid(
            id,
            format!(
                "quality gap_count is {} but {} measures are in Gap status",
                quality.gap_count, derived
            ),
        ));
    }

    Ok(())
}

fn validate_detail(record: &PatientRecord) -> RavResult<()> {
    let detail = &record.detail;

    let weights = detail
        .diagnosis_history
        .iter()
        .map(|d| d.weight)
        .chain(detail.risk_factors.iter().map(|f| f.weight));
    for weight in weights {
        if !weight.is_finite() || weight < 0.0 {
            return Err(invalid(
                record.id,
                format!("risk weights must be non-negative numbers, got {weight}"),
            ));
        }
    }

    if detail
        .missing_risk_codes
        .iter()
        .any(|m| m.hcc_code.trim().is_empty())
    {
        return Err(invalid(record.id, "missing risk code HCC cannot be blank".into()));
    }

    Ok(())
}

fn invalid(id: PatientId, reason: String) -> RavError {
    RavError::InvalidRecord { id, reason }
}
