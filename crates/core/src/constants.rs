//! Constants used throughout the RAV core crate.

/// Synthetic patient dataset compiled into the binary.
pub const EMBEDDED_RECORDS_YAML: &str = include_str!("../data/patients.yaml");

/// Code and quality-measure education content compiled into the binary.
pub const EMBEDDED_EDUCATION_YAML: &str = include_str!("../data/education.yaml");

/// Author recorded on session notes when no author is configured.
pub const DEFAULT_NOTE_AUTHOR: &str = "Current User";

/// Maximum length of a single session note, in characters.
pub const MAX_NOTE_CHARS: usize = 4_000;

/// Oldest age accepted on a patient record.
pub const MAX_PATIENT_AGE: u32 = 130;

/// Risk scores above this value fall in the "Very High Risk" band.
pub const VERY_HIGH_RISK_THRESHOLD: f64 = 3.0;

/// Risk scores at or above this value (and not above the very-high threshold) fall in the
/// "High Risk" band.
pub const HIGH_RISK_THRESHOLD: f64 = 2.0;

/// Compliance rate, in percent, at which a quality measure is shown as on target.
pub const COMPLIANCE_TARGET_PERCENT: u32 = 70;

/// Number of rows shown in the "most common missing HCCs" table.
pub const TOP_MISSING_HCC_LIMIT: usize = 4;

/// Number of diagnosis codes shown inline on the patient list before collapsing to "+N".
pub const LIST_CODE_PREVIEW: usize = 3;
