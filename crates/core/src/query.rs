//! Patient list filtering and sorting.
//!
//! [`filter_and_sort`] is a pure function of its inputs: it never reorders or mutates the
//! record store, it returns references into it.

use feruca::Collator;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::patient::{PatientRecord, RiskStatus};

/// Key the patient list can be sorted by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Name, ascending.
    #[default]
    Name,
    /// Risk score, highest first.
    RiskScore,
    /// Age, oldest first.
    Age,
    /// Missing-code count, highest first.
    MissingCodes,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::Name,
        SortKey::RiskScore,
        SortKey::Age,
        SortKey::MissingCodes,
    ];

    /// Parse a sort key as it appears in a query string or CLI flag.
    ///
    /// Unrecognised keys return `None`, which callers treat as "keep input order".
    pub fn from_param(value: &str) -> Option<SortKey> {
        match value.trim() {
            "name" => Some(SortKey::Name),
            "riskScore" | "risk-score" | "risk_score" => Some(SortKey::RiskScore),
            "age" => Some(SortKey::Age),
            "missingCodes" | "missing-codes" | "missing_codes" => Some(SortKey::MissingCodes),
            _ => None,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::RiskScore => "riskScore",
            SortKey::Age => "age",
            SortKey::MissingCodes => "missingCodes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::RiskScore => "Risk Score",
            SortKey::Age => "Age",
            SortKey::MissingCodes => "Missing Codes",
        }
    }

    fn compare(self, collator: &mut Collator, a: &PatientRecord, b: &PatientRecord) -> Ordering {
        match self {
            SortKey::Name => collator.collate(a.name.as_str(), b.name.as_str()),
            SortKey::RiskScore => b.risk_score.total_cmp(&a.risk_score),
            SortKey::Age => b.age.cmp(&a.age),
            SortKey::MissingCodes => b.missing_codes.cmp(&a.missing_codes),
        }
    }
}

/// Risk-status filter for the patient list.
///
/// `Contains` matches case-insensitively anywhere in the status label, so `"high"` selects
/// both "High Risk" and "Very High Risk".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFilter {
    #[default]
    All,
    Contains(String),
}

impl StatusFilter {
    /// Filter choices offered by the list screen, as `(param, label)` pairs.
    pub const OPTIONS: [(&'static str, &'static str); 4] = [
        ("all", "All Patients"),
        ("very high", "Very High Risk"),
        ("high", "High Risk"),
        ("moderate", "Moderate Risk"),
    ];

    /// Parse a filter parameter. Blank input and `all` (any case) mean no filtering.
    pub fn from_param(value: &str) -> StatusFilter {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            StatusFilter::All
        } else {
            StatusFilter::Contains(trimmed.to_lowercase())
        }
    }

    pub fn as_param(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Contains(needle) => needle,
        }
    }

    pub fn matches(&self, status: RiskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Contains(needle) => status
                .as_str()
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

impl From<String> for StatusFilter {
    fn from(value: String) -> Self {
        StatusFilter::from_param(&value)
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.as_param().to_string()
    }
}

/// Whether `record` matches the free-text search term.
///
/// An empty term matches every record; otherwise the term, whitespace included, must appear
/// case-insensitively in the patient name or the insurance identifier.
pub fn matches_search(record: &PatientRecord, search_term: &str) -> bool {
    if search_term.is_empty() {
        return true;
    }
    let term = search_term.to_lowercase();
    record.name.as_str().to_lowercase().contains(&term)
        || record.insurance_id.as_str().to_lowercase().contains(&term)
}

/// Filter `records` by search term and status, then sort by `sort_key`.
///
/// The sort is stable; records that compare equal keep their input order. Names are ordered by
/// the Unicode Collation Algorithm over the CLDR root table, so accents and case are secondary
/// to the base letters. A `None` sort key keeps the input order for every record.
pub fn filter_and_sort<'a>(
    records: &'a [PatientRecord],
    search_term: &str,
    status_filter: &StatusFilter,
    sort_key: Option<SortKey>,
) -> Vec<&'a PatientRecord> {
    let mut visible: Vec<&PatientRecord> = records
        .iter()
        .filter(|r| matches_search(r, search_term) && status_filter.matches(r.status))
        .collect();

    if let Some(key) = sort_key {
        let mut collator = Collator::default();
        visible.sort_by(|a, b| key.compare(&mut collator, a, b));
    }

    tracing::debug!(
        "query matched {} of {} records (search={:?}, filter={}, sort={:?})",
        visible.len(),
        records.len(),
        search_term,
        status_filter.as_param(),
        sort_key
    );

    visible
}
