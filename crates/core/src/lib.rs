//! # RAV Core
//!
//! Core logic for the Risk Adjustment Viewer.
//!
//! This crate contains pure data operations over a small, read-only set of synthetic patient
//! records:
//! - Loading and validating records from the embedded dataset or a YAML/JSON file
//! - Filtering and sorting the patient list
//! - Summary statistics and analytics
//! - Coding and HEDIS education content, session notes, and explicit view state
//!
//! **No presentation concerns**: HTML rendering and HTTP routing belong in `rav-dashboard`,
//! terminal output in `rav-cli`.

pub mod aggregate;
pub mod config;
pub mod constants;
pub mod education;
pub mod error;
pub mod notes;
pub mod patient;
pub mod query;
pub mod store;
pub mod validation;
pub mod view;

pub use config::CoreConfig;
pub use education::{EducationCatalog, Lookup};
pub use error::{RavError, RavResult};
pub use notes::{Note, NoteBook, NoteKind};
pub use patient::{PatientId, PatientRecord, RiskStatus};
pub use query::{filter_and_sort, SortKey, StatusFilter};
pub use store::{EmbeddedRecords, FileRecords, RecordSource, RecordStore};
pub use view::{DetailTab, Dialog, Screen, ViewEvent, ViewState};
