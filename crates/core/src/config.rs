//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::DEFAULT_NOTE_AUTHOR;
use crate::store::{EmbeddedRecords, FileRecords, RecordSource};
use crate::{RavError, RavResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    records_file: Option<PathBuf>,
    note_author: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `RavError::InvalidInput` if `note_author` is blank.
    pub fn new(records_file: Option<PathBuf>, note_author: String) -> RavResult<Self> {
        let note_author = note_author.trim().to_string();
        if note_author.is_empty() {
            return Err(RavError::InvalidInput("note_author cannot be empty".into()));
        }

        Ok(Self {
            records_file,
            note_author,
        })
    }

    pub fn records_file(&self) -> Option<&Path> {
        self.records_file.as_deref()
    }

    pub fn note_author(&self) -> &str {
        &self.note_author
    }

    /// The record source this configuration selects: the named file, or the embedded dataset.
    pub fn record_source(&self) -> Box<dyn RecordSource + Send + Sync> {
        match &self.records_file {
            Some(path) => Box::new(FileRecords::new(path.clone())),
            None => Box::new(EmbeddedRecords),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            records_file: None,
            note_author: DEFAULT_NOTE_AUTHOR.to_string(),
        }
    }
}

/// Parse an optional records-file setting. Blank values mean "use the embedded dataset".
pub fn records_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parse an optional note-author setting, falling back to the default author.
pub fn note_author_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTE_AUTHOR.to_string())
}
