use crate::patient::PatientId;

#[derive(Debug, thiserror::Error)]
pub enum RavError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: PatientId, reason: String },
    #[error("duplicate patient id: {0}")]
    DuplicatePatientId(PatientId),
    #[error("patient not found: {0}")]
    PatientNotFound(PatientId),
    #[error(
        "failed to read records file (path: {path}): {source}",
        path = path.display()
    )]
    FileRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported records file format: {0}")]
    UnsupportedFormat(String),
    #[error("{document} schema mismatch at {path}: {message}")]
    Schema {
        document: &'static str,
        path: String,
        message: String,
    },
    #[error("note book lock poisoned")]
    LockPoisoned,
}

pub type RavResult<T> = std::result::Result<T, RavError>;

impl From<rav_types::TextError> for RavError {
    fn from(err: rav_types::TextError) -> Self {
        RavError::InvalidInput(err.to_string())
    }
}
