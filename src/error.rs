use crate::validate::Rejection;

use thiserror::Error;

/// Error type returned by external collaborators (storage, persistence).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("File too large: {size} bytes exceeds the {limit_mb}MB limit")]
    FileTooLarge { size: u64, limit_mb: u64 },

    #[error("Unsupported file format: {0} (accepted: .csv, .xlsx)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {message}")]
    FileRead { message: String },

    #[error("No valid debtors found in file ({} rows rejected)", .rejected.len())]
    NoValidRecords { rejected: Vec<Rejection> },

    #[error("Storage error: {0}")]
    Storage(#[source] BoxError),

    #[error("Persistence error: {0}")]
    Persistence(#[source] BoxError),

    #[error("An upload is already in progress for {0}")]
    UploadInProgress(String),

    #[error("Total debt value of {debtor_count} debtors exceeds the decimal range")]
    TotalOverflow { debtor_count: usize },

    #[error("Due date out of range for ingestion date {0}")]
    DueDateOutOfRange(chrono::NaiveDate),
}

impl From<std::io::Error> for IngestError {
    fn from(e: std::io::Error) -> Self {
        IngestError::FileRead {
            message: e.to_string(),
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::FileRead {
            message: e.to_string(),
        }
    }
}

impl From<calamine::XlsxError> for IngestError {
    fn from(e: calamine::XlsxError) -> Self {
        IngestError::FileRead {
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to load synonym table from {path}: {message}")]
    Synonyms { path: String, message: String },
}
