use thiserror::Error;

/// Why a single raw record was dropped. Never fatal to the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid time window '{0}'")]
    InvalidWindow(String),

    #[error("invalid UTC offset '{0}', expected +HH:MM or -HH:MM")]
    InvalidOffset(String),

    #[error("invalid series order '{0}', expected 'arrival' or 'chronological'")]
    InvalidOrder(String),
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read batch: {0}")]
    Io(#[from] std::io::Error),

    #[error("batch body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("batch body must be a JSON array of records")]
    NotAnArray,

    #[error("invalid filter command: {0}")]
    InvalidCommand(String),
}
