//! Error types for the ticket-filing pipeline
//!
//! Per-record errors ([`NormalizeError`]) never stop a run. Source and store
//! errors are wrapped in [`PipelineError`] and always abort it.

use phonedesk_common::PhonedeskError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Row source failures. Always fatal for the run.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Page request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed row at offset {offset}: {reason}")]
    MalformedRow { offset: i64, reason: String },

    #[error("Invalid source configuration: {0}")]
    InvalidConfig(String),
}

/// Failure to turn one raw record into a service-desk request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Required column '{0}' is missing")]
    MissingField(&'static str),

    #[error("Value '{value}' of column '{field}' has no mapping")]
    UnmappedCategory { field: &'static str, value: String },
}

/// Fingerprint store failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to persist fingerprint store '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: PhonedeskError,
    },

    #[error("Failed to read fingerprint store '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: PhonedeskError,
    },

    #[error(
        "Fingerprint store '{}' has schema version {found}, expected {expected}. \
         Fingerprints from another schema cannot be compared; migrate or move the file aside.",
        path.display()
    )]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

/// Fatal run errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Row source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("Fingerprint store could not be loaded: {0}")]
    StoreLoad(#[source] StoreError),

    #[error("Fingerprint store could not be persisted: {0}")]
    StorePersistFailure(#[source] StoreError),
}
