//! Error types shared across phonedesk crates

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, PhonedeskError>;

/// Error type for the shared utilities
#[derive(Error, Debug)]
pub enum PhonedeskError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("State file '{}' has no parent directory", path.display())]
    NoParentDirectory { path: PathBuf },

    #[error("Failed to {action} for '{}': {source}", path.display())]
    StateFile {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PhonedeskError {
    pub(crate) fn state_file(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::StateFile {
            action,
            path: path.into(),
            source,
        }
    }
}
