use thiserror::Error;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
}

#[derive(Debug, Error)]
#[error("The user has not logged in")]
pub struct NotLoggedInError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("client storage is not available: {0}")]
    Unavailable(String),
    #[error("failed to read '{key}' from client storage")]
    Read {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to write '{key}' to client storage")]
    Write {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Reasons a stored session could not be brought back. None of these reach
/// the caller of a restore, they are only logged.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("stored value for '{key}' is malformed")]
    Malformed {
        key: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
