//! Error types for the syncoll library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SyncollError`] enum. Errors are grouped the same way the serving path
//! reports them: malformed client input, unknown corpora, storage failures
//! and timeouts.
//!
//! # Examples
//!
//! ```
//! use syncoll::error::{Result, SyncollError};
//!
//! fn check_word(w: &str) -> Result<()> {
//!     if w.is_empty() {
//!         return Err(SyncollError::invalid_argument("invalid word value"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_word("").unwrap_err().is_client_error());
//! ```

use std::io;

use rusqlite::ErrorCode;
use thiserror::Error;

/// The main error type for syncoll operations.
#[derive(Error, Debug)]
pub enum SyncollError {
    /// I/O errors (vertical files, config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors reported by the SQLite driver
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Storage-level failures not originating in the driver (pool, schema checks)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client input (empty word, bad numeric argument)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested corpus is not configured
    #[error("Corpus not found: {0}")]
    CorpusNotFound(String),

    /// Malformed input data (vertical file rows)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Thread join errors
    #[error("Thread join error: {0}")]
    ThreadJoinError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SyncollError.
pub type Result<T> = std::result::Result<T, SyncollError>;

impl SyncollError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SyncollError::Storage(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SyncollError::Config(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SyncollError::InvalidArgument(msg.into())
    }

    /// Create a new corpus-not-found error.
    pub fn corpus_not_found<S: Into<String>>(corpus_id: S) -> Self {
        SyncollError::CorpusNotFound(corpus_id.into())
    }

    /// Create a new malformed input error.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        SyncollError::MalformedInput(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        SyncollError::Timeout(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SyncollError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        SyncollError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether the error was caused by the caller's input rather than by
    /// the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SyncollError::InvalidArgument(_) | SyncollError::CorpusNotFound(_)
        )
    }

    /// Whether the error is an expired deadline, including a statement the
    /// driver interrupted on our behalf.
    pub fn is_timeout(&self) -> bool {
        match self {
            SyncollError::Timeout(_) => true,
            SyncollError::Database(err) => is_interrupted(err),
            _ => false,
        }
    }
}

impl SyncollError {
    /// Convert a driver error, turning an interrupted statement into a
    /// [`SyncollError::Timeout`].
    pub(crate) fn from_db(err: rusqlite::Error) -> Self {
        if is_interrupted(&err) {
            SyncollError::Timeout(format!("database operation interrupted: {err}"))
        } else {
            SyncollError::Database(err)
        }
    }
}

/// SQLite reports an operation aborted by the progress handler as
/// `SQLITE_INTERRUPT`.
pub(crate) fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::OperationInterrupted)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SyncollError::storage("pool exhausted");
        assert_eq!(error.to_string(), "Storage error: pool exhausted");

        let error = SyncollError::config("missing `corpora.lemmaAttr`");
        assert_eq!(
            error.to_string(),
            "Configuration error: missing `corpora.lemmaAttr`"
        );

        let error = SyncollError::corpus_not_found("syn2020");
        assert_eq!(error.to_string(), "Corpus not found: syn2020");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let syncoll_error = SyncollError::from(io_error);

        match syncoll_error {
            SyncollError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_client_error_classification() {
        assert!(SyncollError::invalid_argument("empty word").is_client_error());
        assert!(SyncollError::corpus_not_found("x").is_client_error());
        assert!(!SyncollError::storage("broken").is_client_error());
        assert!(!SyncollError::timeout("deadline").is_client_error());
        assert!(SyncollError::timeout("deadline").is_timeout());
    }
}
