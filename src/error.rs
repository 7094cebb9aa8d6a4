//! Unified error types for chatvault.
//!
//! This module provides a single [`ChatvaultError`] enum that covers all error
//! cases in the library, both on the export side (source database access) and
//! the viewer side (archive loading).
//!
//! # Error Handling Philosophy
//!
//! - **Library users** get typed errors they can match on
//! - **Application users** get clear, actionable error messages
//! - **Viewer lookups never error**: unknown ids resolve to placeholders or
//!   `None`, so only loading and exporting produce `ChatvaultError`

use std::io;

use thiserror::Error;

/// A specialized [`Result`] type for chatvault operations.
///
/// # Example
///
/// ```rust
/// use chatvault::error::Result;
/// use chatvault::archive::MessageDocument;
///
/// fn my_function() -> Result<Vec<MessageDocument>> {
///     // ... operations that may fail
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatvaultError>;

/// The error type for all chatvault operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatvaultError {
    /// An I/O error occurred.
    ///
    /// This typically happens when the source database path does not exist or
    /// the output directory is not writable.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The source database could not be opened or queried.
    ///
    /// Any database failure is fatal to the export run: no partial archive is
    /// ever produced.
    #[cfg(feature = "export")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON parsing/serialization error.
    ///
    /// Occurs when serializing archive documents or parsing a loaded archive.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Enriching a single message failed, aborting the whole export.
    ///
    /// Carries the id of the offending message so a malformed store can be
    /// inspected. There is no skip-and-continue mode.
    #[error("Failed to export message {message_id}: {reason}")]
    Export {
        /// Id of the message whose enrichment failed
        message_id: String,
        /// Description of the failure
        reason: String,
    },

    /// The archive documents do not match the expected structure.
    #[error("Invalid archive: {reason}")]
    InvalidArchive {
        /// Description of what's wrong
        reason: String,
    },

    /// An archive is already loaded into this store.
    ///
    /// A [`DocumentStore`](crate::viewer::DocumentStore) accepts exactly one
    /// load; the existing state is left untouched.
    #[error("An archive is already loaded")]
    AlreadyLoaded,

    /// A filter pattern failed to compile as a regular expression.
    #[error("Invalid filter pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern that was provided
        pattern: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatvaultError {
    /// Creates an export failure for a specific message.
    pub fn export(message_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatvaultError::Export {
            message_id: message_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid archive error.
    pub fn invalid_archive(reason: impl Into<String>) -> Self {
        ChatvaultError::InvalidArchive {
            reason: reason.into(),
        }
    }

    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        ChatvaultError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatvaultError::Io(_))
    }

    /// Returns `true` if this is a double-load rejection.
    pub fn is_already_loaded(&self) -> bool {
        matches!(self, ChatvaultError::AlreadyLoaded)
    }

    /// Returns `true` if this is an invalid archive error.
    pub fn is_invalid_archive(&self) -> bool {
        matches!(self, ChatvaultError::InvalidArchive { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = ChatvaultError::from(io_err);
        let display = err.to_string();
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_export_error_display() {
        let err = ChatvaultError::export("123456", "missing attachment row");
        let display = err.to_string();
        assert!(display.contains("123456"));
        assert!(display.contains("missing attachment row"));
    }

    #[test]
    fn test_invalid_archive_display() {
        let err = ChatvaultError::invalid_archive("record 4 has no channel");
        assert!(err.to_string().contains("record 4 has no channel"));
        assert!(err.is_invalid_archive());
    }

    #[test]
    fn test_already_loaded_display() {
        let err = ChatvaultError::AlreadyLoaded;
        assert!(err.to_string().contains("already loaded"));
        assert!(err.is_already_loaded());
        assert!(!err.is_io());
    }

    #[test]
    fn test_invalid_pattern_source() {
        use std::error::Error;
        let regex_err = regex::Regex::new("[unclosed").unwrap_err();
        let err = ChatvaultError::invalid_pattern("[unclosed", regex_err);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ChatvaultError = json_err.into();
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_error_debug() {
        let err = ChatvaultError::AlreadyLoaded;
        let debug = format!("{:?}", err);
        assert!(debug.contains("AlreadyLoaded"));
    }
}
