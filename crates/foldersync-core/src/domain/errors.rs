//! Domain error types
//!
//! Two families of errors live here:
//! - [`DomainError`] for validation failures of domain values
//! - [`SyncError`] for everything a folder refresh can report to its caller
//!
//! The "cannot compute delta" condition is deliberately absent from
//! [`SyncError`]: the reconciliation engine absorbs it internally.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid server-assigned folder identifier
    #[error("Invalid server ID: {0}")]
    InvalidServerId(String),

    /// Invalid sync cursor
    #[error("Invalid sync cursor: {0}")]
    InvalidCursor(String),

    /// Unknown folder type in stored data
    #[error("Unknown folder type: {0}")]
    UnknownFolderType(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// Classification of a [`SyncError`]
///
/// Callers use this to decide whether to re-authenticate, give up, or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials were rejected by the server
    Authentication,
    /// The server answered with something we cannot interpret
    PermanentProtocol,
    /// Connection, timeout or transient server failure
    Transport,
    /// The local storage adapter failed
    Storage,
}

impl ErrorKind {
    /// Stable lowercase name, used in logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication",
            ErrorKind::PermanentProtocol => "permanent_protocol",
            ErrorKind::Transport => "transport",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by a folder list refresh
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Credentials rejected; the caller must re-authenticate before retrying
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Malformed or unexpected server response; retrying will not help
    #[error("Permanent protocol error: {0}")]
    PermanentProtocol(String),

    /// Connection or timeout failure; the caller owns retry policy
    #[error("Transport error: {0}")]
    Transport(String),

    /// The storage adapter failed while reading or applying changes
    #[error("Storage error: {0}")]
    Storage(String),
}

impl SyncError {
    /// Returns the error kind of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Authentication(_) => ErrorKind::Authentication,
            SyncError::PermanentProtocol(_) => ErrorKind::PermanentProtocol,
            SyncError::Transport(_) => ErrorKind::Transport,
            SyncError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Returns true if a blind retry cannot succeed
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            SyncError::Authentication(_) | SyncError::PermanentProtocol(_)
        )
    }

    /// Wraps a storage adapter error, keeping its full context chain
    pub fn storage(err: anyhow::Error) -> Self {
        SyncError::Storage(format!("{err:#}"))
    }
}

impl From<DomainError> for SyncError {
    fn from(err: DomainError) -> Self {
        // Domain values only fail validation when the server sent bad data
        SyncError::PermanentProtocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidServerId(String::new());
        assert_eq!(err.to_string(), "Invalid server ID: ");

        let err = SyncError::Authentication("HTTP 401".to_string());
        assert_eq!(err.to_string(), "Authentication failed: HTTP 401");
    }

    #[test]
    fn test_kind_and_permanence() {
        let cases = [
            (SyncError::Authentication("a".into()), ErrorKind::Authentication, true),
            (SyncError::PermanentProtocol("p".into()), ErrorKind::PermanentProtocol, true),
            (SyncError::Transport("t".into()), ErrorKind::Transport, false),
            (SyncError::Storage("s".into()), ErrorKind::Storage, false),
        ];

        for (err, kind, permanent) in cases {
            assert_eq!(err.kind(), kind);
            assert_eq!(err.is_permanent(), permanent, "{err}");
        }
    }

    #[test]
    fn test_storage_keeps_context_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to insert folders");
        let sync_err = SyncError::storage(err);
        assert_eq!(
            sync_err,
            SyncError::Storage("Failed to insert folders: disk full".to_string())
        );
    }

    #[test]
    fn test_domain_error_is_protocol_error() {
        let err: SyncError = DomainError::InvalidCursor("empty".into()).into();
        assert_eq!(err.kind(), ErrorKind::PermanentProtocol);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::PermanentProtocol.to_string(), "permanent_protocol");
    }
}
