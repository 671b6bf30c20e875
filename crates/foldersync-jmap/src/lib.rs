//! foldersync JMAP - JMAP mail provider adapter
//!
//! Provides an async client for:
//! - Session resource discovery (account, API endpoint, capabilities)
//! - JMAP request/response envelopes with back-references
//! - `Mailbox/get` and `Mailbox/changes` for folder list synchronization
//!
//! ## Modules
//!
//! - [`client`] - HTTP client with basic or bearer authentication
//! - [`session`] - Session resource parsing and account selection
//! - [`request`] - Request and response envelopes
//! - [`mailbox`] - Mailbox method calls and response parsing
//! - [`provider`] - [`IMailProvider`](foldersync_core::ports::IMailProvider) implementation

pub mod client;
pub mod mailbox;
pub mod provider;
pub mod request;
pub mod session;

use foldersync_core::domain::SyncError;
use thiserror::Error;

pub use client::{Credentials, JmapClient};
pub use provider::JmapMailProvider;

/// Method error type signalling that a state is too old or unknown
pub const CANNOT_CALCULATE_CHANGES: &str = "cannotCalculateChanges";

/// Method error types a server uses for temporary conditions
const TRANSIENT_METHOD_ERRORS: &[&str] = &["serverUnavailable", "serverFail"];

/// Errors that can occur when communicating with a JMAP server
#[derive(Debug, Error)]
pub enum JmapError {
    /// Credentials were rejected (401 or 403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// A network-level error occurred (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A method call returned an error response
    #[error("{method} failed with {error_type}{}", describe(.description))]
    Method {
        method: String,
        error_type: String,
        description: Option<String>,
    },

    /// The session does not advertise a required capability
    #[error("Missing capability: {0}")]
    MissingCapability(String),

    /// The requested account is not available in the session
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl JmapError {
    /// Returns true if the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            JmapError::Server(_) | JmapError::Network(_) => true,
            JmapError::Method { error_type, .. } => {
                TRANSIENT_METHOD_ERRORS.contains(&error_type.as_str())
            }
            _ => false,
        }
    }
}

impl From<JmapError> for SyncError {
    fn from(err: JmapError) -> Self {
        match err {
            JmapError::Unauthorized(msg) => SyncError::Authentication(msg),
            ref e if e.is_transient() => SyncError::Transport(e.to_string()),
            e => SyncError::PermanentProtocol(e.to_string()),
        }
    }
}
