//! Mail provider port (driven/secondary port)
//!
//! This module defines the interface to the remote mail server: session
//! discovery, the full mailbox listing and the incremental changes query.
//! The primary implementation speaks JMAP, but nothing here depends on it.
//!
//! ## Design Notes
//!
//! - Returns [`SyncError`] rather than `anyhow::Result`: the engine has to
//!   tell authentication, permanent protocol and transport failures apart.
//! - "Cannot compute changes from this cursor" is a normal reply
//!   ([`ChangesReply::CannotCalculateChanges`]), not an error.
//! - [`RemoteMailbox`] and [`ChangesPage`] are port-level DTOs; use cases
//!   classify them into domain [`Folder`](crate::domain::Folder)s.

use serde::{Deserialize, Serialize};

use crate::domain::{Session, SyncCursor, SyncError};

/// A mailbox as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMailbox {
    /// Server-assigned mailbox identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Semantic role (e.g. "inbox", "trash"), if any
    pub role: Option<String>,
}

/// Reply to a full mailbox listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxListing {
    /// Every mailbox in the account
    pub mailboxes: Vec<RemoteMailbox>,
    /// State string the listing corresponds to
    pub state: String,
}

/// One page of mailbox changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangesPage {
    /// Mailboxes created since `old_state`
    pub created: Vec<RemoteMailbox>,
    /// Mailboxes changed since `old_state`
    pub updated: Vec<RemoteMailbox>,
    /// Ids of mailboxes removed since `old_state`
    pub destroyed: Vec<String>,
    /// State the page starts from
    pub old_state: String,
    /// State to request the next page from
    pub new_state: String,
    /// Whether more changes remain past `new_state`
    pub has_more_changes: bool,
}

/// Reply to a changes query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangesReply {
    /// A page of changes
    Page(ChangesPage),
    /// The server cannot compute changes from the given state
    /// (unknown or expired); a full listing is required
    CannotCalculateChanges,
}

/// Port trait for the remote mail server
///
/// Implementations perform exactly one protocol round trip per call and
/// never retry on their own; retry policy belongs to the caller.
#[async_trait::async_trait]
pub trait IMailProvider: Send + Sync {
    /// Discovers the account and API endpoint for this refresh
    ///
    /// # Errors
    /// - [`SyncError::Authentication`] if the credentials are rejected
    /// - [`SyncError::PermanentProtocol`] if the session document is malformed
    /// - [`SyncError::Transport`] on connection failures
    async fn resolve_session(&self) -> Result<Session, SyncError>;

    /// Lists every mailbox in the account together with the current state
    async fn get_all_mailboxes(&self, session: &Session) -> Result<MailboxListing, SyncError>;

    /// Requests one page of mailbox changes since `since`
    async fn get_mailbox_changes(
        &self,
        session: &Session,
        since: &SyncCursor,
    ) -> Result<ChangesReply, SyncError>;
}
