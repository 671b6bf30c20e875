//! Snapshot fetcher
//!
//! Retrieves the complete current folder set together with the cursor it
//! corresponds to. Used when no cursor is stored, when a full resync is
//! forced, and as the fallback when the server cannot compute changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::{Folder, ServerId, Session, SyncCursor, SyncError};
use crate::ports::{IMailProvider, RemoteMailbox};

/// Complete folder listing at a given cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Every folder on the server, classified, ordered by server id
    pub folders: Vec<Folder>,
    /// Cursor the listing corresponds to
    pub cursor: SyncCursor,
}

/// Fetches full folder listings from the mail provider
pub struct SnapshotFetcher {
    provider: Arc<dyn IMailProvider>,
}

impl SnapshotFetcher {
    pub fn new(provider: Arc<dyn IMailProvider>) -> Self {
        Self { provider }
    }

    /// Fetches and classifies every folder of the session's account
    ///
    /// # Errors
    ///
    /// Propagates provider errors unchanged. A listing with an empty state
    /// or an empty mailbox id is a [`SyncError::PermanentProtocol`].
    pub async fn fetch_all(&self, session: &Session) -> Result<Snapshot, SyncError> {
        let listing = self.provider.get_all_mailboxes(session).await?;

        let cursor = SyncCursor::new(listing.state).map_err(|_| {
            SyncError::PermanentProtocol("Mailbox listing did not include a state".to_string())
        })?;

        // Last occurrence wins if the server repeats an id
        let mut folders = BTreeMap::new();
        for mailbox in listing.mailboxes {
            let folder = folder_from_remote(mailbox)?;
            folders.insert(folder.server_id().clone(), folder);
        }

        debug!(
            folders = folders.len(),
            cursor = %cursor,
            "Fetched full mailbox listing"
        );

        Ok(Snapshot {
            folders: folders.into_values().collect(),
            cursor,
        })
    }
}

/// Converts a port-level mailbox into a classified domain folder
pub(crate) fn folder_from_remote(mailbox: RemoteMailbox) -> Result<Folder, SyncError> {
    let server_id = ServerId::new(mailbox.id)?;
    Ok(Folder::from_role(
        server_id,
        mailbox.name,
        mailbox.role.as_deref(),
    ))
}
