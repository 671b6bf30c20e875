//! Change fetcher
//!
//! Follows the changes query from a stored cursor until the server reports
//! no further changes, folding every page into a single [`ChangeSet`].

use std::sync::Arc;

use tracing::debug;

use super::fetch_snapshot::folder_from_remote;
use crate::domain::{ChangeSet, FolderChangePage, ServerId, Session, SyncCursor, SyncError};
use crate::ports::{ChangesPage, ChangesReply, IMailProvider};

/// Default upper bound on pages followed in one refresh
pub const DEFAULT_MAX_CHANGE_PAGES: u32 = 64;

/// Result of following the changes query
#[derive(Debug)]
pub(crate) enum ChangeOutcome {
    /// All pages were received
    Changes(ChangeSet),
    /// The server cannot compute changes from the stored cursor
    CannotComputeDelta,
}

pub(crate) struct ChangeFetcher {
    provider: Arc<dyn IMailProvider>,
    max_pages: u32,
}

impl ChangeFetcher {
    pub(crate) fn new(provider: Arc<dyn IMailProvider>, max_pages: u32) -> Self {
        Self {
            provider,
            max_pages: max_pages.max(1),
        }
    }

    /// Requests pages strictly in order, each from the previous page's cursor
    ///
    /// A `cannotCalculateChanges` reply on any page discards what was
    /// accumulated so far. A page whose old state is not the cursor it was
    /// requested from is a protocol error.
    pub(crate) async fn fetch_changes(
        &self,
        session: &Session,
        since: &SyncCursor,
    ) -> Result<ChangeOutcome, SyncError> {
        let mut changes = ChangeSet::new(since.clone());
        let mut cursor = since.clone();

        loop {
            if changes.pages() >= self.max_pages {
                return Err(SyncError::PermanentProtocol(format!(
                    "Mailbox changes did not settle within {} pages",
                    self.max_pages
                )));
            }

            let page = match self.provider.get_mailbox_changes(session, &cursor).await? {
                ChangesReply::Page(page) => page,
                ChangesReply::CannotCalculateChanges => {
                    debug!(since = %cursor, "Server cannot calculate changes");
                    return Ok(ChangeOutcome::CannotComputeDelta);
                }
            };

            if page.old_state != cursor.as_str() {
                return Err(SyncError::PermanentProtocol(format!(
                    "Mailbox changes answered from state {} instead of {cursor}",
                    page.old_state
                )));
            }

            let page = into_folder_page(page)?;
            if page.has_more && page.new_cursor == cursor {
                return Err(SyncError::PermanentProtocol(format!(
                    "Mailbox changes announced more changes without advancing past {cursor}"
                )));
            }

            debug!(
                since = %cursor,
                new_state = %page.new_cursor,
                created = page.created.len(),
                updated = page.updated.len(),
                destroyed = page.destroyed.len(),
                has_more = page.has_more,
                "Received mailbox changes page"
            );

            cursor = page.new_cursor.clone();
            changes.merge_page(page);

            if !changes.has_more() {
                return Ok(ChangeOutcome::Changes(changes));
            }
        }
    }
}

fn into_folder_page(page: ChangesPage) -> Result<FolderChangePage, SyncError> {
    let new_cursor = SyncCursor::new(page.new_state).map_err(|_| {
        SyncError::PermanentProtocol("Mailbox changes did not include a new state".to_string())
    })?;

    Ok(FolderChangePage {
        created: page
            .created
            .into_iter()
            .map(folder_from_remote)
            .collect::<Result<_, _>>()?,
        updated: page
            .updated
            .into_iter()
            .map(folder_from_remote)
            .collect::<Result<_, _>>()?,
        destroyed: page
            .destroyed
            .into_iter()
            .map(ServerId::new)
            .collect::<Result<_, _>>()?,
        new_cursor,
        has_more: page.has_more_changes,
    })
}
