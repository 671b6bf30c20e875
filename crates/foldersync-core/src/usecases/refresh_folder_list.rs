//! Refresh folder list use case
//!
//! Brings the local folder mirror of one account up to date with the mail
//! server. Chooses between a full listing and a changes query based on the
//! stored cursor, falls back to a full listing once when the server cannot
//! compute changes, and commits the resulting diff together with the new
//! cursor.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::fetch_changes::{ChangeFetcher, ChangeOutcome, DEFAULT_MAX_CHANGE_PAGES};
use super::fetch_snapshot::SnapshotFetcher;
use crate::domain::{FolderDiff, ServerId, Session, SyncCursor, SyncError};
use crate::ports::{IFolderStorage, IMailProvider, SYNC_CURSOR_KEY};

// ============================================================================
// RefreshOutcome
// ============================================================================

/// How the folder list was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// No usable cursor was stored, or a full resync was requested
    Full,
    /// Changes since the stored cursor were applied
    Incremental,
    /// The server could not compute changes; a full listing replaced them
    FallbackFull,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Full => "full",
            SyncMode::Incremental => "incremental",
            SyncMode::FallbackFull => "fallback_full",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a completed refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub mode: SyncMode,
    /// Folders inserted into storage
    pub created: usize,
    /// Folders overwritten in storage
    pub updated: usize,
    /// Folders removed from storage
    pub deleted: usize,
    /// Change pages followed (zero for a full listing)
    pub pages_fetched: u32,
    /// Cursor committed with the diff
    pub cursor: SyncCursor,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

// ============================================================================
// RefreshFolderListUseCase
// ============================================================================

/// Use case reconciling the remote folder list into local storage
///
/// Holds no state between invocations. Concurrent refreshes of the same
/// account must be serialized by the caller.
pub struct RefreshFolderListUseCase {
    provider: Arc<dyn IMailProvider>,
    storage: Arc<dyn IFolderStorage>,
    snapshot_fetcher: SnapshotFetcher,
    change_fetcher: ChangeFetcher,
}

impl RefreshFolderListUseCase {
    /// Creates a new RefreshFolderListUseCase
    ///
    /// # Arguments
    ///
    /// * `provider` - Remote mail server
    /// * `storage` - Local folder mirror of the account the provider addresses
    pub fn new(provider: Arc<dyn IMailProvider>, storage: Arc<dyn IFolderStorage>) -> Self {
        Self {
            snapshot_fetcher: SnapshotFetcher::new(Arc::clone(&provider)),
            change_fetcher: ChangeFetcher::new(Arc::clone(&provider), DEFAULT_MAX_CHANGE_PAGES),
            provider,
            storage,
        }
    }

    /// Limits how many change pages one refresh follows
    pub fn with_max_change_pages(mut self, max_pages: u32) -> Self {
        self.change_fetcher = ChangeFetcher::new(Arc::clone(&self.provider), max_pages);
        self
    }

    /// Refreshes the folder list, incrementally when a cursor is stored
    ///
    /// # Errors
    ///
    /// - [`SyncError::Authentication`] and [`SyncError::PermanentProtocol`]
    ///   abort before any storage write
    /// - [`SyncError::Transport`] is returned as is; retrying is up to the
    ///   caller
    /// - [`SyncError::Storage`] leaves the previously stored cursor in place
    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<RefreshOutcome, SyncError> {
        let session = self.provider.resolve_session().await?;
        self.refresh(&session, false).await
    }

    /// Refreshes the folder list from a full listing, ignoring any stored cursor
    #[tracing::instrument(skip(self))]
    pub async fn execute_full(&self) -> Result<RefreshOutcome, SyncError> {
        let session = self.provider.resolve_session().await?;
        self.refresh(&session, true).await
    }

    /// Same as [`execute`](Self::execute) with a session the caller already
    /// resolved
    #[tracing::instrument(skip(self, session))]
    pub async fn execute_with_session(
        &self,
        session: &Session,
    ) -> Result<RefreshOutcome, SyncError> {
        self.refresh(session, false).await
    }

    /// Same as [`execute_full`](Self::execute_full) with a session the caller
    /// already resolved
    #[tracing::instrument(skip(self, session))]
    pub async fn execute_full_with_session(
        &self,
        session: &Session,
    ) -> Result<RefreshOutcome, SyncError> {
        self.refresh(session, true).await
    }

    async fn refresh(
        &self,
        session: &Session,
        force_full: bool,
    ) -> Result<RefreshOutcome, SyncError> {
        let start = Instant::now();

        // Step 1: Choose full or incremental
        let stored = if force_full {
            None
        } else {
            self.stored_cursor().await?
        };

        info!(
            account_id = %session.account_id(),
            since = stored.as_ref().map(SyncCursor::as_str),
            "Starting folder list refresh"
        );

        // Step 2: Fetch and diff against the local ids
        let (mode, diff, cursor, pages_fetched) = match stored {
            None => {
                let (diff, cursor) = self.full_diff(session).await?;
                (SyncMode::Full, diff, cursor, 0)
            }
            Some(since) => match self.change_fetcher.fetch_changes(session, &since).await? {
                ChangeOutcome::Changes(changes) => {
                    let local_ids = self.local_ids().await?;
                    let diff = FolderDiff::from_change_set(&changes, &local_ids);
                    (
                        SyncMode::Incremental,
                        diff,
                        changes.next_cursor().clone(),
                        changes.pages(),
                    )
                }
                ChangeOutcome::CannotComputeDelta => {
                    warn!(
                        since = %since,
                        "Server cannot calculate changes, performing full resync"
                    );
                    let (diff, cursor) = self.full_diff(session).await?;
                    (SyncMode::FallbackFull, diff, cursor, 0)
                }
            },
        };

        // Step 3: Apply the diff and persist the cursor together
        self.storage
            .commit(&diff, SYNC_CURSOR_KEY, &cursor)
            .await
            .map_err(SyncError::storage)?;

        let outcome = RefreshOutcome {
            mode,
            created: diff.to_create.len(),
            updated: diff.to_update.len(),
            deleted: diff.to_delete.len(),
            pages_fetched,
            cursor,
            duration_ms: start.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };

        info!(
            mode = %outcome.mode,
            created = outcome.created,
            updated = outcome.updated,
            deleted = outcome.deleted,
            pages = outcome.pages_fetched,
            cursor = %outcome.cursor,
            duration_ms = outcome.duration_ms,
            "Folder list refresh completed"
        );

        Ok(outcome)
    }

    async fn full_diff(&self, session: &Session) -> Result<(FolderDiff, SyncCursor), SyncError> {
        let snapshot = self.snapshot_fetcher.fetch_all(session).await?;
        let local_ids = self.local_ids().await?;
        Ok((
            FolderDiff::from_snapshot(snapshot.folders, &local_ids),
            snapshot.cursor,
        ))
    }

    async fn local_ids(&self) -> Result<BTreeSet<ServerId>, SyncError> {
        self.storage
            .get_folder_server_ids()
            .await
            .map_err(SyncError::storage)
    }

    /// Reads the stored cursor; an empty value counts as absent
    async fn stored_cursor(&self) -> Result<Option<SyncCursor>, SyncError> {
        let value = self
            .storage
            .get_extra_string(SYNC_CURSOR_KEY)
            .await
            .map_err(SyncError::storage)?;
        Ok(value.and_then(|v| SyncCursor::new(v).ok()))
    }
}
