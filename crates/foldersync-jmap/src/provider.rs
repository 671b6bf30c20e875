//! JmapMailProvider - IMailProvider implementation for JMAP servers
//!
//! Wraps the [`JmapClient`] and delegates to the session and mailbox
//! modules to fulfil the [`IMailProvider`] port contract.
//!
//! ## Design Notes
//!
//! - Each port call is one HTTP exchange; no retries happen here.
//! - [`JmapError`](crate::JmapError) is converted to [`SyncError`] at this
//!   boundary, so the engine only sees the port's error kinds.

use foldersync_core::domain::{Session, SyncCursor, SyncError};
use foldersync_core::ports::{ChangesReply, IMailProvider, MailboxListing};
use tracing::debug;

use crate::client::JmapClient;
use crate::mailbox;

/// Mail provider backed by a JMAP server
pub struct JmapMailProvider {
    client: JmapClient,
    /// Account to address; `None` selects the primary mail account
    account_id: Option<String>,
}

impl JmapMailProvider {
    pub fn new(client: JmapClient) -> Self {
        Self {
            client,
            account_id: None,
        }
    }

    /// Addresses a specific account instead of the primary one
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Returns the underlying client
    pub fn client(&self) -> &JmapClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl IMailProvider for JmapMailProvider {
    async fn resolve_session(&self) -> Result<Session, SyncError> {
        let resource = self.client.fetch_session().await?;
        let session = resource.resolve(self.account_id.as_deref())?;

        debug!(
            account_id = %session.account_id(),
            api_url = %session.api_url(),
            "Resolved JMAP session"
        );

        Ok(session)
    }

    async fn get_all_mailboxes(&self, session: &Session) -> Result<MailboxListing, SyncError> {
        Ok(mailbox::get_all_mailboxes(&self.client, session).await?)
    }

    async fn get_mailbox_changes(
        &self,
        session: &Session,
        since: &SyncCursor,
    ) -> Result<ChangesReply, SyncError> {
        Ok(mailbox::get_mailbox_changes(&self.client, session, since).await?)
    }
}
