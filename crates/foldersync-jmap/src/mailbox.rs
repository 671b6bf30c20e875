//! JMAP Mailbox methods for folder list synchronization
//!
//! ## Method Calls
//!
//! 1. **Full listing**: one `Mailbox/get` with `ids: null` returns every
//!    mailbox and the current state. `/get` is not paginated.
//! 2. **Changes**: one request batches `Mailbox/changes` with two
//!    `Mailbox/get` calls that back-reference its `/created` and `/updated`
//!    ids, so names and roles arrive in the same round trip.
//! 3. **Next page**: while `hasMoreChanges` is true the caller repeats step 2
//!    from `newState`.

use foldersync_core::domain::{Session, SyncCursor};
use foldersync_core::ports::{ChangesPage, ChangesReply, MailboxListing, RemoteMailbox};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::client::JmapClient;
use crate::request::{result_reference, JmapRequest, JmapResponse};
use crate::{JmapError, CANNOT_CALCULATE_CHANGES};

const MAILBOX_GET: &str = "Mailbox/get";
const MAILBOX_CHANGES: &str = "Mailbox/changes";

/// Properties requested for every mailbox
const MAILBOX_PROPERTIES: &[&str] = &["id", "name", "role"];

const LISTING_CALL: &str = "0";
const CHANGES_CALL: &str = "0";
const CREATED_CALL: &str = "1";
const UPDATED_CALL: &str = "2";

// ============================================================================
// JMAP response types (JSON deserialization)
// ============================================================================

/// Arguments of a `Mailbox/get` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxGetResponse {
    /// State of the mailbox collection
    state: String,
    list: Vec<JmapMailbox>,
    /// Requested ids that do not exist (any more)
    #[serde(default)]
    not_found: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct JmapMailbox {
    id: String,
    #[serde(default)]
    name: String,
    role: Option<String>,
}

/// Arguments of a `Mailbox/changes` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MailboxChangesResponse {
    old_state: String,
    new_state: String,
    has_more_changes: bool,
    #[serde(default)]
    created: Vec<String>,
    #[serde(default)]
    updated: Vec<String>,
    #[serde(default)]
    destroyed: Vec<String>,
}

impl From<JmapMailbox> for RemoteMailbox {
    fn from(mailbox: JmapMailbox) -> Self {
        RemoteMailbox {
            id: mailbox.id,
            name: mailbox.name,
            role: mailbox.role,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Builds the full listing request
pub fn get_all_request(session: &Session) -> JmapRequest {
    JmapRequest::new().call(
        MAILBOX_GET,
        json!({
            "accountId": session.account_id().as_str(),
            "ids": Value::Null,
            "properties": MAILBOX_PROPERTIES,
        }),
        LISTING_CALL,
    )
}

/// Builds the changes request with its two back-referenced gets
pub fn changes_request(session: &Session, since: &SyncCursor) -> JmapRequest {
    let account_id = session.account_id().as_str();

    JmapRequest::new()
        .call(
            MAILBOX_CHANGES,
            json!({
                "accountId": account_id,
                "sinceState": since.as_str(),
            }),
            CHANGES_CALL,
        )
        .call(
            MAILBOX_GET,
            json!({
                "accountId": account_id,
                "#ids": result_reference(CHANGES_CALL, MAILBOX_CHANGES, "/created"),
                "properties": MAILBOX_PROPERTIES,
            }),
            CREATED_CALL,
        )
        .call(
            MAILBOX_GET,
            json!({
                "accountId": account_id,
                "#ids": result_reference(CHANGES_CALL, MAILBOX_CHANGES, "/updated"),
                "properties": MAILBOX_PROPERTIES,
            }),
            UPDATED_CALL,
        )
}

// ============================================================================
// MailboxParser - converts JMAP responses to port-level types
// ============================================================================

/// Parser for converting JMAP mailbox responses into port-level types
pub struct MailboxParser;

impl MailboxParser {
    /// Parses the response to [`get_all_request`]
    pub fn parse_listing(response: &JmapResponse) -> Result<MailboxListing, JmapError> {
        let get: MailboxGetResponse = response.parse(LISTING_CALL, MAILBOX_GET)?;

        Ok(MailboxListing {
            mailboxes: get.list.into_iter().map(RemoteMailbox::from).collect(),
            state: get.state,
        })
    }

    /// Parses the response to [`changes_request`]
    ///
    /// A `cannotCalculateChanges` error on the changes call becomes
    /// [`ChangesReply::CannotCalculateChanges`]; the back-referenced gets
    /// fail along with it and are not inspected. Ids a get reports as
    /// `notFound` were removed between the two calls and are reported as
    /// destroyed.
    pub fn parse_changes(response: &JmapResponse) -> Result<ChangesReply, JmapError> {
        if response.error_type(CHANGES_CALL).as_deref() == Some(CANNOT_CALCULATE_CHANGES) {
            return Ok(ChangesReply::CannotCalculateChanges);
        }

        let changes: MailboxChangesResponse = response.parse(CHANGES_CALL, MAILBOX_CHANGES)?;

        let mut destroyed = changes.destroyed;
        let created = Self::fetched(response, CREATED_CALL, &changes.created, &mut destroyed)?;
        let updated = Self::fetched(response, UPDATED_CALL, &changes.updated, &mut destroyed)?;

        Ok(ChangesReply::Page(ChangesPage {
            created,
            updated,
            destroyed,
            old_state: changes.old_state,
            new_state: changes.new_state,
            has_more_changes: changes.has_more_changes,
        }))
    }

    /// Reads a back-referenced get, skipping it when no ids were referenced
    ///
    /// Every referenced id must come back either in `list` or in `notFound`.
    fn fetched(
        response: &JmapResponse,
        call_id: &str,
        ids: &[String],
        destroyed: &mut Vec<String>,
    ) -> Result<Vec<RemoteMailbox>, JmapError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let get: MailboxGetResponse = response.parse(call_id, MAILBOX_GET)?;
        if let Some(missing) = ids.iter().find(|id| {
            !get.list.iter().any(|m| &m.id == *id) && !get.not_found.contains(*id)
        }) {
            return Err(JmapError::InvalidResponse(format!(
                "{MAILBOX_GET} call {call_id} neither listed nor reported mailbox {missing}"
            )));
        }

        for id in get.not_found {
            if !destroyed.contains(&id) {
                destroyed.push(id);
            }
        }

        Ok(get.list.into_iter().map(RemoteMailbox::from).collect())
    }
}

// ============================================================================
// Mailbox query functions
// ============================================================================

/// Fetches every mailbox of the session's account
pub async fn get_all_mailboxes(
    client: &JmapClient,
    session: &Session,
) -> Result<MailboxListing, JmapError> {
    let response = client
        .call(session.api_url(), &get_all_request(session))
        .await?;
    let listing = MailboxParser::parse_listing(&response)?;

    debug!(
        mailboxes = listing.mailboxes.len(),
        state = %listing.state,
        "Received mailbox listing"
    );

    Ok(listing)
}

/// Fetches one page of mailbox changes since `since`
pub async fn get_mailbox_changes(
    client: &JmapClient,
    session: &Session,
    since: &SyncCursor,
) -> Result<ChangesReply, JmapError> {
    let response = client
        .call(session.api_url(), &changes_request(session, since))
        .await?;
    let reply = MailboxParser::parse_changes(&response)?;

    match &reply {
        ChangesReply::Page(page) => debug!(
            since = %since,
            new_state = %page.new_state,
            created = page.created.len(),
            updated = page.updated.len(),
            destroyed = page.destroyed.len(),
            has_more = page.has_more_changes,
            "Received mailbox changes"
        ),
        ChangesReply::CannotCalculateChanges => {
            debug!(since = %since, "Server cannot calculate mailbox changes")
        }
    }

    Ok(reply)
}
