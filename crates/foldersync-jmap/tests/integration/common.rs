//! Shared test helpers for JMAP integration tests
//!
//! Provides a wiremock-based JMAP server with the session resource at
//! `/.well-known/jmap` and the API endpoint at `/jmap/api/`. Mock bodies
//! describe one account, `test@example.com`, authenticated as `test:test`.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use foldersync_cache::{DatabasePool, SqliteFolderStorage};
use foldersync_core::domain::{AccountId, Folder, FolderType, ServerId};
use foldersync_core::ports::{IFolderStorage, SYNC_CURSOR_KEY};
use foldersync_core::usecases::RefreshFolderListUseCase;
use foldersync_jmap::{Credentials, JmapClient, JmapMailProvider};

pub const ACCOUNT_ID: &str = "test@example.com";
pub const SESSION_PATH: &str = "/.well-known/jmap";
pub const API_PATH: &str = "/jmap/api/";
/// base64("test:test")
pub const BASIC_AUTH: &str = "Basic dGVzdDp0ZXN0";

// ============================================================================
// Request matchers
// ============================================================================

/// Matches API requests whose first method call has the given name
pub struct FirstMethod(pub &'static str);

impl Match for FirstMethod {
    fn matches(&self, request: &Request) -> bool {
        first_call(request)
            .and_then(|call| call.get(0).and_then(Value::as_str).map(|n| n == self.0))
            .unwrap_or(false)
    }
}

/// Matches `Mailbox/changes` requests asking for changes since a state
pub struct SinceState(pub &'static str);

impl Match for SinceState {
    fn matches(&self, request: &Request) -> bool {
        first_call(request)
            .and_then(|call| {
                call.get(1)
                    .and_then(|args| args.get("sinceState"))
                    .and_then(Value::as_str)
                    .map(|s| s == self.0)
            })
            .unwrap_or(false)
    }
}

fn first_call(request: &Request) -> Option<Value> {
    let body: Value = serde_json::from_slice(&request.body).ok()?;
    body.get("methodCalls")?.get(0).cloned()
}

// ============================================================================
// Server setup
// ============================================================================

/// Session resource advertising mail for `test@example.com`
pub fn session_body(server: &MockServer) -> Value {
    json!({
        "capabilities": {
            "urn:ietf:params:jmap:core": {
                "maxSizeUpload": 50000000,
                "maxCallsInRequest": 32
            },
            "urn:ietf:params:jmap:mail": {}
        },
        "accounts": {
            ACCOUNT_ID: {
                "name": ACCOUNT_ID,
                "isPersonal": true,
                "isReadOnly": false,
                "accountCapabilities": { "urn:ietf:params:jmap:mail": {} }
            }
        },
        "primaryAccounts": { "urn:ietf:params:jmap:mail": ACCOUNT_ID },
        "username": "test",
        "apiUrl": format!("{}{}", server.uri(), API_PATH),
        "downloadUrl": format!("{}/jmap/download/{{accountId}}/{{blobId}}/{{name}}", server.uri()),
        "uploadUrl": format!("{}/jmap/upload/{{accountId}}/", server.uri()),
        "state": "0"
    })
}

/// Starts a mock server with the session resource mounted
pub async fn setup_jmap_mock() -> MockServer {
    let server = MockServer::start().await;
    mount_session(&server, ResponseTemplate::new(200).set_body_json(session_body(&server))).await;
    server
}

/// Mounts the session resource with an arbitrary response
pub async fn mount_session(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(SESSION_PATH))
        .and(header("Authorization", BASIC_AUTH))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mounts the full `Mailbox/get` listing, expected exactly `times` times
pub async fn mount_mailbox_get(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("Authorization", BASIC_AUTH))
        .and(FirstMethod("Mailbox/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mailbox_get_response()))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts a `Mailbox/changes` response for requests since `since_state`
pub async fn mount_mailbox_changes(server: &MockServer, since_state: &'static str, body: Value) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("Authorization", BASIC_AUTH))
        .and(FirstMethod("Mailbox/changes"))
        .and(SinceState(since_state))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Response bodies
// ============================================================================

/// Six mailboxes at state "23"
pub fn mailbox_get_response() -> Value {
    json!({
        "methodResponses": [
            ["Mailbox/get", {
                "accountId": ACCOUNT_ID,
                "state": "23",
                "list": [
                    { "id": "id_inbox", "name": "Inbox", "role": "inbox" },
                    { "id": "id_archive", "name": "Archive", "role": "archive" },
                    { "id": "id_drafts", "name": "Drafts", "role": "drafts" },
                    { "id": "id_sent", "name": "Sent", "role": "sent" },
                    { "id": "id_trash", "name": "Trash", "role": "trash" },
                    { "id": "id_folder1", "name": "folder1", "role": null }
                ],
                "notFound": []
            }, "0"]
        ],
        "sessionState": "0"
    })
}

/// A changes page with its two back-referenced gets
pub fn changes_response(
    old_state: &str,
    new_state: &str,
    has_more_changes: bool,
    created: Value,
    updated: Value,
    destroyed: &[&str],
) -> Value {
    let ids = |list: &Value| -> Vec<Value> {
        list.as_array()
            .map(|items| items.iter().filter_map(|m| m.get("id").cloned()).collect())
            .unwrap_or_default()
    };

    json!({
        "methodResponses": [
            ["Mailbox/changes", {
                "accountId": ACCOUNT_ID,
                "oldState": old_state,
                "newState": new_state,
                "hasMoreChanges": has_more_changes,
                "created": ids(&created),
                "updated": ids(&updated),
                "destroyed": destroyed,
                "updatedProperties": null
            }, "0"],
            ["Mailbox/get", {
                "accountId": ACCOUNT_ID,
                "state": new_state,
                "list": created,
                "notFound": []
            }, "1"],
            ["Mailbox/get", {
                "accountId": ACCOUNT_ID,
                "state": new_state,
                "list": updated,
                "notFound": []
            }, "2"]
        ],
        "sessionState": "0"
    })
}

/// Every change between "23" and "42" in one page
pub fn mailbox_changes_response() -> Value {
    changes_response(
        "23",
        "42",
        false,
        json!([{ "id": "id_folder2", "name": "folder2", "role": null }]),
        json!([{ "id": "id_trash", "name": "Deleted messages", "role": "trash" }]),
        &["id_folder1"],
    )
}

/// The server no longer knows the requested state
pub fn cannot_calculate_changes_response() -> Value {
    json!({
        "methodResponses": [
            ["error", { "type": "cannotCalculateChanges" }, "0"],
            ["error", { "type": "invalidResultReference" }, "1"],
            ["error", { "type": "invalidResultReference" }, "2"]
        ],
        "sessionState": "0"
    })
}

// ============================================================================
// Engine wiring
// ============================================================================

pub struct TestHarness {
    pub storage: Arc<SqliteFolderStorage>,
    pub use_case: RefreshFolderListUseCase,
}

pub fn client_for(server: &MockServer) -> JmapClient {
    JmapClient::new(
        format!("{}{}", server.uri(), SESSION_PATH),
        Credentials::basic("test", "test"),
    )
    .expect("client")
}

/// Wires a provider against `server` with an empty in-memory store
pub async fn harness(server: &MockServer) -> TestHarness {
    let pool = DatabasePool::in_memory().await.expect("in-memory database");
    let account = AccountId::new(ACCOUNT_ID.to_string()).unwrap();
    let storage = Arc::new(SqliteFolderStorage::new(pool.pool().clone(), account));
    let provider = Arc::new(JmapMailProvider::new(client_for(server)));
    let use_case = RefreshFolderListUseCase::new(provider, storage.clone());

    TestHarness { storage, use_case }
}

/// Stores the six standard folders together with `cursor`
pub async fn seed_standard_folders(storage: &SqliteFolderStorage, cursor: &str) {
    storage
        .create_folders(&standard_folders())
        .await
        .expect("seed folders");
    storage
        .set_extra_string(SYNC_CURSOR_KEY, cursor)
        .await
        .expect("seed cursor");
}

pub fn folder(id: &str, name: &str, folder_type: FolderType) -> Folder {
    Folder::new(ServerId::new(id.to_string()).unwrap(), name, folder_type)
}

/// Folders matching [`mailbox_get_response`], ordered by server id
pub fn standard_folders() -> Vec<Folder> {
    vec![
        folder("id_archive", "Archive", FolderType::Archive),
        folder("id_drafts", "Drafts", FolderType::Drafts),
        folder("id_folder1", "folder1", FolderType::Regular),
        folder("id_inbox", "Inbox", FolderType::Inbox),
        folder("id_sent", "Sent", FolderType::Sent),
        folder("id_trash", "Trash", FolderType::Trash),
    ]
}

/// Folders after applying the changes from "23" to "42"
pub fn updated_folders() -> Vec<Folder> {
    vec![
        folder("id_archive", "Archive", FolderType::Archive),
        folder("id_drafts", "Drafts", FolderType::Drafts),
        folder("id_folder2", "folder2", FolderType::Regular),
        folder("id_inbox", "Inbox", FolderType::Inbox),
        folder("id_sent", "Sent", FolderType::Sent),
        folder("id_trash", "Deleted messages", FolderType::Trash),
    ]
}

pub async fn stored_cursor(storage: &SqliteFolderStorage) -> Option<String> {
    storage
        .get_extra_string(SYNC_CURSOR_KEY)
        .await
        .expect("read cursor")
}
