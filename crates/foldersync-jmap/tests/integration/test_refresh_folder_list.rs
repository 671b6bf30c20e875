//! End-to-end folder list refresh tests
//!
//! Each test drives `RefreshFolderListUseCase` against the mock server and
//! checks what ends up in SQLite.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foldersync_core::domain::ErrorKind;
use foldersync_core::ports::IFolderStorage;
use foldersync_core::usecases::SyncMode;

use crate::common::{self, API_PATH};

#[tokio::test]
async fn test_unauthorized_session_is_authentication_error() {
    let server = MockServer::start().await;
    common::mount_session(&server, ResponseTemplate::new(401)).await;
    let h = common::harness(&server).await;

    let err = h.use_case.execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert!(h.storage.list_folders().await.unwrap().is_empty());
    assert_eq!(common::stored_cursor(&h.storage).await, None);
}

#[tokio::test]
async fn test_invalid_session_body_is_permanent_error() {
    let server = MockServer::start().await;
    common::mount_session(&server, ResponseTemplate::new(200).set_body_string("invalid")).await;
    let h = common::harness(&server).await;

    let err = h.use_case.execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermanentProtocol);
    assert!(err.is_permanent());
}

#[tokio::test]
async fn test_fetch_mailboxes_without_cursor() {
    let server = common::setup_jmap_mock().await;
    common::mount_mailbox_get(&server, 1).await;
    let h = common::harness(&server).await;

    let outcome = h.use_case.execute().await.unwrap();

    assert_eq!(outcome.mode, SyncMode::Full);
    assert_eq!(outcome.created, 6);
    assert_eq!(outcome.deleted, 0);
    assert_eq!(outcome.cursor.as_str(), "23");
    assert_eq!(
        h.storage.list_folders().await.unwrap(),
        common::standard_folders()
    );
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("23"));
}

#[tokio::test]
async fn test_fetch_mailbox_updates() {
    let server = common::setup_jmap_mock().await;
    common::mount_mailbox_changes(&server, "23", common::mailbox_changes_response()).await;
    let h = common::harness(&server).await;
    common::seed_standard_folders(&h.storage, "23").await;

    let outcome = h.use_case.execute().await.unwrap();

    assert_eq!(outcome.mode, SyncMode::Incremental);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!((outcome.created, outcome.updated, outcome.deleted), (1, 1, 1));
    assert_eq!(
        h.storage.list_folders().await.unwrap(),
        common::updated_folders()
    );
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_fetch_mailbox_updates_with_more_changes() {
    let server = common::setup_jmap_mock().await;
    common::mount_mailbox_changes(
        &server,
        "23",
        common::changes_response(
            "23",
            "35",
            true,
            json!([]),
            json!([{ "id": "id_trash", "name": "Deleted messages", "role": "trash" }]),
            &[],
        ),
    )
    .await;
    common::mount_mailbox_changes(
        &server,
        "35",
        common::changes_response(
            "35",
            "42",
            false,
            json!([{ "id": "id_folder2", "name": "folder2", "role": null }]),
            json!([]),
            &["id_folder1"],
        ),
    )
    .await;
    let h = common::harness(&server).await;
    common::seed_standard_folders(&h.storage, "23").await;

    let outcome = h.use_case.execute().await.unwrap();

    // Same result as receiving all changes in one page
    assert_eq!(outcome.mode, SyncMode::Incremental);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(
        h.storage.list_folders().await.unwrap(),
        common::updated_folders()
    );
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_cannot_calculate_changes_falls_back_to_full_listing() {
    let server = common::setup_jmap_mock().await;
    common::mount_mailbox_changes(
        &server,
        "unknownToServer",
        common::cannot_calculate_changes_response(),
    )
    .await;
    common::mount_mailbox_get(&server, 1).await;
    let h = common::harness(&server).await;
    common::seed_standard_folders(&h.storage, "unknownToServer").await;
    // A folder the listing no longer contains
    h.storage
        .create_folders(&[common::folder(
            "id_stale",
            "stale",
            foldersync_core::domain::FolderType::Regular,
        )])
        .await
        .unwrap();

    let outcome = h.use_case.execute().await.unwrap();

    assert_eq!(outcome.mode, SyncMode::FallbackFull);
    assert_eq!(outcome.deleted, 1);
    assert_eq!(
        h.storage.list_folders().await.unwrap(),
        common::standard_folders()
    );
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("23"));
}

#[tokio::test]
async fn test_full_refresh_ignores_stored_cursor() {
    let server = common::setup_jmap_mock().await;
    common::mount_mailbox_get(&server, 1).await;
    let h = common::harness(&server).await;
    common::seed_standard_folders(&h.storage, "17").await;

    let outcome = h.use_case.execute_full().await.unwrap();

    assert_eq!(outcome.mode, SyncMode::Full);
    assert_eq!((outcome.created, outcome.updated, outcome.deleted), (0, 6, 0));
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("23"));
}

#[tokio::test]
async fn test_server_error_is_transport_and_keeps_cursor() {
    let server = common::setup_jmap_mock().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = common::harness(&server).await;
    common::seed_standard_folders(&h.storage, "23").await;

    let err = h.use_case.execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!err.is_permanent());
    assert_eq!(
        h.storage.list_folders().await.unwrap(),
        common::standard_folders()
    );
    assert_eq!(common::stored_cursor(&h.storage).await.as_deref(), Some("23"));
}

#[tokio::test]
async fn test_malformed_api_response_is_permanent() {
    let server = common::setup_jmap_mock().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "methodResponses": [["Mailbox/get", { "list": [] }, "0"]]
        })))
        .mount(&server)
        .await;
    let h = common::harness(&server).await;

    let err = h.use_case.execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermanentProtocol);
    assert_eq!(common::stored_cursor(&h.storage).await, None);
}
