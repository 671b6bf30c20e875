//! Session discovery and request envelope tests

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use foldersync_core::domain::ErrorKind;
use foldersync_core::ports::IMailProvider;
use foldersync_jmap::JmapMailProvider;

use crate::common::{self, ACCOUNT_ID, API_PATH};

#[tokio::test]
async fn test_resolve_session_selects_primary_mail_account() {
    let server = common::setup_jmap_mock().await;
    let provider = JmapMailProvider::new(common::client_for(&server));

    let session = provider.resolve_session().await.unwrap();

    assert_eq!(session.account_id().as_str(), ACCOUNT_ID);
    assert_eq!(session.api_url(), format!("{}{}", server.uri(), API_PATH));
    assert!(session.has_capability("urn:ietf:params:jmap:mail"));
    assert_eq!(session.state(), Some("0"));
}

#[tokio::test]
async fn test_resolve_session_with_configured_account() {
    let server = common::setup_jmap_mock().await;
    let provider = JmapMailProvider::new(common::client_for(&server)).with_account_id(ACCOUNT_ID);

    let session = provider.resolve_session().await.unwrap();
    assert_eq!(session.account_id().as_str(), ACCOUNT_ID);
}

#[tokio::test]
async fn test_resolve_session_unknown_account_is_permanent() {
    let server = common::setup_jmap_mock().await;
    let provider =
        JmapMailProvider::new(common::client_for(&server)).with_account_id("other@example.com");

    let err = provider.resolve_session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermanentProtocol);
    assert!(err.to_string().contains("other@example.com"));
}

#[tokio::test]
async fn test_session_without_mail_capability_is_permanent() {
    let server = MockServer::start().await;
    let mut body = common::session_body(&server);
    body["capabilities"] = json!({ "urn:ietf:params:jmap:core": {} });
    common::mount_session(&server, ResponseTemplate::new(200).set_body_json(body)).await;

    let provider = JmapMailProvider::new(common::client_for(&server));
    let err = provider.resolve_session().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PermanentProtocol);
}

#[tokio::test]
async fn test_session_unauthorized() {
    let server = MockServer::start().await;
    common::mount_session(&server, ResponseTemplate::new(401)).await;

    let provider = JmapMailProvider::new(common::client_for(&server));
    let err = provider.resolve_session().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
}

#[tokio::test]
async fn test_mailbox_get_request_envelope() {
    let server = common::setup_jmap_mock().await;

    // Only a correctly shaped listing request gets an answer
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "using": ["urn:ietf:params:jmap:core", "urn:ietf:params:jmap:mail"],
            "methodCalls": [
                ["Mailbox/get", {
                    "accountId": ACCOUNT_ID,
                    "ids": null,
                    "properties": ["id", "name", "role"]
                }, "0"]
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::mailbox_get_response()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = JmapMailProvider::new(common::client_for(&server));
    let session = provider.resolve_session().await.unwrap();
    let listing = provider.get_all_mailboxes(&session).await.unwrap();

    assert_eq!(listing.state, "23");
    assert_eq!(listing.mailboxes.len(), 6);
    assert_eq!(listing.mailboxes[0].id, "id_inbox");
    assert_eq!(listing.mailboxes[0].role.as_deref(), Some("inbox"));
    assert_eq!(listing.mailboxes[5].role, None);
}
