//! JMAP HTTP client
//!
//! Provides a typed HTTP client for a JMAP server: fetching the session
//! resource and POSTing request envelopes to the API URL. Handles
//! authentication headers, status mapping, and JSON deserialization.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use foldersync_jmap::client::{Credentials, JmapClient};
//!
//! # async fn example() -> Result<(), foldersync_jmap::JmapError> {
//! let client = JmapClient::new(
//!     "https://mail.example.com/.well-known/jmap",
//!     Credentials::basic("alice", "secret"),
//! )?;
//! let session = client.fetch_session().await?;
//! println!("API endpoint: {:?}", session.api_url);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::request::{JmapRequest, JmapResponse};
use crate::session::SessionResource;
use crate::JmapError;

/// Default timeout for a single HTTP request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Credentials
// ============================================================================

/// Credentials sent with every request
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// HTTP basic authentication
    Basic { username: String, password: String },
    /// Bearer token (e.g. an OAuth2 access token)
    Bearer(String),
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Credentials::Bearer(token.into())
    }
}

// Secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<redacted>").finish(),
        }
    }
}

// ============================================================================
// JmapClient
// ============================================================================

/// HTTP client for JMAP calls
///
/// Wraps `reqwest::Client` with credentials and the session URL. Performs
/// exactly one HTTP exchange per call and never retries.
pub struct JmapClient {
    /// The underlying HTTP client
    client: Client,
    /// URL of the session resource
    session_url: String,
    credentials: Credentials,
}

impl JmapClient {
    /// Creates a new JmapClient with the default request timeout
    ///
    /// # Arguments
    /// * `session_url` - URL of the session resource
    /// * `credentials` - Credentials sent with every request
    pub fn new(
        session_url: impl Into<String>,
        credentials: Credentials,
    ) -> Result<Self, JmapError> {
        Self::with_timeout(session_url, credentials, DEFAULT_TIMEOUT)
    }

    /// Creates a new JmapClient with a custom per-request timeout
    pub fn with_timeout(
        session_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, JmapError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("foldersync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            session_url: session_url.into(),
            credentials,
        })
    }

    /// Returns the session resource URL
    pub fn session_url(&self) -> &str {
        &self.session_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Credentials::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Fetches the session resource
    ///
    /// # Errors
    ///
    /// - [`JmapError::Unauthorized`] on 401/403
    /// - [`JmapError::Server`] on 5xx
    /// - [`JmapError::InvalidResponse`] on other failures or a malformed body
    /// - [`JmapError::Network`] if the request could not be completed
    pub async fn fetch_session(&self) -> Result<SessionResource, JmapError> {
        debug!(url = %self.session_url, "Fetching JMAP session resource");

        let response = self
            .authorize(self.client.get(&self.session_url))
            .header("Accept", "application/json")
            .send()
            .await?;

        read_json(response, "session resource").await
    }

    /// POSTs a request envelope to `api_url`
    pub async fn call(
        &self,
        api_url: &str,
        request: &JmapRequest,
    ) -> Result<JmapResponse, JmapError> {
        debug!(
            url = %api_url,
            methods = ?request.method_calls().iter().map(|(name, _, _)| name.as_str()).collect::<Vec<_>>(),
            "Sending JMAP request"
        );

        let response = self
            .authorize(self.client.post(api_url))
            .json(request)
            .send()
            .await?;

        read_json(response, "API response").await
    }
}

/// Maps non-success statuses to errors, then parses the body as JSON
async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T, JmapError> {
    let status = response.status();
    let url = response.url().to_string();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(JmapError::Unauthorized(format!("{status} from {url}")));
    }
    if status.is_server_error() {
        return Err(JmapError::Server(format!("{status} from {url}")));
    }
    if !status.is_success() {
        return Err(JmapError::InvalidResponse(format!(
            "unexpected status {status} for {what} from {url}"
        )));
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| JmapError::InvalidResponse(format!("malformed {what}: {e}")))
}
