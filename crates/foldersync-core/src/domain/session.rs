//! Session domain entity
//!
//! A [`Session`] is what the server told us during session discovery:
//! which account to address, where to send API calls, and which
//! capabilities are available. It is resolved once per refresh and is
//! read-only for the rest of that refresh.

use serde::{Deserialize, Serialize};

use super::newtypes::AccountId;

/// Capability identifier for the core protocol
pub const CAPABILITY_CORE: &str = "urn:ietf:params:jmap:core";

/// Capability identifier for mail (mailboxes, emails)
pub const CAPABILITY_MAIL: &str = "urn:ietf:params:jmap:mail";

/// Resolved protocol session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    account_id: AccountId,
    api_url: String,
    capabilities: Vec<String>,
    state: Option<String>,
}

impl Session {
    /// Creates a new Session
    pub fn new(
        account_id: AccountId,
        api_url: impl Into<String>,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            account_id,
            api_url: api_url.into(),
            capabilities,
            state: None,
        }
    }

    /// Sets the session state reported by the server
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Returns the account all calls are addressed to
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the endpoint for API requests
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Returns the server capabilities
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns the session state, if the server reported one
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Returns true if the server advertises the given capability
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}
