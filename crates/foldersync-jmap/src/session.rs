//! JMAP session resource
//!
//! The session resource tells the client which accounts it may address,
//! which capabilities the server supports, and where to POST API requests.

use std::collections::HashMap;

use foldersync_core::domain::session::CAPABILITY_MAIL;
use foldersync_core::domain::{AccountId, Session};
use serde::Deserialize;
use serde_json::Value;

use crate::JmapError;

/// Raw session resource as returned by the server
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResource {
    /// Server-wide capabilities, keyed by capability URI
    pub capabilities: HashMap<String, Value>,
    /// Accounts the user can access, keyed by account id
    #[serde(default)]
    pub accounts: HashMap<String, SessionAccount>,
    /// Primary account per capability
    #[serde(default)]
    pub primary_accounts: HashMap<String, String>,
    /// Authenticated user name
    pub username: Option<String>,
    /// Endpoint for API requests
    pub api_url: Option<String>,
    /// Session state
    pub state: Option<String>,
}

/// An account listed in the session resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAccount {
    pub name: Option<String>,
    #[serde(default)]
    pub is_personal: bool,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub account_capabilities: HashMap<String, Value>,
}

impl SessionResource {
    /// Resolves the session into the account and endpoint used for this refresh
    ///
    /// A configured `account_id` must be listed in `accounts`; without one
    /// the primary mail account is used.
    ///
    /// # Errors
    ///
    /// - [`JmapError::MissingCapability`] if mail is not supported
    /// - [`JmapError::InvalidResponse`] if `apiUrl` is missing
    /// - [`JmapError::AccountNotFound`] if no account can be selected
    pub fn resolve(self, account_id: Option<&str>) -> Result<Session, JmapError> {
        if !self.capabilities.contains_key(CAPABILITY_MAIL) {
            return Err(JmapError::MissingCapability(CAPABILITY_MAIL.to_string()));
        }

        let api_url = self
            .api_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| JmapError::InvalidResponse("session has no apiUrl".to_string()))?;

        let selected = match account_id {
            Some(id) if self.accounts.contains_key(id) => id.to_string(),
            Some(id) => return Err(JmapError::AccountNotFound(id.to_string())),
            None => self
                .primary_accounts
                .get(CAPABILITY_MAIL)
                .cloned()
                .ok_or_else(|| {
                    JmapError::AccountNotFound("no primary mail account".to_string())
                })?,
        };
        let account_id = AccountId::new(selected)
            .map_err(|e| JmapError::InvalidResponse(e.to_string()))?;

        let mut capabilities: Vec<String> = self.capabilities.into_keys().collect();
        capabilities.sort();

        let session = Session::new(account_id, api_url, capabilities);
        Ok(match self.state {
            Some(state) => session.with_state(state),
            None => session,
        })
    }
}
