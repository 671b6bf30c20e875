//! CLI subcommands and the adapter wiring they share

pub mod config;
pub mod folders;
pub mod refresh;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use foldersync_cache::DatabasePool;
use foldersync_core::config::Config;
use foldersync_jmap::{Credentials, JmapClient, JmapMailProvider};

/// Fails with every validation error when the configuration is unusable
pub fn ensure_valid(config: &Config) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }

    let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    bail!(
        "Invalid configuration: {}. Run 'foldersync config validate' for details.",
        messages.join("; ")
    )
}

/// Reads credentials from the environment variables named in the config
pub fn credentials(config: &Config) -> Result<Credentials> {
    credentials_from(config, |name| std::env::var(name).ok())
}

/// A bearer token wins over basic authentication when `auth.token_env` is set
fn credentials_from(
    config: &Config,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    if let Some(token_env) = &config.auth.token_env {
        let token = lookup(token_env)
            .filter(|t| !t.is_empty())
            .with_context(|| format!("Environment variable {token_env} is not set"))?;
        return Ok(Credentials::bearer(token));
    }

    let username = config
        .auth
        .username
        .clone()
        .context("auth.username is not configured")?;
    let password = lookup(&config.auth.password_env)
        .with_context(|| format!("Environment variable {} is not set", config.auth.password_env))?;

    Ok(Credentials::basic(username, password))
}

/// Builds the JMAP provider for the configured server and account
pub fn provider(config: &Config) -> Result<JmapMailProvider> {
    let client = JmapClient::with_timeout(
        &config.server.session_url,
        credentials(config)?,
        Duration::from_secs(config.sync.request_timeout_secs),
    )
    .context("Failed to create HTTP client")?;

    let provider = JmapMailProvider::new(client);
    Ok(match &config.server.account_id {
        Some(account_id) => provider.with_account_id(account_id.clone()),
        None => provider,
    })
}

/// Opens (and migrates) the folder database
pub async fn open_database(config: &Config) -> Result<DatabasePool> {
    DatabasePool::new(&config.storage.database)
        .await
        .with_context(|| {
            format!(
                "Failed to open database at {}",
                config.storage.database.display()
            )
        })
}
