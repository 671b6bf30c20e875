//! Refresh command - Bring the local folder list up to date
//!
//! Provides the `foldersync refresh` CLI command which:
//! 1. Validates the configuration and opens the folder database
//! 2. Resolves the JMAP session to learn which account is addressed
//! 3. Runs the refresh use case against that account's storage
//! 4. Retries transport and storage failures with exponential backoff
//!
//! Authentication and protocol failures are never retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use foldersync_cache::{DatabasePool, SqliteFolderStorage};
use foldersync_core::config::Config;
use foldersync_core::domain::SyncError;
use foldersync_core::ports::IMailProvider;
use foldersync_core::usecases::{RefreshFolderListUseCase, RefreshOutcome};
use tracing::{info, warn};

use crate::output::{format_duration_ms, get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// Ignore the stored cursor and fetch the full folder list
    #[arg(long)]
    pub full: bool,
}

impl RefreshCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format.is_json());

        super::ensure_valid(config)?;
        let provider: Arc<dyn IMailProvider> = Arc::new(super::provider(config)?);
        let pool = super::open_database(config).await?;

        info!(
            session_url = %config.server.session_url,
            full = self.full,
            "Starting folder refresh"
        );

        let policy = RetryPolicy::new(config.sync.max_retries);
        let outcome = policy
            .run(|| refresh_once(provider.clone(), &pool, config, self.full))
            .await
            .context("Refresh failed")?;

        pool.close().await;

        if format.is_json() {
            let json = serde_json::to_value(&outcome)
                .context("Failed to serialize refresh outcome")?;
            formatter.print_json(&json);
            return Ok(());
        }

        let changes = outcome.created + outcome.updated + outcome.deleted;
        if changes == 0 {
            formatter.success("Folder list already up to date");
        } else {
            formatter.success(&format!(
                "Folder list refreshed in {}",
                format_duration_ms(outcome.duration_ms)
            ));
        }
        formatter.field("Mode", outcome.mode.as_str());
        formatter.field(
            "Created",
            &format!("{} folder{}", outcome.created, plural(outcome.created)),
        );
        formatter.field(
            "Updated",
            &format!("{} folder{}", outcome.updated, plural(outcome.updated)),
        );
        formatter.field(
            "Deleted",
            &format!("{} folder{}", outcome.deleted, plural(outcome.deleted)),
        );
        if outcome.pages_fetched > 0 {
            formatter.field("Pages", &outcome.pages_fetched.to_string());
        }
        formatter.field("Cursor", outcome.cursor.as_str());

        Ok(())
    }
}

/// One attempt: resolve the account, then refresh its storage
async fn refresh_once(
    provider: Arc<dyn IMailProvider>,
    pool: &DatabasePool,
    config: &Config,
    full: bool,
) -> Result<RefreshOutcome, SyncError> {
    let session = provider.resolve_session().await?;
    let storage = Arc::new(SqliteFolderStorage::new(
        pool.pool().clone(),
        session.account_id().clone(),
    ));

    let use_case = RefreshFolderListUseCase::new(provider, storage)
        .with_max_change_pages(config.sync.max_change_pages);

    if full {
        use_case.execute_full_with_session(&session).await
    } else {
        use_case.execute_with_session(&session).await
    }
}

// ============================================================================
// Retry policy
// ============================================================================

/// Base delay for exponential backoff
const BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff delay
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Exponential backoff for transient refresh failures
///
/// Backoff schedule: 1s, 2s, 4s, 8s, 16s, 30s, 30s, ...
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: BASE_DELAY,
        }
    }

    #[cfg(test)]
    fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Runs `operation`, retrying errors that are not permanent
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempt, "Refresh succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if !err.is_permanent() && attempt < self.max_retries => {
                    let delay = self.delay(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        kind = %err.kind(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient refresh failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
