//! Folders command - Show the locally stored folder list
//!
//! Reads the folder database only; no server requests are made. Without
//! an account filter every account found in the database is listed.

use anyhow::{Context, Result};
use clap::Args;
use foldersync_cache::SqliteFolderStorage;
use foldersync_core::config::Config;
use foldersync_core::domain::{AccountId, Folder};
use foldersync_core::ports::{IFolderStorage, SYNC_CURSOR_KEY};
use serde_json::json;

use crate::output::{get_formatter, plural, OutputFormat};

#[derive(Debug, Args)]
pub struct FoldersCommand {
    /// Only show this account (defaults to server.account_id when set)
    #[arg(long)]
    pub account: Option<String>,
}

/// Folders and cursor stored for one account
struct AccountListing {
    account_id: AccountId,
    cursor: Option<String>,
    folders: Vec<Folder>,
}

impl FoldersCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format.is_json());
        let pool = super::open_database(config).await?;

        let accounts = match self.account.as_ref().or(config.server.account_id.as_ref()) {
            Some(id) => vec![AccountId::new(id.clone()).context("Invalid account id")?],
            None => SqliteFolderStorage::accounts(pool.pool())
                .await
                .context("Failed to list accounts")?,
        };

        let mut listings = Vec::with_capacity(accounts.len());
        for account_id in accounts {
            let storage = SqliteFolderStorage::new(pool.pool().clone(), account_id.clone());
            listings.push(AccountListing {
                cursor: storage.get_extra_string(SYNC_CURSOR_KEY).await?,
                folders: storage.list_folders().await?,
                account_id,
            });
        }
        pool.close().await;

        if format.is_json() {
            formatter.print_json(&listings_json(&listings));
            return Ok(());
        }

        if listings.is_empty() {
            formatter.info("No folders stored yet. Run 'foldersync refresh' first.");
            return Ok(());
        }

        for listing in &listings {
            formatter.success(&format!(
                "{} ({} folder{})",
                listing.account_id,
                listing.folders.len(),
                plural(listing.folders.len())
            ));
            formatter.field("Cursor", listing.cursor.as_deref().unwrap_or("none"));
            for folder in &listing.folders {
                formatter.info(&format!(
                    "  {:<8} {:<24} {}",
                    folder.folder_type().as_str(),
                    folder.server_id().as_str(),
                    folder.name()
                ));
            }
        }

        Ok(())
    }
}

fn listings_json(listings: &[AccountListing]) -> serde_json::Value {
    let accounts: Vec<serde_json::Value> = listings
        .iter()
        .map(|listing| {
            json!({
                "account_id": listing.account_id.as_str(),
                "cursor": listing.cursor,
                "folders": listing.folders.iter().map(|f| json!({
                    "server_id": f.server_id().as_str(),
                    "name": f.name(),
                    "folder_type": f.folder_type().as_str(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({ "accounts": accounts })
}
