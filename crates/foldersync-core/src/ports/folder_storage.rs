//! Folder storage port (driven/secondary port)
//!
//! This module defines the local key-value contract the reconciliation
//! engine writes through: a map of server id to folder, plus a small
//! string store used for the sync cursor.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, memory, etc.) and don't need domain-level classification.
//! - Each instance is scoped to exactly one account. Refreshes of
//!   different accounts never share an instance.
//! - The engine is the only writer. [`IFolderStorage::commit`] is the one
//!   call it uses to write, so adapters that support transactions should
//!   override it.

use std::collections::BTreeSet;

use crate::domain::{Folder, FolderDiff, ServerId, SyncCursor};

/// Extra-string key under which the sync cursor is stored
pub const SYNC_CURSOR_KEY: &str = "syncCursor";

/// Port trait for the local folder mirror of one account
#[async_trait::async_trait]
pub trait IFolderStorage: Send + Sync {
    /// Inserts new folders
    async fn create_folders(&self, folders: &[Folder]) -> anyhow::Result<()>;

    /// Overwrites name and type of existing folders
    ///
    /// Implementations may treat this as an upsert.
    async fn update_folders(&self, folders: &[Folder]) -> anyhow::Result<()>;

    /// Removes folders; unknown ids are ignored
    async fn delete_folders(&self, server_ids: &[ServerId]) -> anyhow::Result<()>;

    /// Returns the ids of all stored folders
    async fn get_folder_server_ids(&self) -> anyhow::Result<BTreeSet<ServerId>>;

    /// Retrieves a folder by its server id
    async fn get_folder(&self, server_id: &ServerId) -> anyhow::Result<Option<Folder>>;

    /// Reads a value from the extra-string store
    async fn get_extra_string(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Writes a value to the extra-string store, replacing any previous one
    async fn set_extra_string(&self, key: &str, value: &str) -> anyhow::Result<()>;

    /// Returns all stored folders ordered by server id
    async fn list_folders(&self) -> anyhow::Result<Vec<Folder>> {
        let mut folders = Vec::new();
        for id in self.get_folder_server_ids().await? {
            if let Some(folder) = self.get_folder(&id).await? {
                folders.push(folder);
            }
        }
        Ok(folders)
    }

    /// Applies a diff and then stores the cursor it corresponds to
    ///
    /// The cursor is written last, so a failure part-way leaves the previous
    /// cursor in place and the next refresh re-requests the same changes.
    /// Adapters with transactions should override this to make the whole
    /// commit atomic.
    async fn commit(
        &self,
        diff: &FolderDiff,
        cursor_key: &str,
        cursor: &SyncCursor,
    ) -> anyhow::Result<()> {
        if !diff.to_create.is_empty() {
            self.create_folders(&diff.to_create).await?;
        }
        if !diff.to_update.is_empty() {
            self.update_folders(&diff.to_update).await?;
        }
        if !diff.to_delete.is_empty() {
            self.delete_folders(&diff.to_delete).await?;
        }
        self.set_extra_string(cursor_key, cursor.as_str()).await
    }
}
