//! SQLite implementation of IFolderStorage
//!
//! Every row is keyed by account id, so one database file can hold the
//! folder mirrors of several accounts while each [`SqliteFolderStorage`]
//! only ever sees its own.
//!
//! ## Type Mapping
//!
//! | Domain Type   | SQL Type | Strategy                                    |
//! |---------------|----------|---------------------------------------------|
//! | AccountId     | TEXT     | `.as_str()` / `AccountId::new()`            |
//! | ServerId      | TEXT     | `.as_str()` / `ServerId::new()`             |
//! | FolderType    | TEXT     | `.as_str()` / `FromStr`                     |
//! | DateTime<Utc> | TEXT     | ISO 8601 via `to_rfc3339()`                 |

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};

use foldersync_core::domain::{AccountId, Folder, FolderDiff, FolderType, ServerId, SyncCursor};
use foldersync_core::ports::IFolderStorage;

use crate::CacheError;

/// SQLite-backed folder mirror of one account
pub struct SqliteFolderStorage {
    pool: SqlitePool,
    account_id: AccountId,
}

impl SqliteFolderStorage {
    /// Creates a storage scoped to `account_id` on the given pool
    pub fn new(pool: SqlitePool, account_id: AccountId) -> Self {
        Self { pool, account_id }
    }

    /// Returns the account this storage is scoped to
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Lists every account that has folders or extra strings in the database
    pub async fn accounts(pool: &SqlitePool) -> Result<Vec<AccountId>, CacheError> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT account_id FROM folders \
             UNION SELECT account_id FROM extra_strings \
             ORDER BY account_id",
        )
        .fetch_all(pool)
        .await?;

        ids.into_iter()
            .map(|id| AccountId::new(id).map_err(|e| CacheError::SerializationError(e.to_string())))
            .collect()
    }
}

// ============================================================================
// Row conversion
// ============================================================================

fn folder_from_row(row: &SqliteRow) -> Result<Folder, CacheError> {
    let server_id: String = row.get("server_id");
    let name: String = row.get("name");
    let folder_type: String = row.get("folder_type");

    let server_id = ServerId::new(server_id)
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;
    let folder_type = FolderType::from_str(&folder_type)
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;

    Ok(Folder::new(server_id, name, folder_type))
}

// ============================================================================
// Statements shared by single calls and the commit transaction
// ============================================================================

async fn insert_folders(
    conn: &mut SqliteConnection,
    account_id: &str,
    folders: &[Folder],
) -> Result<(), CacheError> {
    let now = Utc::now().to_rfc3339();
    for folder in folders {
        sqlx::query(
            "INSERT INTO folders (account_id, server_id, name, folder_type, updated_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(account_id)
        .bind(folder.server_id().as_str())
        .bind(folder.name())
        .bind(folder.folder_type().as_str())
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn upsert_folders(
    conn: &mut SqliteConnection,
    account_id: &str,
    folders: &[Folder],
) -> Result<(), CacheError> {
    let now = Utc::now().to_rfc3339();
    for folder in folders {
        sqlx::query(
            "INSERT INTO folders (account_id, server_id, name, folder_type, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT (account_id, server_id) DO UPDATE SET \
             name = excluded.name, folder_type = excluded.folder_type, \
             updated_at = excluded.updated_at",
        )
        .bind(account_id)
        .bind(folder.server_id().as_str())
        .bind(folder.name())
        .bind(folder.folder_type().as_str())
        .bind(&now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn remove_folders(
    conn: &mut SqliteConnection,
    account_id: &str,
    server_ids: &[ServerId],
) -> Result<(), CacheError> {
    for server_id in server_ids {
        sqlx::query("DELETE FROM folders WHERE account_id = ? AND server_id = ?")
            .bind(account_id)
            .bind(server_id.as_str())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write_extra_string(
    conn: &mut SqliteConnection,
    account_id: &str,
    key: &str,
    value: &str,
) -> Result<(), CacheError> {
    sqlx::query(
        "INSERT OR REPLACE INTO extra_strings (account_id, key, value, updated_at) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(account_id)
    .bind(key)
    .bind(value)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// ============================================================================
// IFolderStorage
// ============================================================================

#[async_trait::async_trait]
impl IFolderStorage for SqliteFolderStorage {
    async fn create_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_folders(&mut tx, self.account_id.as_str(), folders).await?;
        tx.commit().await?;

        tracing::trace!(count = folders.len(), "Created folders");
        Ok(())
    }

    async fn update_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        upsert_folders(&mut tx, self.account_id.as_str(), folders).await?;
        tx.commit().await?;

        tracing::trace!(count = folders.len(), "Updated folders");
        Ok(())
    }

    async fn delete_folders(&self, server_ids: &[ServerId]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        remove_folders(&mut tx, self.account_id.as_str(), server_ids).await?;
        tx.commit().await?;

        tracing::trace!(count = server_ids.len(), "Deleted folders");
        Ok(())
    }

    async fn get_folder_server_ids(&self) -> anyhow::Result<BTreeSet<ServerId>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT server_id FROM folders WHERE account_id = ?")
                .bind(self.account_id.as_str())
                .fetch_all(&self.pool)
                .await?;

        let mut server_ids = BTreeSet::new();
        for id in ids {
            server_ids.insert(
                ServerId::new(id).map_err(|e| CacheError::SerializationError(e.to_string()))?,
            );
        }
        Ok(server_ids)
    }

    async fn get_folder(&self, server_id: &ServerId) -> anyhow::Result<Option<Folder>> {
        let row = sqlx::query(
            "SELECT server_id, name, folder_type FROM folders \
             WHERE account_id = ? AND server_id = ?",
        )
        .bind(self.account_id.as_str())
        .bind(server_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(folder_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn get_extra_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar(
            "SELECT value FROM extra_strings WHERE account_id = ? AND key = ?",
        )
        .bind(self.account_id.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value)
    }

    async fn set_extra_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_extra_string(&mut conn, self.account_id.as_str(), key, value).await?;

        tracing::trace!(key, "Stored extra string");
        Ok(())
    }

    async fn list_folders(&self) -> anyhow::Result<Vec<Folder>> {
        let rows = sqlx::query(
            "SELECT server_id, name, folder_type FROM folders \
             WHERE account_id = ? ORDER BY server_id",
        )
        .bind(self.account_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut folders = Vec::with_capacity(rows.len());
        for row in &rows {
            folders.push(folder_from_row(row)?);
        }
        Ok(folders)
    }

    /// Applies the diff and stores the cursor in a single transaction
    async fn commit(
        &self,
        diff: &FolderDiff,
        cursor_key: &str,
        cursor: &SyncCursor,
    ) -> anyhow::Result<()> {
        let account_id = self.account_id.as_str();
        let mut tx = self.pool.begin().await?;

        insert_folders(&mut tx, account_id, &diff.to_create).await?;
        upsert_folders(&mut tx, account_id, &diff.to_update).await?;
        remove_folders(&mut tx, account_id, &diff.to_delete).await?;
        write_extra_string(&mut tx, account_id, cursor_key, cursor.as_str()).await?;

        tx.commit().await?;

        tracing::debug!(
            account_id,
            created = diff.to_create.len(),
            updated = diff.to_update.len(),
            deleted = diff.to_delete.len(),
            cursor = %cursor,
            "Committed folder diff"
        );
        Ok(())
    }
}
