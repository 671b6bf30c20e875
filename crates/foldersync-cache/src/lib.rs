//! foldersync Cache - Local folder persistence
//!
//! SQLite-based storage for:
//! - The folder mirror of each account (server id, name, folder type)
//! - Per-account extra strings, including the sync cursor
//!
//! ## Architecture
//!
//! This crate implements the `IFolderStorage` port from `foldersync-core`
//! using SQLite as the storage backend. It is a driven (secondary) adapter
//! in the hexagonal architecture.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - Connection pool with migration support
//! - [`SqliteFolderStorage`] - Account-scoped `IFolderStorage` implementation
//! - [`CacheError`] - Error types for cache operations
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use foldersync_cache::{DatabasePool, SqliteFolderStorage};
//! use foldersync_core::domain::AccountId;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/foldersync/folders.db")).await?;
//! let account = AccountId::new("alice@example.com".to_string())?;
//! let storage = SqliteFolderStorage::new(pool.pool().clone(), account);
//! // Use storage as IFolderStorage...
//! # Ok(())
//! # }
//! ```

pub mod pool;
pub mod storage;

pub use pool::DatabasePool;
pub use storage::SqliteFolderStorage;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be converted back into a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}
