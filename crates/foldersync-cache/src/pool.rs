//! Database connection pool management
//!
//! Provides a wrapper around SQLx's SqlitePool with:
//! - Automatic directory creation for database files
//! - WAL journal mode for concurrent reads
//! - Versioned schema migrations tracked in `PRAGMA user_version`
//! - In-memory mode for testing

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::CacheError;

/// Schema migrations in application order; the index + 1 is the schema version
const MIGRATIONS: &[(&str, &str)] = &[(
    "20261018_folders",
    include_str!("migrations/20261018_folders.sql"),
)];

/// Manages a pool of SQLite connections for the folder mirror
///
/// The pool is configured with:
/// - WAL journal mode for concurrent read access
/// - 5 max connections for file-based databases
/// - 1 connection for in-memory databases (each connection would otherwise
///   see its own empty database)
/// - 5-second busy timeout to handle write contention between accounts
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// Opens (or creates) the database file at `db_path` and migrates it
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the directory or connection
    /// cannot be created, or `CacheError::MigrationFailed` if a migration fails.
    pub async fn new(db_path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!(
                    "Failed to connect to database at {}: {}",
                    db_path.display(),
                    e
                ))
            })?;

        let version = Self::run_migrations(&pool).await?;

        tracing::info!(
            path = %db_path.display(),
            schema_version = version,
            "Folder database opened"
        );

        Ok(Self { pool })
    }

    /// Creates a migrated in-memory database for tests
    pub async fn in_memory() -> Result<Self, CacheError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                CacheError::ConnectionFailed(format!("Failed to create in-memory database: {}", e))
            })?;

        Self::run_migrations(&pool).await?;

        tracing::debug!("In-memory folder database initialized");

        Ok(Self { pool })
    }

    /// Returns a reference to the underlying SQLite connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the schema version the database is at
    pub async fn schema_version(&self) -> Result<i64, CacheError> {
        Self::user_version(&self.pool).await
    }

    /// Closes all connections, waiting for in-flight queries
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Applies every migration newer than the stored schema version
    ///
    /// Returns the resulting schema version.
    async fn run_migrations(pool: &SqlitePool) -> Result<i64, CacheError> {
        let current = Self::user_version(pool).await?;

        for (index, (name, sql)) in MIGRATIONS.iter().enumerate() {
            let version = index as i64 + 1;
            if version <= current {
                continue;
            }

            let mut tx = pool.begin().await?;
            sqlx::raw_sql(sql).execute(&mut *tx).await.map_err(|e| {
                CacheError::MigrationFailed(format!("Failed to apply migration {name}: {e}"))
            })?;
            // PRAGMA does not accept bound parameters
            sqlx::raw_sql(&format!("PRAGMA user_version = {version}"))
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    CacheError::MigrationFailed(format!("Failed to record migration {name}: {e}"))
                })?;
            tx.commit().await?;

            tracing::debug!(migration = name, version, "Applied database migration");
        }

        Ok(current.max(MIGRATIONS.len() as i64))
    }

    async fn user_version(pool: &SqlitePool) -> Result<i64, CacheError> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(pool)
            .await?;
        Ok(version)
    }
}
