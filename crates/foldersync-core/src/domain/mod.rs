//! Domain entities and business logic
//!
//! This module contains the core domain types for foldersync:
//! - Newtypes for server identifiers and the opaque sync cursor
//! - Folders and the role-based folder type classifier
//! - Change sets accumulated across paginated changes queries
//! - Folder diffs, the storage mutations of one refresh
//! - The resolved protocol session
//! - Domain-specific error types

pub mod change_set;
pub mod errors;
pub mod folder;
pub mod folder_diff;
pub mod newtypes;
pub mod session;

// Re-export commonly used types
pub use change_set::{ChangeSet, FolderChangePage};
pub use errors::{DomainError, ErrorKind, SyncError};
pub use folder::{classify, Folder, FolderType};
pub use folder_diff::FolderDiff;
pub use newtypes::*;
pub use session::Session;
