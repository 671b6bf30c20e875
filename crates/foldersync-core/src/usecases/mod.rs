//! Use cases (interactors) for foldersync
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces.
//!
//! ## Use Cases
//!
//! - [`RefreshFolderListUseCase`] - Reconciles the remote folder list into storage
//! - [`SnapshotFetcher`] - Full folder listing at the current cursor
//!
//! The change fetcher is internal to the refresh: its "cannot compute
//! changes" outcome is only meaningful to the fallback logic there.

pub(crate) mod fetch_changes;
pub mod fetch_snapshot;
pub mod refresh_folder_list;

#[cfg(test)]
pub(crate) mod test_support;

pub use fetch_changes::DEFAULT_MAX_CHANGE_PAGES;
pub use fetch_snapshot::{Snapshot, SnapshotFetcher};
pub use refresh_folder_list::{RefreshFolderListUseCase, RefreshOutcome, SyncMode};
