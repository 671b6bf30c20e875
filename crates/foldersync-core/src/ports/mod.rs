//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IMailProvider`] - Session discovery, mailbox listing and changes queries
//! - [`IFolderStorage`] - Local folder mirror and sync cursor store

pub mod folder_storage;
pub mod mail_provider;

pub use folder_storage::{IFolderStorage, SYNC_CURSOR_KEY};
pub use mail_provider::{ChangesPage, ChangesReply, IMailProvider, MailboxListing, RemoteMailbox};
