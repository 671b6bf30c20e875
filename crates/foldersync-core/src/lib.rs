//! foldersync Core - Domain logic and folder reconciliation
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Folder`, `FolderType`, `ChangeSet`, `FolderDiff`, `Session`
//! - **Use cases** - `RefreshFolderListUseCase`, `SnapshotFetcher`
//! - **Port definitions** - Traits for adapters: `IMailProvider`, `IFolderStorage`
//! - **Configuration** - YAML configuration shared by the binaries
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
