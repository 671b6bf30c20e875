//! Folder diff computation
//!
//! A [`FolderDiff`] is the batch of storage mutations one refresh applies.
//! It is built either from a full listing (compared against every locally
//! known id) or from a [`ChangeSet`] (the server already named the changes).

use std::collections::BTreeSet;

use super::change_set::ChangeSet;
use super::folder::Folder;
use super::newtypes::ServerId;

/// Storage mutations for one refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderDiff {
    /// Folders to insert
    pub to_create: Vec<Folder>,
    /// Folders whose name and type are overwritten
    pub to_update: Vec<Folder>,
    /// Folders to remove
    pub to_delete: Vec<ServerId>,
}

impl FolderDiff {
    /// Diff between a complete remote listing and the local id set
    ///
    /// Remote-only ids are created, ids on both sides are updated
    /// unconditionally, local-only ids are deleted. The result converges
    /// no matter how far the local state has drifted.
    pub fn from_snapshot(remote: Vec<Folder>, local_ids: &BTreeSet<ServerId>) -> Self {
        let mut diff = Self::default();
        let mut remote_ids = BTreeSet::new();

        for folder in remote {
            remote_ids.insert(folder.server_id().clone());
            if local_ids.contains(folder.server_id()) {
                diff.to_update.push(folder);
            } else {
                diff.to_create.push(folder);
            }
        }

        diff.to_delete = local_ids.difference(&remote_ids).cloned().collect();
        diff
    }

    /// Diff that applies an explicit change set
    ///
    /// The change set is authoritative. The local id set is only consulted
    /// so the storage calls stay well-formed: an update of an id we do not
    /// have becomes a creation, a creation of an id we already have becomes
    /// an update, and destroying an unknown id is skipped.
    pub fn from_change_set(changes: &ChangeSet, local_ids: &BTreeSet<ServerId>) -> Self {
        let mut diff = Self::default();

        for folder in changes.created().chain(changes.updated()) {
            if local_ids.contains(folder.server_id()) {
                diff.to_update.push(folder.clone());
            } else {
                diff.to_create.push(folder.clone());
            }
        }

        diff.to_delete = changes
            .destroyed()
            .filter(|id| local_ids.contains(*id))
            .cloned()
            .collect();

        diff
    }

    /// Returns true if applying the diff changes nothing
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}
