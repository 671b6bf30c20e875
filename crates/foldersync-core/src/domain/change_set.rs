//! Accumulated folder changes
//!
//! A changes query may be split across several pages. Each page is folded
//! into a [`ChangeSet`] in the order it was received, so the set always
//! describes the net effect of every page seen so far.

use std::collections::{BTreeMap, BTreeSet};

use super::folder::Folder;
use super::newtypes::{ServerId, SyncCursor};

/// One page of changes, with folders already classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderChangePage {
    /// Folders created since the page's starting cursor
    pub created: Vec<Folder>,
    /// Folders whose name or role changed
    pub updated: Vec<Folder>,
    /// Folders removed on the server
    pub destroyed: Vec<ServerId>,
    /// Cursor to continue from
    pub new_cursor: SyncCursor,
    /// Whether the server holds further changes past `new_cursor`
    pub has_more: bool,
}

/// Net effect of one or more change pages
///
/// `created`, `updated` and `destroyed` are pairwise disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    created: BTreeMap<ServerId, Folder>,
    updated: BTreeMap<ServerId, Folder>,
    destroyed: BTreeSet<ServerId>,
    next_cursor: SyncCursor,
    has_more: bool,
    pages: u32,
}

impl ChangeSet {
    /// Creates an empty change set starting at `since`
    pub fn new(since: SyncCursor) -> Self {
        Self {
            created: BTreeMap::new(),
            updated: BTreeMap::new(),
            destroyed: BTreeSet::new(),
            next_cursor: since,
            has_more: false,
            pages: 0,
        }
    }

    /// Folds the next page into the set
    ///
    /// Within a page, destructions are applied last so they win over a
    /// creation or update of the same id. Across pages the later page wins:
    /// - a destroyed id leaves `created`/`updated`
    /// - a re-appearing id leaves `destroyed`
    /// - an update of an id created earlier refreshes the pending creation
    pub fn merge_page(&mut self, page: FolderChangePage) {
        for folder in page.created {
            let id = folder.server_id().clone();
            self.destroyed.remove(&id);
            self.updated.remove(&id);
            self.created.insert(id, folder);
        }

        for folder in page.updated {
            let id = folder.server_id().clone();
            self.destroyed.remove(&id);
            if let Some(pending) = self.created.get_mut(&id) {
                *pending = folder;
            } else {
                self.updated.insert(id, folder);
            }
        }

        for id in page.destroyed {
            self.created.remove(&id);
            self.updated.remove(&id);
            self.destroyed.insert(id);
        }

        self.next_cursor = page.new_cursor;
        self.has_more = page.has_more;
        self.pages += 1;
    }

    pub fn created(&self) -> impl Iterator<Item = &Folder> {
        self.created.values()
    }

    pub fn updated(&self) -> impl Iterator<Item = &Folder> {
        self.updated.values()
    }

    pub fn destroyed(&self) -> impl Iterator<Item = &ServerId> {
        self.destroyed.iter()
    }

    /// Cursor of the most recently merged page
    pub fn next_cursor(&self) -> &SyncCursor {
        &self.next_cursor
    }

    /// Whether the most recently merged page announced more changes
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Number of pages merged so far
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Returns true if no folder changed
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.destroyed.is_empty()
    }
}
