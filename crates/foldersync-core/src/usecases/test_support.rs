//! In-memory fakes for use case tests

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::bail;

use crate::domain::{AccountId, Folder, ServerId, Session, SyncCursor, SyncError};
use crate::ports::{
    ChangesPage, ChangesReply, IFolderStorage, IMailProvider, MailboxListing, RemoteMailbox,
};

pub fn test_session() -> Session {
    Session::new(
        AccountId::new("account-1".to_string()).unwrap(),
        "https://mail.example.com/jmap/api/",
        vec![crate::domain::session::CAPABILITY_MAIL.to_string()],
    )
}

pub fn mailbox(id: &str, name: &str, role: Option<&str>) -> RemoteMailbox {
    RemoteMailbox {
        id: id.to_string(),
        name: name.to_string(),
        role: role.map(str::to_string),
    }
}

pub fn page(
    old_state: &str,
    new_state: &str,
    has_more: bool,
    created: Vec<RemoteMailbox>,
    updated: Vec<RemoteMailbox>,
    destroyed: &[&str],
) -> ChangesReply {
    ChangesReply::Page(ChangesPage {
        created,
        updated,
        destroyed: destroyed.iter().map(|s| s.to_string()).collect(),
        old_state: old_state.to_string(),
        new_state: new_state.to_string(),
        has_more_changes: has_more,
    })
}

/// The six-folder account used throughout the tests, at state "23"
pub fn standard_listing() -> MailboxListing {
    MailboxListing {
        mailboxes: vec![
            mailbox("id_inbox", "Inbox", Some("inbox")),
            mailbox("id_archive", "Archive", Some("archive")),
            mailbox("id_drafts", "Drafts", Some("drafts")),
            mailbox("id_sent", "Sent", Some("sent")),
            mailbox("id_trash", "Trash", Some("trash")),
            mailbox("id_folder1", "folder1", None),
        ],
        state: "23".to_string(),
    }
}

/// Mail provider answering from scripted queues
///
/// Running out of scripted replies is reported as a protocol error so that
/// an unexpected extra request fails the test.
pub struct FakeMailProvider {
    session: Mutex<Option<SyncError>>,
    listings: Mutex<VecDeque<Result<MailboxListing, SyncError>>>,
    changes: Mutex<VecDeque<Result<ChangesReply, SyncError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeMailProvider {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            listings: Mutex::new(VecDeque::new()),
            changes: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_session(&self, err: SyncError) {
        *self.session.lock().unwrap() = Some(err);
    }

    pub fn push_listing(&self, reply: Result<MailboxListing, SyncError>) {
        self.listings.lock().unwrap().push_back(reply);
    }

    pub fn push_changes(&self, reply: Result<ChangesReply, SyncError>) {
        self.changes.lock().unwrap().push_back(reply);
    }

    /// Calls made so far: "session", "get_all" or "changes:<since>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl IMailProvider for FakeMailProvider {
    async fn resolve_session(&self) -> Result<Session, SyncError> {
        self.record("session".to_string());
        match self.session.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(test_session()),
        }
    }

    async fn get_all_mailboxes(&self, _session: &Session) -> Result<MailboxListing, SyncError> {
        self.record("get_all".to_string());
        self.listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::PermanentProtocol("unexpected listing".into())))
    }

    async fn get_mailbox_changes(
        &self,
        _session: &Session,
        since: &SyncCursor,
    ) -> Result<ChangesReply, SyncError> {
        self.record(format!("changes:{since}"));
        self.changes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::PermanentProtocol("unexpected changes".into())))
    }
}

/// Folder storage backed by maps, with write failure injection
pub struct MemoryFolderStorage {
    folders: Mutex<BTreeMap<ServerId, Folder>>,
    extras: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryFolderStorage {
    pub fn new() -> Self {
        Self {
            folders: Mutex::new(BTreeMap::new()),
            extras: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful mutating calls
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> BTreeMap<ServerId, Folder> {
        self.folders.lock().unwrap().clone()
    }

    pub fn cursor(&self) -> Option<String> {
        self.extras
            .lock()
            .unwrap()
            .get(crate::ports::SYNC_CURSOR_KEY)
            .cloned()
    }

    pub fn seed(&self, folders: Vec<Folder>, cursor: Option<&str>) {
        let mut map = self.folders.lock().unwrap();
        for folder in folders {
            map.insert(folder.server_id().clone(), folder);
        }
        if let Some(cursor) = cursor {
            self.extras
                .lock()
                .unwrap()
                .insert(crate::ports::SYNC_CURSOR_KEY.to_string(), cursor.to_string());
        }
    }

    fn check_writable(&self) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait::async_trait]
impl IFolderStorage for MemoryFolderStorage {
    async fn create_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut map = self.folders.lock().unwrap();
        for folder in folders {
            map.insert(folder.server_id().clone(), folder.clone());
        }
        Ok(())
    }

    async fn update_folders(&self, folders: &[Folder]) -> anyhow::Result<()> {
        self.create_folders(folders).await
    }

    async fn delete_folders(&self, server_ids: &[ServerId]) -> anyhow::Result<()> {
        self.check_writable()?;
        let mut map = self.folders.lock().unwrap();
        for id in server_ids {
            map.remove(id);
        }
        Ok(())
    }

    async fn get_folder_server_ids(&self) -> anyhow::Result<BTreeSet<ServerId>> {
        Ok(self.folders.lock().unwrap().keys().cloned().collect())
    }

    async fn get_folder(&self, server_id: &ServerId) -> anyhow::Result<Option<Folder>> {
        Ok(self.folders.lock().unwrap().get(server_id).cloned())
    }

    async fn get_extra_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.extras.lock().unwrap().get(key).cloned())
    }

    async fn set_extra_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.check_writable()?;
        self.extras
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
