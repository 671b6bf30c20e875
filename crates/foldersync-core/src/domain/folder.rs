//! Folder entity and folder type classification
//!
//! A [`Folder`] is the local mirror of one server mailbox. Its
//! [`FolderType`] is derived from the server-provided role through
//! [`classify`], a static lookup table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::ServerId;

/// Local folder type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderType {
    Inbox,
    Archive,
    Drafts,
    Sent,
    Trash,
    Regular,
}

/// Role string to folder type. Anything not listed is a regular folder.
const ROLE_TABLE: &[(&str, FolderType)] = &[
    ("inbox", FolderType::Inbox),
    ("archive", FolderType::Archive),
    ("drafts", FolderType::Drafts),
    ("sent", FolderType::Sent),
    ("trash", FolderType::Trash),
];

/// Maps a server-provided mailbox role to a local folder type
///
/// Total and deterministic: an unknown or absent role yields
/// [`FolderType::Regular`]. Only the role is considered, never the name.
pub fn classify(role: Option<&str>) -> FolderType {
    role.and_then(|role| {
        ROLE_TABLE
            .iter()
            .find(|(name, _)| *name == role)
            .map(|(_, folder_type)| *folder_type)
    })
    .unwrap_or(FolderType::Regular)
}

impl FolderType {
    /// Stable lowercase name used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderType::Inbox => "inbox",
            FolderType::Archive => "archive",
            FolderType::Drafts => "drafts",
            FolderType::Sent => "sent",
            FolderType::Trash => "trash",
            FolderType::Regular => "regular",
        }
    }
}

impl fmt::Display for FolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(FolderType::Regular),
            other => ROLE_TABLE
                .iter()
                .find(|(name, _)| *name == other)
                .map(|(_, folder_type)| *folder_type)
                .ok_or_else(|| DomainError::UnknownFolderType(other.to_string())),
        }
    }
}

/// Local mirror of a server mailbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    server_id: ServerId,
    name: String,
    folder_type: FolderType,
}

impl Folder {
    /// Creates a folder with an explicit type
    pub fn new(server_id: ServerId, name: impl Into<String>, folder_type: FolderType) -> Self {
        Self {
            server_id,
            name: name.into(),
            folder_type,
        }
    }

    /// Creates a folder whose type is classified from the server role
    pub fn from_role(server_id: ServerId, name: impl Into<String>, role: Option<&str>) -> Self {
        Self::new(server_id, name, classify(role))
    }

    pub fn server_id(&self) -> &ServerId {
        &self.server_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn folder_type(&self) -> FolderType {
        self.folder_type
    }
}
