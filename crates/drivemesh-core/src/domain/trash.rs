//! Starred, Trash, and Recent side tables for the VFS
//!
//! These are thin index tables over `VirtualFile`/`VirtualDirectory`
//! rows: Starred and Recent just reference a node, while Trash snapshots
//! enough of the node to restore it and enforces a 30-day expiry.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::vfs::{DirectoryId, FileId};

/// Number of days a trashed entry is retained before being eligible for
/// permanent removal by the sweep.
pub const TRASH_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrashedKind {
    File,
    Directory,
}

/// A trashed VFS node, identified by its original ID plus enough of its
/// original location to restore it in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    node_id: String,
    kind: TrashedKind,
    original_parent_id: DirectoryId,
    original_name: String,
    trashed_at: DateTime<Utc>,
}

impl TrashEntry {
    pub fn new(
        node_id: impl Into<String>,
        kind: TrashedKind,
        original_parent_id: DirectoryId,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            original_parent_id,
            original_name: original_name.into(),
            trashed_at: Utc::now(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn kind(&self) -> TrashedKind {
        self.kind
    }

    pub fn original_parent_id(&self) -> &DirectoryId {
        &self.original_parent_id
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn trashed_at(&self) -> DateTime<Utc> {
        self.trashed_at
    }

    /// The instant at which this entry becomes eligible for the sweep.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.trashed_at + Duration::days(TRASH_RETENTION_DAYS)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// A starred VFS node reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarredEntry {
    node_id: String,
    kind: TrashedKind,
    starred_at: DateTime<Utc>,
}

impl StarredEntry {
    pub fn new(node_id: impl Into<String>, kind: TrashedKind) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            starred_at: Utc::now(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn kind(&self) -> TrashedKind {
        self.kind
    }

    pub fn starred_at(&self) -> DateTime<Utc> {
        self.starred_at
    }
}

/// A recently-touched file reference, keyed by FileId for fast "recent
/// files" listing without scanning the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    file_id: FileId,
    accessed_at: DateTime<Utc>,
}

impl RecentEntry {
    pub fn new(file_id: FileId) -> Self {
        Self {
            file_id,
            accessed_at: Utc::now(),
        }
    }

    pub fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn accessed_at(&self) -> DateTime<Utc> {
        self.accessed_at
    }

    pub fn touch(&mut self) {
        self.accessed_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trash_entry_expires_after_retention_window() {
        let entry = TrashEntry::new("id1", TrashedKind::File, DirectoryId::root(), "a.txt");
        assert!(!entry.is_expired(Utc::now()));
        assert!(entry.is_expired(Utc::now() + Duration::days(TRASH_RETENTION_DAYS + 1)));
    }

    #[test]
    fn recent_entry_touch_bumps_timestamp() {
        let mut entry = RecentEntry::new(FileId::new());
        let before = entry.accessed_at();
        std::thread::sleep(std::time::Duration::from_millis(1));
        entry.touch();
        assert!(entry.accessed_at() >= before);
    }
}
