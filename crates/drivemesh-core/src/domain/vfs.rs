//! VFS domain entities: VirtualDirectory and VirtualFile
//!
//! The VFS overlays a conventional directory tree on top of Objects. A
//! VirtualFile never embeds its backing object key directly as a derived
//! path; it carries a generated `ObjectKeyId` so that renaming the file
//! (a VFS-only operation) never touches the underlying Object row.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;
use super::newtypes::VirtualPath;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectoryId(Uuid);

impl DirectoryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn root() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_nil()
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DirectoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DirectoryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid DirectoryId: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FileId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::InvalidId(format!("Invalid FileId: {e}")))
    }
}

/// A directory node in the VFS tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualDirectory {
    id: DirectoryId,
    parent_id: Option<DirectoryId>,
    name: String,
    path: VirtualPath,
    created_at: DateTime<Utc>,
}

impl VirtualDirectory {
    pub fn new_root() -> Self {
        Self {
            id: DirectoryId::root(),
            parent_id: None,
            name: String::new(),
            path: VirtualPath::root(),
            created_at: Utc::now(),
        }
    }

    pub fn new(parent_id: DirectoryId, name: impl Into<String>, path: VirtualPath) -> Self {
        Self {
            id: DirectoryId::new(),
            parent_id: Some(parent_id),
            name: name.into(),
            path,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &DirectoryId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&DirectoryId> {
        self.parent_id.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &VirtualPath {
        &self.path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Renames/moves the directory node, updating its cached path.
    pub fn relocate(&mut self, new_parent_id: DirectoryId, new_name: impl Into<String>, new_path: VirtualPath) {
        self.parent_id = Some(new_parent_id);
        self.name = new_name.into();
        self.path = new_path;
    }
}

/// A file node in the VFS tree, pointing at a backing Object by a
/// generated key rather than by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualFile {
    id: FileId,
    parent_id: DirectoryId,
    name: String,
    path: VirtualPath,
    object_bucket: String,
    object_key: String,
    size: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VirtualFile {
    pub fn new(
        parent_id: DirectoryId,
        name: impl Into<String>,
        path: VirtualPath,
        object_bucket: impl Into<String>,
        object_key: impl Into<String>,
        size: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: FileId::new(),
            parent_id,
            name: name.into(),
            path,
            object_bucket: object_bucket.into(),
            object_key: object_key.into(),
            size,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &FileId {
        &self.id
    }

    pub fn parent_id(&self) -> &DirectoryId {
        &self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &VirtualPath {
        &self.path
    }

    pub fn object_bucket(&self) -> &str {
        &self.object_bucket
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Renames/moves the file node. The backing object is untouched.
    pub fn relocate(&mut self, new_parent_id: DirectoryId, new_name: impl Into<String>, new_path: VirtualPath) {
        self.parent_id = new_parent_id;
        self.name = new_name.into();
        self.path = new_path;
        self.updated_at = Utc::now();
    }

    /// Points this file node at a different backing object, e.g. after a
    /// copy shares the underlying Object with its source.
    pub fn rebind_object(&mut self, bucket: impl Into<String>, key: impl Into<String>, size: u64) {
        self.object_bucket = bucket.into();
        self.object_key = key.into();
        self.size = size;
        self.updated_at = Utc::now();
    }
}
