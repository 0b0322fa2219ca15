//! Object domain entity and the Placement tagged union
//!
//! `Placement` replaces an overloaded nullable account-ID design: rather
//! than reading `account_id: Option<AccountId>` plus a side `is_chunked`
//! flag to figure out where an object's bytes actually live, the variant
//! itself names the storage shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{AccountId, BucketName, ObjectKey, RemoteId, RemotePath};

/// Where an Object's bytes physically live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// The whole object lives as a single item on one backend account.
    Remote {
        account_id: AccountId,
        remote_id: RemoteId,
        remote_path: RemotePath,
    },
    /// The object is split into chunks, each independently placed; see
    /// the Chunk entity for the per-chunk placement.
    Striped,
    /// The object is stored on the local filesystem rather than a backend.
    Local { relative_path: String },
}

impl Placement {
    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Placement::Remote { account_id, .. } => Some(account_id),
            Placement::Striped | Placement::Local { .. } => None,
        }
    }

    pub fn is_striped(&self) -> bool {
        matches!(self, Placement::Striped)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    bucket: BucketName,
    key: ObjectKey,
    size: u64,
    etag: String,
    mime_type: String,
    placement: Placement,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Object {
    pub fn new(
        bucket: BucketName,
        key: ObjectKey,
        size: u64,
        etag: impl Into<String>,
        mime_type: impl Into<String>,
        placement: Placement,
    ) -> Self {
        let now = Utc::now();
        Self {
            bucket,
            key,
            size,
            etag: etag.into(),
            mime_type: mime_type.into(),
            placement,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn key(&self) -> &ObjectKey {
        &self.key
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn etag(&self) -> &str {
        &self.etag
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_chunked(&self) -> bool {
        self.placement.is_striped()
    }

    /// Replaces the placement and byte size after a re-upload, bumping
    /// `updated_at` and the etag.
    pub fn replace_content(&mut self, size: u64, etag: impl Into<String>, placement: Placement) {
        self.size = size;
        self.etag = etag.into();
        self.placement = placement;
        self.updated_at = Utc::now();
    }

    /// Updates the MIME type, e.g. when a multipart upload's `complete`
    /// call supplies one the `initiate` placeholder didn't have yet.
    pub fn set_mime_type(&mut self, mime_type: impl Into<String>) {
        self.mime_type = mime_type.into();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> BucketName {
        BucketName::new("my-bucket".to_string()).unwrap()
    }

    fn key() -> ObjectKey {
        ObjectKey::new("path/to/file.bin".to_string()).unwrap()
    }

    #[test]
    fn remote_placement_exposes_account_id() {
        let placement = Placement::Remote {
            account_id: AccountId::new(),
            remote_id: RemoteId::new("r1".to_string()).unwrap(),
            remote_path: RemotePath::new("bucket/file".to_string()).unwrap(),
        };
        assert!(placement.account_id().is_some());
        assert!(!placement.is_striped());
    }

    #[test]
    fn striped_placement_has_no_single_account() {
        let placement = Placement::Striped;
        assert!(placement.account_id().is_none());
        assert!(placement.is_striped());
    }

    #[test]
    fn object_is_chunked_mirrors_placement() {
        let obj = Object::new(
            bucket(),
            key(),
            4096,
            "etag1",
            "application/octet-stream",
            Placement::Striped,
        );
        assert!(obj.is_chunked());
    }

    #[test]
    fn replace_content_bumps_updated_at() {
        let mut obj = Object::new(
            bucket(),
            key(),
            10,
            "etag1",
            "text/plain",
            Placement::Local {
                relative_path: "a/b".to_string(),
            },
        );
        let created = obj.created_at();
        obj.replace_content(
            20,
            "etag2",
            Placement::Local {
                relative_path: "a/b".to_string(),
            },
        );
        assert_eq!(obj.size(), 20);
        assert_eq!(obj.etag(), "etag2");
        assert_eq!(obj.created_at(), created);
        assert!(obj.updated_at() >= created);
    }
}
