//! Trash: the soft-delete counterpart to [`crate::vfs::VfsService::delete_file`].
//!
//! A trashed node's row is left in place; a [`TrashEntry`] records that
//! it's hidden and carries enough of its original location to restore it.
//! Callers that want trash-aware listings are expected to cross-reference
//! [`TrashService::trashed_node_ids`] themselves — the VFS tree and the
//! trash side table are queried independently, same as the rest of the
//! metadata store's side tables (starred, recent).

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use drivemesh_core::domain::newtypes::{BucketName, ObjectKey};
use drivemesh_core::domain::{CoreError, DirectoryId, FileId, TrashEntry, TrashedKind};
use drivemesh_core::ports::MetadataStore;
use drivemesh_engine::ObjectEngine;

use crate::vfs::internal;

pub struct TrashService {
    store: Arc<dyn MetadataStore>,
    engine: Arc<ObjectEngine>,
}

impl TrashService {
    pub fn new(store: Arc<dyn MetadataStore>, engine: Arc<ObjectEngine>) -> Self {
        Self { store, engine }
    }

    pub async fn trash_file(&self, file_id: &FileId) -> Result<(), CoreError> {
        let file = self
            .store
            .get_file(file_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(file_id.to_string()))?;
        let entry = TrashEntry::new(file.id().to_string(), TrashedKind::File, file.parent_id().clone(), file.name());
        self.store.trash(&entry).await.map_err(internal)
    }

    pub async fn trash_directory(&self, dir_id: &DirectoryId) -> Result<(), CoreError> {
        let dir = self
            .store
            .get_directory(dir_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::PathNotFound(dir_id.to_string()))?;
        let parent_id = dir.parent_id().cloned().unwrap_or_else(DirectoryId::root);
        let entry = TrashEntry::new(dir.id().to_string(), TrashedKind::Directory, parent_id, dir.name());
        self.store.trash(&entry).await.map_err(internal)
    }

    /// Un-hides a node: the row was never touched, so this is just
    /// dropping its trash entry.
    pub async fn restore(&self, node_id: &str) -> Result<(), CoreError> {
        self.store.remove_from_trash(node_id).await.map_err(internal)
    }

    pub async fn list(&self) -> Result<Vec<TrashEntry>, CoreError> {
        self.store.list_trash().await.map_err(internal)
    }

    pub async fn trashed_node_ids(&self) -> Result<HashSet<String>, CoreError> {
        Ok(self.list().await?.into_iter().map(|e| e.node_id().to_string()).collect())
    }

    /// Permanently removes one trash entry and the node it guards: the
    /// blob (for a file) and the metadata row.
    async fn purge_entry(&self, entry: &TrashEntry) -> Result<(), CoreError> {
        match entry.kind() {
            TrashedKind::File => {
                let file_id = FileId::from_str(entry.node_id()).map_err(CoreError::Domain)?;
                if let Some(file) = self.store.get_file(&file_id).await.map_err(internal)? {
                    let bucket = BucketName::new(file.object_bucket().to_string()).map_err(CoreError::Domain)?;
                    let key = ObjectKey::new(file.object_key().to_string()).map_err(CoreError::Domain)?;
                    if let Err(err) = self.engine.delete(&bucket, &key).await {
                        warn!(file = %entry.node_id(), error = %err, "best-effort blob delete failed during trash purge");
                    }
                    self.store.delete_file(&file_id).await.map_err(internal)?;
                }
            }
            TrashedKind::Directory => {
                let dir_id = DirectoryId::from_str(entry.node_id()).map_err(CoreError::Domain)?;
                self.store.delete_directory(&dir_id).await.map_err(internal)?;
            }
        }
        self.store.remove_from_trash(entry.node_id()).await.map_err(internal)
    }

    pub async fn purge(&self, node_id: &str) -> Result<(), CoreError> {
        let entry = self
            .list()
            .await?
            .into_iter()
            .find(|e| e.node_id() == node_id)
            .ok_or_else(|| CoreError::PathNotFound(node_id.to_string()))?;
        self.purge_entry(&entry).await
    }

    /// Purges every entry past its retention window. Meant to run on a
    /// periodic timer; returns how many entries were purged.
    pub async fn sweep(&self) -> Result<usize, CoreError> {
        let now = Utc::now();
        let expired: Vec<_> = self.list().await?.into_iter().filter(|e| e.is_expired(now)).collect();
        let count = expired.len();
        for entry in &expired {
            self.purge_entry(entry).await?;
        }
        if count > 0 {
            info!(count, "trash sweep purged expired entries");
        }
        Ok(count)
    }
}
