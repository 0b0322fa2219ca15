//! Starred and Recent: the two lightweight VFS side tables that track
//! user attention rather than tree structure.

use std::sync::Arc;

use drivemesh_core::domain::{CoreError, FileId, RecentEntry, StarredEntry, TrashedKind};
use drivemesh_core::ports::MetadataStore;

use crate::vfs::internal;

pub struct StarredService {
    store: Arc<dyn MetadataStore>,
}

impl StarredService {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub async fn star_file(&self, file_id: &FileId) -> Result<(), CoreError> {
        let entry = StarredEntry::new(file_id.to_string(), TrashedKind::File);
        self.store.star(&entry).await.map_err(internal)
    }

    pub async fn unstar(&self, node_id: &str) -> Result<(), CoreError> {
        self.store.unstar(node_id).await.map_err(internal)
    }

    pub async fn list(&self) -> Result<Vec<StarredEntry>, CoreError> {
        self.store.list_starred().await.map_err(internal)
    }
}

pub struct RecentService {
    store: Arc<dyn MetadataStore>,
}

impl RecentService {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Re-stamps `file_id` as most-recently-touched. Called by
    /// `VfsService::download_file`; exposed separately so other access
    /// paths (thumbnails, previews) can record a touch too.
    pub async fn touch(&self, file_id: &FileId) -> Result<(), CoreError> {
        self.store.record_recent(&RecentEntry::new(file_id.clone())).await.map_err(internal)
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<RecentEntry>, CoreError> {
        self.store.list_recent(limit).await.map_err(internal)
    }
}
