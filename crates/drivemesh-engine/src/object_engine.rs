//! Object Engine: places, fetches, and removes object bytes.
//!
//! Small objects go to one backend account in a single request; objects
//! over the chunk threshold are striped across independently-selected
//! accounts, each chunk uploaded and recorded separately. Grounded on the
//! teacher's `engine.rs` retry/error-classification shape, replacing its
//! bidirectional delta-sync loop with a stateless upload/download/delete
//! contract.

use std::path::PathBuf;
use std::sync::Arc;

use drivemesh_core::domain::newtypes::{AccountId, BucketName, ObjectKey, RemoteId, RemotePath};
use drivemesh_core::domain::object::{Object, Placement};
use drivemesh_core::domain::{Chunk, CoreError};
use drivemesh_core::ports::{BackendClient, BackendError, MetadataStore};
use drivemesh_core::usecases::AccountRegistry;
use drivemesh_balancer::LoadBalancer;
use tracing::{info, warn};

use crate::chunk_reader::ChunkReader;
use crate::seekable::{BufferedBody, SeekableRead};

/// A page of a bucket listing.
pub struct ObjectPage {
    pub objects: Vec<Object>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

pub struct ObjectEngine {
    store: Arc<dyn MetadataStore>,
    backend: Arc<dyn BackendClient>,
    registry: Arc<AccountRegistry>,
    balancer: Arc<LoadBalancer>,
    chunk_threshold: u64,
    chunk_size: u64,
    local_root: Option<PathBuf>,
}

impl ObjectEngine {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        backend: Arc<dyn BackendClient>,
        registry: Arc<AccountRegistry>,
        balancer: Arc<LoadBalancer>,
        chunk_threshold: u64,
        chunk_size: u64,
        local_root: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            backend,
            registry,
            balancer,
            chunk_threshold,
            chunk_size,
            local_root,
        }
    }

    pub async fn upload(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<Object, CoreError> {
        self.store
            .get_bucket(bucket)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::BucketNotFound(bucket.to_string()))?;

        let size = content.len() as u64;
        let object = if size <= self.chunk_threshold {
            self.upload_small(bucket, key, content, mime_type).await?
        } else {
            self.upload_striped(bucket, key, content, mime_type).await?
        };

        self.store.put_object(&object).await.map_err(internal)?;
        self.bump_bucket_stats(bucket, size as i64, 1).await?;

        Ok(object)
    }

    async fn upload_small(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<Object, CoreError> {
        let etag = format!("{:x}", md5::compute(&content));
        let remote_path = format!("{bucket}/{key}");
        let size = content.len() as u64;

        match self.place_on_backend(&remote_path, content.clone(), size).await {
            Ok((account_id, item)) => {
                let placement = Placement::Remote {
                    account_id,
                    remote_id: RemoteId::new(item.remote_id).map_err(CoreError::Domain)?,
                    remote_path: RemotePath::new(remote_path).map_err(CoreError::Domain)?,
                };
                Ok(Object::new(bucket.clone(), key.clone(), size, etag, mime_type, placement))
            }
            Err(err) if self.local_root.is_some() => {
                warn!(error = %err, "backend upload failed, falling back to local storage");
                let relative_path = format!("{bucket}/{key}");
                self.write_local(&relative_path, &content).await?;
                Ok(Object::new(
                    bucket.clone(),
                    key.clone(),
                    size,
                    etag,
                    mime_type,
                    Placement::Local { relative_path },
                ))
            }
            Err(err) => Err(err),
        }
    }

    async fn upload_striped(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        content: Vec<u8>,
        mime_type: &str,
    ) -> Result<Object, CoreError> {
        let total_size = content.len() as u64;
        let mut index = 0u32;

        for part in content.chunks(self.chunk_size as usize) {
            let remote_path = format!("{bucket}/{key}_part{index}");
            let (account_id, item) = self.place_on_backend(&remote_path, part.to_vec(), part.len() as u64).await?;

            let mut chunk = Chunk::new(
                bucket.clone(),
                key.clone(),
                index,
                Placement::Remote {
                    account_id,
                    remote_id: RemoteId::new(item.remote_id).map_err(CoreError::Domain)?,
                    remote_path: RemotePath::new(remote_path).map_err(CoreError::Domain)?,
                },
                part.len() as u64,
            );
            chunk.mark_uploaded();
            self.store.put_chunk(&chunk).await.map_err(internal)?;

            index += 1;
        }

        Ok(Object::new(
            bucket.clone(),
            key.clone(),
            total_size,
            String::new(),
            mime_type,
            Placement::Striped,
        ))
    }

    /// Selects a backend account via the Load Balancer, ensures its token
    /// is fresh, and uploads `content` to it. Returns the account that was
    /// used alongside the resulting remote item.
    async fn place_on_backend(
        &self,
        remote_path: &str,
        content: Vec<u8>,
        size: u64,
    ) -> Result<(AccountId, drivemesh_core::ports::RemoteItem), CoreError> {
        let candidates = self.registry.active_accounts().await.map_err(internal)?;
        let candidates: Vec<_> = candidates.into_iter().filter(|a| a.free_space() >= size).collect();

        let chosen = self.balancer.select(&candidates).map_err(|_| CoreError::NoBackend)?;
        let account_id = *chosen.id();

        let account = self.registry.ensure_valid(&account_id).await?;
        let token = account.access_token().ok_or(CoreError::AuthExpired(account_id.to_string()))?;

        let item = self
            .backend
            .upload_small(token, remote_path, content)
            .await
            .map_err(|e| classify_backend_error(e, &account_id))?;

        Ok((account_id, item))
    }

    async fn write_local(&self, relative_path: &str, content: &[u8]) -> Result<(), CoreError> {
        let root = self.local_root.as_ref().expect("checked by caller");
        let path = root.join(relative_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| CoreError::Internal(e.to_string()))?;
        }
        tokio::fs::write(&path, content).await.map_err(|e| CoreError::Internal(e.to_string()))
    }

    pub async fn download(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> Result<(Object, Box<dyn SeekableRead>), CoreError> {
        let object = self
            .store
            .get_object(bucket, key)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        let reader: Box<dyn SeekableRead> = match object.placement() {
            Placement::Remote { account_id, remote_id, .. } => {
                let account = self.registry.ensure_valid(account_id).await?;
                let token = account.access_token().ok_or(CoreError::AuthExpired(account_id.to_string()))?;
                let bytes = self
                    .backend
                    .download(token, remote_id.as_str(), None)
                    .await
                    .map_err(|e| classify_backend_error(e, account_id))?;
                Box::new(BufferedBody::new(bytes))
            }
            Placement::Striped => {
                let chunks = self.store.list_chunks(bucket, key).await.map_err(internal)?;
                Box::new(ChunkReader::new(self.backend.clone(), self.registry.clone(), chunks))
            }
            Placement::Local { relative_path } => {
                let root = self.local_root.as_ref().ok_or_else(|| {
                    CoreError::Internal("object placed locally but no local fallback is configured".into())
                })?;
                let bytes = tokio::fs::read(root.join(relative_path))
                    .await
                    .map_err(|e| CoreError::Internal(e.to_string()))?;
                Box::new(BufferedBody::new(bytes))
            }
        };

        Ok((object, reader))
    }

    pub async fn delete(&self, bucket: &BucketName, key: &ObjectKey) -> Result<(), CoreError> {
        let object = self
            .store
            .get_object(bucket, key)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;

        match object.placement() {
            Placement::Remote { account_id, remote_id, .. } => {
                self.best_effort_delete(account_id, remote_id.as_str()).await;
            }
            Placement::Striped => {
                let chunks = self.store.list_chunks(bucket, key).await.map_err(internal)?;
                for chunk in &chunks {
                    if let Placement::Remote { account_id, remote_id, .. } = chunk.placement() {
                        self.best_effort_delete(account_id, remote_id.as_str()).await;
                    }
                }
                self.store.delete_chunks(bucket, key).await.map_err(internal)?;
            }
            Placement::Local { relative_path } => {
                if let Some(root) = &self.local_root {
                    let _ = tokio::fs::remove_file(root.join(relative_path)).await;
                }
            }
        }

        self.store.delete_object(bucket, key).await.map_err(internal)?;
        self.bump_bucket_stats(bucket, -(object.size() as i64), -1).await?;
        Ok(())
    }

    /// Deletes one remote blob, logging (not propagating) any failure —
    /// the metadata row is the authority on deletion; Audit reconciles
    /// drift left behind by a failed backend delete.
    async fn best_effort_delete(&self, account_id: &AccountId, remote_id: &str) {
        let account = match self.registry.ensure_valid(account_id).await {
            Ok(a) => a,
            Err(e) => {
                warn!(error = %e, %account_id, "could not refresh token for blob delete");
                return;
            }
        };
        let Some(token) = account.access_token() else {
            warn!(%account_id, "account has no access token for blob delete");
            return;
        };
        if let Err(e) = self.backend.delete(token, remote_id).await {
            warn!(error = %e, %account_id, remote_id, "remote blob delete failed, leaving for audit");
        } else {
            info!(%account_id, remote_id, "remote blob deleted");
        }
    }

    pub async fn list(
        &self,
        bucket: &BucketName,
        prefix: Option<&str>,
        marker: Option<&str>,
        max_keys: u32,
    ) -> Result<ObjectPage, CoreError> {
        let max_keys = max_keys.min(1000).max(1);
        let mut objects = self.store.list_objects(bucket, prefix).await.map_err(internal)?;
        objects.sort_by(|a, b| a.key().as_str().cmp(b.key().as_str()));

        if let Some(marker) = marker {
            objects.retain(|o| o.key().as_str() > marker);
        }

        let fetch = max_keys as usize + 1;
        let mut page: Vec<_> = objects.into_iter().take(fetch).collect();
        let is_truncated = page.len() > max_keys as usize;
        if is_truncated {
            page.truncate(max_keys as usize);
        }
        let next_marker = if is_truncated {
            page.last().map(|o| o.key().to_string())
        } else {
            None
        };

        Ok(ObjectPage { objects: page, is_truncated, next_marker })
    }

    async fn bump_bucket_stats(&self, bucket: &BucketName, size_delta: i64, count_delta: i64) -> Result<(), CoreError> {
        let mut row = self
            .store
            .get_bucket(bucket)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::BucketNotFound(bucket.to_string()))?;

        if count_delta > 0 {
            row.record_object_added(size_delta.unsigned_abs());
        } else if count_delta < 0 {
            row.record_object_removed(size_delta.unsigned_abs());
        }

        self.store.update_bucket(&row).await.map_err(internal)
    }
}

fn internal(err: anyhow::Error) -> CoreError {
    CoreError::Internal(err.to_string())
}

fn classify_backend_error(err: BackendError, account_id: &AccountId) -> CoreError {
    match err {
        BackendError::AuthExpired => CoreError::AuthExpired(account_id.to_string()),
        BackendError::BackendFull => CoreError::StorageFull(0),
        BackendError::NotFound(id) => CoreError::Upstream(format!("remote item not found: {id}")),
        BackendError::Transient(msg) | BackendError::Backend(msg) => CoreError::Upstream(msg),
    }
}
