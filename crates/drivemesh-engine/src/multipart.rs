//! Multipart Session: client-driven chunked upload state.
//!
//! `initiate` creates a placeholder `Object` with `Placement::Striped`
//! before any bytes have been uploaded; `upload_part` writes one chunk
//! through the same per-chunk backend-selection path the Object Engine
//! uses for its own striped uploads. Concurrent `upload_part` calls for
//! the same `(upload_id, N)` are left undefined by design: this
//! implementation overwrites the existing chunk row, so callers SHOULD
//! still serialize per upload as documented.

use std::sync::Arc;

use drivemesh_core::domain::newtypes::{BucketName, ObjectKey, RemoteId, RemotePath};
use drivemesh_core::domain::object::{Object, Placement};
use drivemesh_core::domain::{Chunk, CoreError};
use drivemesh_core::ports::{BackendClient, MetadataStore};
use drivemesh_core::usecases::AccountRegistry;
use drivemesh_balancer::LoadBalancer;

/// An opaque multipart upload handle. The (bucket, key) pair doubles as
/// the upload ID, since a bucket only ever has one in-flight multipart
/// upload per key at a time.
#[derive(Debug, Clone)]
pub struct UploadId {
    pub bucket: BucketName,
    pub key: ObjectKey,
}

pub struct MultipartSession {
    store: Arc<dyn MetadataStore>,
    backend: Arc<dyn BackendClient>,
    registry: Arc<AccountRegistry>,
    balancer: Arc<LoadBalancer>,
}

impl MultipartSession {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        backend: Arc<dyn BackendClient>,
        registry: Arc<AccountRegistry>,
        balancer: Arc<LoadBalancer>,
    ) -> Self {
        Self { store, backend, registry, balancer }
    }

    pub async fn initiate(&self, bucket: &BucketName, key: &ObjectKey, mime_type: &str) -> Result<UploadId, CoreError> {
        self.store
            .get_bucket(bucket)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::BucketNotFound(bucket.to_string()))?;

        if self.store.get_object(bucket, key).await.map_err(internal)?.is_some() {
            return Err(CoreError::ObjectExists { bucket: bucket.to_string(), key: key.to_string() });
        }

        let placeholder = Object::new(bucket.clone(), key.clone(), 0, String::new(), mime_type, Placement::Striped);
        self.store.put_object(&placeholder).await.map_err(internal)?;

        let mut row = self
            .store
            .get_bucket(bucket)
            .await
            .map_err(internal)?
            .expect("checked above");
        row.record_object_added(0);
        self.store.update_bucket(&row).await.map_err(internal)?;

        Ok(UploadId { bucket: bucket.clone(), key: key.clone() })
    }

    pub async fn upload_part(&self, upload: &UploadId, part_number: u32, bytes: Vec<u8>) -> Result<(), CoreError> {
        let candidates = self.registry.active_accounts().await.map_err(internal)?;
        let candidates: Vec<_> = candidates
            .into_iter()
            .filter(|a| a.free_space() >= bytes.len() as u64)
            .collect();
        let chosen = self.balancer.select(&candidates).map_err(|_| CoreError::NoBackend)?;
        let account_id = *chosen.id();

        let account = self.registry.ensure_valid(&account_id).await?;
        let token = account.access_token().ok_or(CoreError::AuthExpired(account_id.to_string()))?;

        let remote_path = format!("{}/{}_part{part_number}", upload.bucket, upload.key);
        let item = self
            .backend
            .upload_small(token, &remote_path, bytes.clone())
            .await
            .map_err(|e| CoreError::Upstream(e.to_string()))?;

        let mut chunk = Chunk::new(
            upload.bucket.clone(),
            upload.key.clone(),
            part_number,
            Placement::Remote {
                account_id,
                remote_id: RemoteId::new(item.remote_id).map_err(CoreError::Domain)?,
                remote_path: RemotePath::new(remote_path).map_err(CoreError::Domain)?,
            },
            bytes.len() as u64,
        );
        chunk.mark_uploaded();
        self.store.put_chunk(&chunk).await.map_err(internal)
    }

    pub async fn list_parts(&self, upload: &UploadId) -> Result<Vec<Chunk>, CoreError> {
        let mut chunks = self
            .store
            .list_chunks(&upload.bucket, &upload.key)
            .await
            .map_err(internal)?;
        chunks.sort_by_key(|c| c.chunk_index());
        Ok(chunks)
    }

    pub async fn complete(&self, upload: &UploadId, total_size: u64, mime_type: &str) -> Result<Object, CoreError> {
        let mut object = self
            .store
            .get_object(&upload.bucket, &upload.key)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::ObjectNotFound {
                bucket: upload.bucket.to_string(),
                key: upload.key.to_string(),
            })?;

        object.replace_content(total_size, String::new(), Placement::Striped);
        object.set_mime_type(mime_type);
        self.store.put_object(&object).await.map_err(internal)?;

        let mut row = self
            .store
            .get_bucket(&upload.bucket)
            .await
            .map_err(internal)?
            .ok_or_else(|| CoreError::BucketNotFound(upload.bucket.to_string()))?;
        row.record_object_added(total_size);
        self.store.update_bucket(&row).await.map_err(internal)?;

        Ok(object)
    }

    pub async fn abort(&self, upload: &UploadId) -> Result<(), CoreError> {
        let chunks = self.store.list_chunks(&upload.bucket, &upload.key).await.map_err(internal)?;
        for chunk in &chunks {
            if let Placement::Remote { account_id, remote_id, .. } = chunk.placement() {
                if let Ok(account) = self.registry.ensure_valid(account_id).await {
                    if let Some(token) = account.access_token() {
                        let _ = self.backend.delete(token, remote_id.as_str()).await;
                    }
                }
            }
        }
        self.store.delete_chunks(&upload.bucket, &upload.key).await.map_err(internal)?;
        self.store.delete_object(&upload.bucket, &upload.key).await.map_err(internal)?;

        if let Some(mut row) = self.store.get_bucket(&upload.bucket).await.map_err(internal)? {
            row.record_object_removed(0);
            self.store.update_bucket(&row).await.map_err(internal)?;
        }
        Ok(())
    }
}

fn internal(err: anyhow::Error) -> CoreError {
    CoreError::Internal(err.to_string())
}
