//! GraphBackendClient - BackendClient implementation for the drive API
//!
//! Wraps [`GraphClient`] and delegates to the `upload` module to fulfil the
//! [`BackendClient`] port contract.
//!
//! ## Design notes
//!
//! - Uses `tokio::sync::Mutex` because `BackendClient` methods take `&self`
//!   while `GraphClient::set_access_token` requires `&mut self` (a fresh
//!   token is swapped in per call since the Account Registry, not this
//!   client, owns token lifecycle).
//! - Authentication (`authorization_url`, `exchange_code`, `refresh`) is
//!   handled separately by [`crate::auth::GraphAuthFlow`]; this client only
//!   performs authenticated drive operations.

use anyhow::Context;
use async_trait::async_trait;
use drivemesh_core::ports::{
    BackendClient, BackendError, ByteRange, DriveInfo, RemoteItem,
};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::client::GraphClient;
use crate::upload;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphMetadataItem {
    id: String,
    #[serde(default)]
    e_tag: Option<String>,
    size: Option<u64>,
}

fn classify_error(err: anyhow::Error) -> BackendError {
    BackendError::Backend(err.to_string())
}

/// Backend client implementation that delegates to a drive's Graph-style API.
pub struct GraphBackendClient {
    client: Mutex<GraphClient>,
}

impl GraphBackendClient {
    pub fn new(client: GraphClient) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    async fn with_token<'a>(&'a self, access_token: &str) -> tokio::sync::MutexGuard<'a, GraphClient> {
        let mut client = self.client.lock().await;
        client.set_access_token(access_token);
        client
    }
}

#[async_trait]
impl BackendClient for GraphBackendClient {
    async fn upload_small(
        &self,
        access_token: &str,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<RemoteItem, BackendError> {
        let client = self.with_token(access_token).await;
        debug!(remote_path, len = content.len(), "BackendClient::upload_small");
        upload::upload_small(&client, remote_path, content).await
    }

    async fn create_upload_session(
        &self,
        access_token: &str,
        remote_path: &str,
        total_size: u64,
    ) -> Result<String, BackendError> {
        let client = self.with_token(access_token).await;
        debug!(remote_path, total_size, "BackendClient::create_upload_session");
        upload::create_upload_session(&client, remote_path, total_size).await
    }

    async fn upload_session_part(
        &self,
        upload_url: &str,
        range: ByteRange,
        total_size: u64,
        content: Vec<u8>,
    ) -> Result<Option<RemoteItem>, BackendError> {
        // Chunk uploads hit an absolute, pre-signed session URL, not the base
        // API, so any access token already attached to the client is unused
        // here; the client is only a vehicle for the shared reqwest client.
        let client = self.client.lock().await;
        upload::upload_chunk(&client, upload_url, range, total_size, content).await
    }

    async fn download(
        &self,
        access_token: &str,
        remote_id: &str,
        range: Option<ByteRange>,
    ) -> Result<Vec<u8>, BackendError> {
        let client = self.with_token(access_token).await;
        debug!(remote_id, "BackendClient::download");
        client
            .download_file(remote_id, range.map(|r| (r.start, r.end)))
            .await
            .map_err(classify_error)
    }

    async fn delete(&self, access_token: &str, remote_id: &str) -> Result<(), BackendError> {
        let client = self.with_token(access_token).await;
        let path = format!("/me/drive/items/{remote_id}");
        debug!(remote_id, "BackendClient::delete");

        client
            .request(Method::DELETE, &path)
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?
            .error_for_status()
            .context("delete request returned error status")
            .map_err(classify_error)?;

        Ok(())
    }

    async fn get_item(&self, access_token: &str, remote_id: &str) -> Result<RemoteItem, BackendError> {
        let client = self.with_token(access_token).await;
        let path = format!("/me/drive/items/{remote_id}");
        debug!(remote_id, "BackendClient::get_item");

        let response = client
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(remote_id.to_string()));
        }

        let item: GraphMetadataItem = response
            .error_for_status()
            .context("metadata request returned error status")
            .map_err(classify_error)?
            .json()
            .await
            .context("failed to parse metadata response")
            .map_err(classify_error)?;

        Ok(RemoteItem {
            remote_id: item.id,
            remote_path: String::new(),
            size: item.size.unwrap_or(0),
            etag: item.e_tag.unwrap_or_default(),
        })
    }

    async fn get_thumbnail(&self, access_token: &str, remote_id: &str) -> Result<Vec<u8>, BackendError> {
        let client = self.with_token(access_token).await;
        let path = format!("/me/drive/items/{remote_id}/thumbnails/0/medium/content");
        debug!(remote_id, "BackendClient::get_thumbnail");

        let response = client
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|e| BackendError::Transient(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(BackendError::NotFound(remote_id.to_string()));
        }

        let bytes = response
            .error_for_status()
            .context("thumbnail request returned error status")
            .map_err(classify_error)?
            .bytes()
            .await
            .context("failed to read thumbnail body")
            .map_err(classify_error)?;

        Ok(bytes.to_vec())
    }

    async fn get_drive(&self, access_token: &str) -> Result<DriveInfo, BackendError> {
        let client = self.with_token(access_token).await;
        debug!("BackendClient::get_drive");
        let (used_space, total_space) = client.get_drive_quota().await.map_err(classify_error)?;
        Ok(DriveInfo { total_space, used_space })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_backend_client_creation() {
        let client = GraphClient::new("test-token");
        let _backend = GraphBackendClient::new(client);
    }

    #[test]
    fn metadata_item_deserializes_minimal_fields() {
        let json = r#"{"id": "FILE001", "eTag": "\"v1\"", "size": 1024}"#;
        let item: GraphMetadataItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, "FILE001");
        assert_eq!(item.size, Some(1024));
    }
}
