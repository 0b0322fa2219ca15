//! Upload operations against the backend drive API
//!
//! - [`upload_small`] - single-request upload for small objects
//! - [`create_upload_session`] - creates a resumable upload session for large objects
//! - [`upload_chunk`] - uploads one chunk within a session
//!
//! ## API references
//!
//! - [Upload small files](https://learn.microsoft.com/en-us/graph/api/driveitem-put-content)
//! - [Upload large files](https://learn.microsoft.com/en-us/graph/api/driveitem-createuploadsession)

use anyhow::Context;
use drivemesh_core::ports::{BackendError, ByteRange, RemoteItem};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::client::GraphClient;

/// Response from the DriveItem endpoints that matter for upload bookkeeping.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDriveItem {
    id: String,
    size: Option<u64>,
    #[serde(default)]
    e_tag: Option<String>,
    parent_reference: Option<ParentReference>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentReference {
    #[allow(dead_code)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadSessionResponse {
    upload_url: String,
}

fn drive_item_to_remote_item(item: GraphDriveItem, remote_path: String) -> RemoteItem {
    RemoteItem {
        remote_id: item.id,
        remote_path,
        size: item.size.unwrap_or(0),
        etag: item.e_tag.unwrap_or_default(),
    }
}

fn classify_error(err: anyhow::Error) -> BackendError {
    BackendError::Backend(err.to_string())
}

/// Builds the item-by-path API path: `/me/drive/root:{remote_path}:/{suffix}`.
fn build_item_path(remote_path: &str, suffix: &str) -> String {
    if remote_path == "/" {
        format!("/me/drive/root:/{suffix}")
    } else {
        format!("/me/drive/root:{remote_path}:/{suffix}")
    }
}

/// Uploads content small enough for a single request.
pub async fn upload_small(
    client: &GraphClient,
    remote_path: &str,
    content: Vec<u8>,
) -> Result<RemoteItem, BackendError> {
    let path = build_item_path(remote_path, "content");
    debug!(remote_path, len = content.len(), "uploading small object");

    let response = client
        .request(Method::PUT, &path)
        .header("Content-Type", "application/octet-stream")
        .body(content)
        .send()
        .await
        .map_err(|e| BackendError::Transient(e.to_string()))?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(BackendError::AuthExpired);
    }
    if response.status() == reqwest::StatusCode::INSUFFICIENT_STORAGE {
        return Err(BackendError::BackendFull);
    }

    let item: GraphDriveItem = response
        .error_for_status()
        .context("small upload returned error status")
        .map_err(classify_error)?
        .json()
        .await
        .context("failed to parse upload response")
        .map_err(classify_error)?;

    Ok(drive_item_to_remote_item(item, remote_path.to_string()))
}

/// Creates a resumable upload session and returns its upload URL.
pub async fn create_upload_session(
    client: &GraphClient,
    remote_path: &str,
    _total_size: u64,
) -> Result<String, BackendError> {
    let path = build_item_path(remote_path, "createUploadSession");
    debug!(remote_path, "creating upload session");

    let response: UploadSessionResponse = client
        .request(Method::POST, &path)
        .header("Content-Type", "application/json")
        .body("{}")
        .send()
        .await
        .map_err(|e| BackendError::Transient(e.to_string()))?
        .error_for_status()
        .context("create upload session returned error status")
        .map_err(classify_error)?
        .json()
        .await
        .context("failed to parse upload session response")
        .map_err(classify_error)?;

    Ok(response.upload_url)
}

/// Uploads one aligned chunk of a resumable session.
///
/// Returns `Some(RemoteItem)` once the final chunk completes the upload,
/// `None` for intermediate chunks accepted with HTTP 202.
pub async fn upload_chunk(
    client: &GraphClient,
    upload_url: &str,
    range: ByteRange,
    total_size: u64,
    content: Vec<u8>,
) -> Result<Option<RemoteItem>, BackendError> {
    let chunk_len = content.len() as u64;
    let content_range = format!("bytes {}-{}/{}", range.start, range.end, total_size);
    debug!(content_range, "uploading chunk");

    let http_client = client.http_client();
    let response = http_client
        .put(upload_url)
        .bearer_auth(client.access_token())
        .header("Content-Length", chunk_len.to_string())
        .header("Content-Range", &content_range)
        .body(content)
        .send()
        .await
        .map_err(|e| BackendError::Transient(e.to_string()))?;

    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::Backend(format!(
            "chunk upload failed with status {status}: {body}"
        )));
    }

    if status == reqwest::StatusCode::OK || status == reqwest::StatusCode::CREATED {
        let item: GraphDriveItem = response
            .json()
            .await
            .context("failed to parse final chunk response")
            .map_err(classify_error)?;
        Ok(Some(drive_item_to_remote_item(item, String::new())))
    } else {
        Ok(None)
    }
}
