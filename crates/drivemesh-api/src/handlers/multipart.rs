//! Multipart Session HTTP surface, nested under the bucket. The object
//! key can itself contain slashes, so every sub-action takes it as a
//! `key` query parameter rather than a path segment — axum's catch-all
//! path segments must be the last thing in a route, which rules out
//! `.../multipart/*key/parts`-style nesting.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::{BucketName, Chunk, CoreError, ObjectKey};
use drivemesh_engine::UploadId;

use crate::error::ApiResult;
use crate::handlers::objects::ObjectView;
use crate::state::ApiState;

#[derive(Deserialize)]
pub struct InitiateRequest {
    key: String,
    #[serde(default = "default_mime")]
    mime_type: String,
}

fn default_mime() -> String {
    "application/octet-stream".to_string()
}

#[derive(Serialize)]
pub struct UploadIdView {
    pub bucket: String,
    pub key: String,
}

impl From<&UploadId> for UploadIdView {
    fn from(id: &UploadId) -> Self {
        Self {
            bucket: id.bucket.to_string(),
            key: id.key.to_string(),
        }
    }
}

fn upload_id(bucket: String, key: String) -> ApiResult<UploadId> {
    Ok(UploadId {
        bucket: BucketName::new(bucket).map_err(CoreError::from)?,
        key: ObjectKey::new(key).map_err(CoreError::from)?,
    })
}

pub async fn initiate(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Json(req): Json<InitiateRequest>,
) -> ApiResult<(StatusCode, Json<UploadIdView>)> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let key = ObjectKey::new(req.key).map_err(CoreError::from)?;
    let upload = state.multipart.initiate(&bucket, &key, &req.mime_type).await?;
    Ok((StatusCode::CREATED, Json(UploadIdView::from(&upload))))
}

#[derive(Deserialize)]
pub struct PartQuery {
    key: String,
    #[serde(rename = "partNumber")]
    part_number: u32,
}

pub async fn upload_part(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Query(query): Query<PartQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let upload = upload_id(bucket, query.key)?;
    state.multipart.upload_part(&upload, query.part_number, body.to_vec()).await?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
pub struct KeyQuery {
    key: String,
}

#[derive(Serialize)]
pub struct ChunkView {
    pub part_number: u32,
    pub length: u64,
}

impl From<Chunk> for ChunkView {
    fn from(c: Chunk) -> Self {
        Self {
            part_number: c.chunk_index(),
            length: c.length(),
        }
    }
}

pub async fn list_parts(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Json<Vec<ChunkView>>> {
    let upload = upload_id(bucket, query.key)?;
    let parts = state.multipart.list_parts(&upload).await?;
    Ok(Json(parts.into_iter().map(ChunkView::from).collect()))
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    total_size: u64,
    #[serde(default = "default_mime")]
    mime_type: String,
}

pub async fn complete(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Query(query): Query<KeyQuery>,
    Json(req): Json<CompleteRequest>,
) -> ApiResult<Json<ObjectView>> {
    let upload = upload_id(bucket, query.key)?;
    let object = state.multipart.complete(&upload, req.total_size, &req.mime_type).await?;
    Ok(Json(object.into()))
}

pub async fn abort(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<StatusCode> {
    let upload = upload_id(bucket, query.key)?;
    state.multipart.abort(&upload).await?;
    Ok(StatusCode::NO_CONTENT)
}
