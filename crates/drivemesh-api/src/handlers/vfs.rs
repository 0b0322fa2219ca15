//! VFS HTTP surface: the hierarchical path overlay, directory creation,
//! move/copy (inline for files, task-backed for directories), and
//! thumbnails.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::object::Placement;
use drivemesh_core::domain::{BucketName, CoreError, ObjectKey, VirtualPath};
use drivemesh_engine::SeekableRead;
use drivemesh_vfs::{DeleteDirectoryOutcome, VfsEntry};

use crate::error::ApiResult;
use crate::state::ApiState;

fn to_path(raw: &str) -> ApiResult<VirtualPath> {
    let normalized = if raw.starts_with('/') { raw.to_string() } else { format!("/{raw}") };
    VirtualPath::new(normalized).map_err(CoreError::from).map_err(Into::into)
}

#[derive(Serialize)]
pub struct EntryView {
    pub kind: &'static str,
    pub name: String,
    pub path: String,
    pub size: Option<u64>,
}

impl From<VfsEntry> for EntryView {
    fn from(entry: VfsEntry) -> Self {
        match entry {
            VfsEntry::Directory(d) => Self {
                kind: "directory",
                name: d.name().to_string(),
                path: d.path().as_str().to_string(),
                size: None,
            },
            VfsEntry::File(f) => Self {
                kind: "file",
                name: f.name().to_string(),
                path: f.path().as_str().to_string(),
                size: Some(f.size()),
            },
        }
    }
}

#[derive(Serialize)]
pub struct TaskAcceptedView {
    pub task_id: String,
}

pub async fn upload(
    State(state): State<ApiState>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<EntryView>)> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let path = to_path(&path)?;
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let file = state.vfs.upload_file(&bucket, &path, body.to_vec(), mime_type).await?;
    Ok((StatusCode::CREATED, Json(EntryView::from(VfsEntry::File(file)))))
}

#[derive(Deserialize)]
pub struct GetQuery {
    #[serde(default)]
    recursive: bool,
}

pub async fn get(
    State(state): State<ApiState>,
    Path((_bucket, path)): Path<(String, String)>,
    Query(query): Query<GetQuery>,
) -> ApiResult<Response> {
    let vpath = to_path(&path)?;

    match state.vfs.get_directory(&vpath).await {
        Ok(_) => {
            let entries = state.vfs.list_directory(&vpath, query.recursive).await?;
            let views: Vec<EntryView> = entries.into_iter().map(EntryView::from).collect();
            Ok(Json(views).into_response())
        }
        Err(CoreError::PathNotFound(_)) => {
            let (file, mut reader) = state.vfs.download_file(&vpath).await?;
            let mut buf = Vec::with_capacity(reader.len() as usize);
            let mut chunk = [0u8; 64 * 1024];
            loop {
                let n = reader.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let mut response = buf.into_response();
            response.headers_mut().insert(
                header::CONTENT_LENGTH,
                HeaderValue::from_str(&file.size().to_string()).expect("length is ascii"),
            );
            Ok(response)
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    recursive: bool,
}

pub async fn delete(
    State(state): State<ApiState>,
    Path((_bucket, path)): Path<(String, String)>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Response> {
    let vpath = to_path(&path)?;

    match state.vfs.get_directory(&vpath).await {
        Ok(_) => match state.task_engine.delete_directory(&vpath, query.recursive).await? {
            DeleteDirectoryOutcome::Deleted => Ok(StatusCode::NO_CONTENT.into_response()),
            DeleteDirectoryOutcome::Scheduled(task_id) => {
                state.remember_task(task_id);
                Ok((
                    StatusCode::ACCEPTED,
                    Json(TaskAcceptedView { task_id: task_id.to_string() }),
                )
                    .into_response())
            }
        },
        Err(CoreError::PathNotFound(_)) => {
            state.vfs.delete_file(&vpath).await?;
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct MkdirRequest {
    path: String,
}

pub async fn mkdir(
    State(state): State<ApiState>,
    Path(_bucket): Path<String>,
    Json(req): Json<MkdirRequest>,
) -> ApiResult<(StatusCode, Json<EntryView>)> {
    let path = to_path(&req.path)?;
    let dir = state.vfs.create_directory(&path).await?;
    Ok((StatusCode::CREATED, Json(EntryView::from(VfsEntry::Directory(dir)))))
}

#[derive(Deserialize)]
pub struct RelocateRequest {
    source: String,
    destination: String,
}

pub async fn mv(
    State(state): State<ApiState>,
    Path(_bucket): Path<String>,
    Json(req): Json<RelocateRequest>,
) -> ApiResult<Response> {
    let src = to_path(&req.source)?;
    let dst = to_path(&req.destination)?;

    match state.vfs.get_directory(&src).await {
        Ok(_) => {
            let task_id = state.task_engine.move_directory(&src, &dst).await?;
            state.remember_task(task_id);
            Ok((
                StatusCode::ACCEPTED,
                Json(TaskAcceptedView { task_id: task_id.to_string() }),
            )
                .into_response())
        }
        Err(CoreError::PathNotFound(_)) => {
            let file = state.vfs.move_file(&src, &dst).await?;
            Ok(Json(EntryView::from(VfsEntry::File(file))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn copy(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Json(req): Json<RelocateRequest>,
) -> ApiResult<Response> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let src = to_path(&req.source)?;
    let dst = to_path(&req.destination)?;

    match state.vfs.get_directory(&src).await {
        Ok(_) => {
            let task_id = state.task_engine.copy_directory(&bucket, &src, &dst).await?;
            state.remember_task(task_id);
            Ok((
                StatusCode::ACCEPTED,
                Json(TaskAcceptedView { task_id: task_id.to_string() }),
            )
                .into_response())
        }
        Err(CoreError::PathNotFound(_)) => {
            let file = state.vfs.copy_file(&bucket, &src, &dst).await?;
            Ok(Json(EntryView::from(VfsEntry::File(file))).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[derive(Deserialize)]
pub struct ThumbnailQuery {
    path: String,
    #[allow(dead_code)]
    size: Option<u32>,
}

pub async fn thumbnail(
    State(state): State<ApiState>,
    Path(_bucket): Path<String>,
    Query(query): Query<ThumbnailQuery>,
) -> ApiResult<Response> {
    let vpath = to_path(&query.path)?;
    let file = state.vfs.get_file(&vpath).await?;

    let bucket = BucketName::new(file.object_bucket().to_string()).map_err(CoreError::from)?;
    let key = ObjectKey::new(file.object_key().to_string()).map_err(CoreError::from)?;
    let object = state.store.get_object(&bucket, &key).await?.ok_or_else(|| {
        CoreError::ObjectNotFound { bucket: bucket.to_string(), key: key.to_string() }
    })?;

    let Placement::Remote { account_id, remote_id, .. } = object.placement() else {
        return Err(CoreError::ThumbnailUnavailable.into());
    };

    let account = state.registry.ensure_valid(account_id).await?;
    let token = account
        .access_token()
        .ok_or_else(|| CoreError::AuthExpired(account_id.to_string()))?;
    let data = state
        .backend
        .get_thumbnail(token, remote_id.as_str())
        .await
        .map_err(|e| CoreError::Upstream(e.to_string()))?;

    let mut response = data.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg"));
    Ok(response)
}
