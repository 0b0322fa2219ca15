//! Object Engine HTTP surface: single-object PUT/GET/HEAD/DELETE and
//! prefix-scoped listing.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::object::Object;
use drivemesh_core::domain::{BucketName, CoreError, ObjectKey};
use drivemesh_engine::SeekableRead;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

#[derive(Serialize)]
pub struct ObjectView {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub etag: String,
    pub mime_type: String,
    pub is_chunked: bool,
}

impl From<Object> for ObjectView {
    fn from(o: Object) -> Self {
        Self {
            bucket: o.bucket().as_str().to_string(),
            key: o.key().as_str().to_string(),
            size: o.size(),
            etag: o.etag().to_string(),
            mime_type: o.mime_type().to_string(),
            is_chunked: o.is_chunked(),
        }
    }
}

pub async fn put_object(
    State(state): State<ApiState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ObjectView>)> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let key = ObjectKey::new(key).map_err(CoreError::from)?;
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let object = state.engine.upload(&bucket, &key, body.to_vec(), mime_type).await?;
    Ok((StatusCode::CREATED, Json(object.into())))
}

#[derive(Debug, Clone, Copy)]
struct RangeReq {
    start: u64,
    end: u64,
}

fn parse_range(spec: &str, size: u64) -> ApiResult<RangeReq> {
    let body = spec
        .strip_prefix("bytes=")
        .ok_or_else(|| ApiError::InvalidRange(spec.to_string()))?;
    let (start_s, end_s) = body
        .split_once('-')
        .ok_or_else(|| ApiError::InvalidRange(spec.to_string()))?;

    let (start, end) = if start_s.is_empty() {
        // Suffix range `bytes=-N`: the last N bytes, or the whole object
        // if N >= size.
        let suffix_len: u64 = end_s
            .parse()
            .map_err(|_| ApiError::InvalidRange(spec.to_string()))?;
        (size.saturating_sub(suffix_len), size.saturating_sub(1))
    } else {
        let start: u64 = start_s
            .parse()
            .map_err(|_| ApiError::InvalidRange(spec.to_string()))?;
        let end: u64 = if end_s.is_empty() {
            size.saturating_sub(1)
        } else {
            end_s
                .parse()
                .map_err(|_| ApiError::InvalidRange(spec.to_string()))?
        };
        (start, end)
    };

    if size == 0 || start > end || end >= size {
        return Err(CoreError::RangeNotSatisfiable.into());
    }
    Ok(RangeReq { start, end })
}

pub async fn get_object(
    State(state): State<ApiState>,
    Path((bucket, key)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let key = ObjectKey::new(key).map_err(CoreError::from)?;
    let (object, mut reader) = state.engine.download(&bucket, &key).await?;

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|spec| parse_range(spec, object.size()))
        .transpose()?;

    let (status, body) = match range {
        Some(r) => {
            reader.seek(r.start).await?;
            let len = (r.end - r.start + 1) as usize;
            let mut buf = vec![0u8; len];
            let mut filled = 0;
            while filled < len {
                let n = reader.read(&mut buf[filled..]).await?;
                if n == 0 {
                    break;
                }
                filled += n;
            }
            buf.truncate(filled);
            (StatusCode::PARTIAL_CONTENT, buf)
        }
        None => {
            let mut buf = Vec::with_capacity(object.size() as usize);
            let mut chunk = [0u8; 64 * 1024];
            loop {
                let n = reader.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            (StatusCode::OK, buf)
        }
    };

    let mut response = (status, body).into_response();
    let out = response.headers_mut();
    out.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(object.mime_type())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    out.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    if let Some(r) = range {
        out.insert(
            header::CONTENT_RANGE,
            HeaderValue::from_str(&format!("bytes {}-{}/{}", r.start, r.end, object.size()))
                .expect("content-range is ascii"),
        );
    }
    Ok(response)
}

pub async fn head_object(
    State(state): State<ApiState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ApiResult<Response> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let key = ObjectKey::new(key).map_err(CoreError::from)?;
    let object = state.store.get_object(&bucket, &key).await?.ok_or_else(|| {
        CoreError::ObjectNotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    })?;

    let mut response = StatusCode::OK.into_response();
    let out = response.headers_mut();
    out.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(object.mime_type())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    out.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&object.size().to_string()).expect("length is ascii"),
    );
    out.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    Ok(response)
}

pub async fn delete_object(
    State(state): State<ApiState>,
    Path((bucket, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let key = ObjectKey::new(key).map_err(CoreError::from)?;
    state.engine.delete(&bucket, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct ListObjectsQuery {
    prefix: Option<String>,
    marker: Option<String>,
    max_keys: Option<u32>,
}

#[derive(Serialize)]
pub struct ObjectPageView {
    pub objects: Vec<ObjectView>,
    pub is_truncated: bool,
    pub next_marker: Option<String>,
}

pub async fn list_objects(
    State(state): State<ApiState>,
    Path(bucket): Path<String>,
    Query(query): Query<ListObjectsQuery>,
) -> ApiResult<Json<ObjectPageView>> {
    let bucket = BucketName::new(bucket).map_err(CoreError::from)?;
    let page = state
        .engine
        .list(
            &bucket,
            query.prefix.as_deref(),
            query.marker.as_deref(),
            query.max_keys.unwrap_or(1000),
        )
        .await?;
    Ok(Json(ObjectPageView {
        objects: page.objects.into_iter().map(ObjectView::from).collect(),
        is_truncated: page.is_truncated,
        next_marker: page.next_marker,
    }))
}
