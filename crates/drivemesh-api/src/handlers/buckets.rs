//! Bucket CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use drivemesh_core::domain::{Bucket, BucketName, CoreError};

use crate::error::ApiResult;
use crate::state::ApiState;

#[derive(Serialize)]
pub struct BucketView {
    pub name: String,
    pub object_count: u64,
    pub total_size: u64,
}

impl From<Bucket> for BucketView {
    fn from(b: Bucket) -> Self {
        Self {
            name: b.name().as_str().to_string(),
            object_count: b.object_count(),
            total_size: b.total_size(),
        }
    }
}

pub async fn list_buckets(State(state): State<ApiState>) -> ApiResult<Json<Vec<BucketView>>> {
    let buckets = state.store.list_buckets().await?;
    Ok(Json(buckets.into_iter().map(BucketView::from).collect()))
}

pub async fn create_bucket(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<(StatusCode, Json<BucketView>)> {
    let name = BucketName::new(name).map_err(CoreError::from)?;
    if state.store.get_bucket(&name).await?.is_some() {
        return Err(CoreError::BucketExists(name.to_string()).into());
    }
    let bucket = Bucket::new(name);
    state.store.create_bucket(&bucket).await?;
    Ok((StatusCode::CREATED, Json(bucket.into())))
}

pub async fn delete_bucket(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> ApiResult<StatusCode> {
    let name = BucketName::new(name).map_err(CoreError::from)?;
    let bucket = state
        .store
        .get_bucket(&name)
        .await?
        .ok_or_else(|| CoreError::BucketNotFound(name.to_string()))?;
    if !bucket.is_empty() {
        return Err(CoreError::BucketNotEmpty(name.to_string()).into());
    }
    state.store.delete_bucket(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
