//! The VFS "enhanced" surface: search, recent files, starred, and trash.
//! These are side tables over the tree rather than the tree itself, so
//! unlike the core VFS handlers they aren't bucket/path scoped.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::{CoreError, FileId, RecentEntry, StarredEntry, TrashEntry};
use drivemesh_vfs::TypeFacet;

use crate::error::ApiResult;
use crate::state::ApiState;

fn parse_type_facet(raw: &str) -> ApiResult<TypeFacet> {
    match raw {
        "image" => Ok(TypeFacet::Image),
        "video" => Ok(TypeFacet::Video),
        "audio" => Ok(TypeFacet::Audio),
        "document" => Ok(TypeFacet::Document),
        other => Err(CoreError::InvalidRequest(format!("unknown type facet: {other}")).into()),
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    q: String,
    #[serde(default)]
    glob: bool,
    #[serde(rename = "type")]
    type_facet: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResultView {
    pub name: String,
    pub path: String,
    pub size: u64,
}

pub async fn search(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<SearchResultView>>> {
    let facet = query.type_facet.as_deref().map(parse_type_facet).transpose()?;
    let files = state.search.search(&query.q, query.glob, facet).await?;
    Ok(Json(
        files
            .into_iter()
            .map(|f| SearchResultView {
                name: f.name().to_string(),
                path: f.path().as_str().to_string(),
                size: f.size(),
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_limit")]
    limit: u32,
}

fn default_recent_limit() -> u32 {
    50
}

pub async fn recent(
    State(state): State<ApiState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Json<Vec<RecentEntry>>> {
    Ok(Json(state.recent.list(query.limit).await?))
}

pub async fn list_starred(State(state): State<ApiState>) -> ApiResult<Json<Vec<StarredEntry>>> {
    Ok(Json(state.starred.list().await?))
}

#[derive(Deserialize)]
pub struct StarRequest {
    file_id: String,
}

pub async fn star(
    State(state): State<ApiState>,
    Json(req): Json<StarRequest>,
) -> ApiResult<StatusCode> {
    let file_id = FileId::from_str(&req.file_id).map_err(CoreError::Domain)?;
    state.starred.star_file(&file_id).await?;
    Ok(StatusCode::CREATED)
}

pub async fn unstar(
    State(state): State<ApiState>,
    Path(node_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.starred.unstar(&node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_trash(State(state): State<ApiState>) -> ApiResult<Json<Vec<TrashEntry>>> {
    Ok(Json(state.trash.list().await?))
}

pub async fn restore_from_trash(
    State(state): State<ApiState>,
    Path(node_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.trash.restore(&node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn purge_from_trash(
    State(state): State<ApiState>,
    Path(node_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.trash.purge(&node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct EmptyTrashView {
    pub purged: usize,
}

/// Purges every entry currently in the trash, expired or not. `TrashService`
/// only exposes a per-entry purge and an expiry-gated sweep, so "empty
/// trash now" is built here by listing then purging each entry.
pub async fn empty_trash(State(state): State<ApiState>) -> ApiResult<Json<EmptyTrashView>> {
    let entries = state.trash.list().await?;
    let purged = entries.len();
    for entry in entries {
        state.trash.purge(entry.node_id()).await?;
    }
    Ok(Json(EmptyTrashView { purged }))
}
