//! Audit Service HTTP surface: kick off a drift-detection walk and poll
//! its report.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use drivemesh_audit::Report;

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

pub async fn start_audit(State(state): State<ApiState>) -> ApiResult<StatusCode> {
    state.audit.start().map_err(ApiError::from)?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn audit_status(State(state): State<ApiState>) -> ApiResult<Json<Report>> {
    let report = state
        .audit
        .status()
        .ok_or_else(|| drivemesh_core::domain::CoreError::PathNotFound("no audit has run yet".into()))?;
    Ok(Json(report))
}
