//! Liveness probe.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::ApiState;

#[derive(Serialize)]
pub struct HealthView {
    status: &'static str,
    version: &'static str,
}

pub async fn health(State(_state): State<ApiState>) -> Json<HealthView> {
    Json(HealthView {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
