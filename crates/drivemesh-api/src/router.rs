//! Route table: binds every handler under a versioned API prefix and
//! layers on the cross-cutting HTTP concerns (tracing, CORS, panic
//! recovery, body size limits).

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, audit, buckets, discovery, health, multipart, oauth, objects, tasks, vfs};
use crate::state::ApiState;

const API_PREFIX: &str = "/api/v1";

/// Objects and multipart parts are capped well above the chunking
/// threshold so a single oversized request can't exhaust memory; the
/// real size ceiling for striped uploads is enforced by the Object
/// Engine itself via `CoreError::FileTooLarge`.
const MAX_BODY_BYTES: usize = 512 * 1024 * 1024;

pub fn build(state: ApiState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health))
        .route("/buckets", get(buckets::list_buckets))
        .route(
            "/buckets/:bucket",
            put(buckets::create_bucket).delete(buckets::delete_bucket),
        )
        .route(
            "/buckets/:bucket/objects",
            get(objects::list_objects),
        )
        .route(
            "/buckets/:bucket/objects/*key",
            put(objects::put_object)
                .get(objects::get_object)
                .head(objects::head_object)
                .delete(objects::delete_object),
        )
        .route("/buckets/:bucket/multipart", post(multipart::initiate))
        .route(
            "/buckets/:bucket/multipart/parts",
            put(multipart::upload_part).get(multipart::list_parts),
        )
        .route("/buckets/:bucket/multipart/complete", post(multipart::complete))
        .route("/buckets/:bucket/multipart/abort", post(multipart::abort))
        .route("/vfs/:bucket/_mkdir", post(vfs::mkdir))
        .route("/vfs/:bucket/_move", post(vfs::mv))
        .route("/vfs/:bucket/_copy", post(vfs::copy))
        .route("/vfs/:bucket/_thumbnail", get(vfs::thumbnail))
        .route("/vfs/_search", get(discovery::search))
        .route("/vfs/_files/recent", get(discovery::recent))
        .route(
            "/vfs/_starred",
            get(discovery::list_starred).post(discovery::star),
        )
        .route("/vfs/_starred/:node_id", delete(discovery::unstar))
        .route(
            "/vfs/_trash",
            get(discovery::list_trash).delete(discovery::empty_trash),
        )
        .route(
            "/vfs/_trash/:node_id/restore",
            post(discovery::restore_from_trash),
        )
        .route("/vfs/_trash/:node_id", delete(discovery::purge_from_trash))
        .route(
            "/vfs/:bucket/*path",
            put(vfs::upload).get(vfs::get).delete(vfs::delete),
        )
        .route(
            "/accounts",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/accounts/:id",
            get(accounts::get_account)
                .patch(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/accounts/:id/refresh", post(accounts::refresh_account))
        .route("/accounts/:id/sync", post(accounts::sync_account))
        .route("/oauth/authorize/:id", get(oauth::authorize))
        .route("/oauth/callback", get(oauth::callback))
        .route("/oauth/status/:id", get(oauth::status))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/:id", get(tasks::get_task))
        .route("/audit/start", post(audit::start_audit))
        .route("/audit/status", get(audit::audit_status))
        .with_state(state);

    Router::new().nest(API_PREFIX, api).layer(
        ServiceBuilder::new()
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
    )
}
