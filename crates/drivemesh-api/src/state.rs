//! Shared application state threaded through every handler.

use std::sync::Arc;

use dashmap::DashMap;

use drivemesh_audit::AuditService;
use drivemesh_balancer::LoadBalancer;
use drivemesh_core::config::Config;
use drivemesh_core::domain::{AccountId, TaskId};
use drivemesh_core::ports::{AuthFlow, BackendClient, MetadataStore};
use drivemesh_core::usecases::AccountRegistry;
use drivemesh_engine::{MultipartSession, ObjectEngine};
use drivemesh_vfs::{RecentService, SearchService, StarredService, TaskEngine, TrashService, VfsService};

/// Everything a handler needs to serve a request. Every field is an
/// `Arc`, so cloning the whole state per request is cheap.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn MetadataStore>,
    pub backend: Arc<dyn BackendClient>,
    pub auth: Arc<dyn AuthFlow>,
    pub registry: Arc<AccountRegistry>,
    pub balancer: Arc<LoadBalancer>,
    pub engine: Arc<ObjectEngine>,
    pub multipart: Arc<MultipartSession>,
    pub vfs: Arc<VfsService>,
    pub task_engine: Arc<TaskEngine>,
    pub trash: Arc<TrashService>,
    pub starred: Arc<StarredService>,
    pub recent: Arc<RecentService>,
    pub search: Arc<SearchService>,
    pub audit: Arc<AuditService>,
    pub config: Arc<Config>,
    /// IDs of tasks spawned through this API instance, since the Task
    /// Engine itself has no `list_tasks` on the Metadata Store. Handlers
    /// that receive a `TaskId` back from a background operation register
    /// it here so `GET /tasks` has something to enumerate.
    pub known_tasks: Arc<DashMap<TaskId, ()>>,
    /// In-flight authorization requests, keyed by the CSRF state token
    /// `AuthFlow::authorization_url` hands back. The callback looks its
    /// entry up by the `state` query param to recover the account being
    /// authorized and the PKCE verifier to exchange the code with.
    pub pending_oauth: Arc<DashMap<String, PendingAuthorization>>,
}

#[derive(Clone)]
pub struct PendingAuthorization {
    pub account_id: AccountId,
    pub pkce_verifier: String,
}

impl ApiState {
    pub fn remember_task(&self, id: TaskId) {
        self.known_tasks.insert(id, ());
    }
}
