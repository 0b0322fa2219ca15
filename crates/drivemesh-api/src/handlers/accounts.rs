//! Account Registry HTTP surface: account CRUD plus the refresh and sync
//! actions. `AccountRegistry` itself only exposes `ensure_valid` and
//! `active_accounts`, so plain CRUD goes straight through the Metadata
//! Store, the same layering the VFS handlers use for bucket lookups.

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::{Account, AccountId, AccountStatus, CoreError, Email};

use crate::error::ApiResult;
use crate::state::ApiState;

/// Account as seen over HTTP: never includes `client_secret`,
/// `access_token`, or `refresh_token`.
#[derive(Serialize)]
pub struct AccountView {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub tenant_id: String,
    pub status: String,
    pub priority: u32,
    pub total_space: u64,
    pub used_space: u64,
    pub free_space: u64,
    pub quota_percent: f64,
    pub last_sync: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        Self {
            id: a.id().to_string(),
            display_name: a.display_name().to_string(),
            email: a.email().to_string(),
            tenant_id: a.tenant_id().to_string(),
            status: a.status().to_string(),
            priority: a.priority(),
            total_space: a.total_space(),
            used_space: a.used_space(),
            free_space: a.free_space(),
            quota_percent: a.quota_percent(),
            last_sync: a.last_sync(),
            created_at: a.created_at(),
        }
    }
}

fn account_id(raw: &str) -> ApiResult<AccountId> {
    AccountId::from_str(raw).map_err(CoreError::from).map_err(Into::into)
}

async fn load_account(state: &ApiState, id: &AccountId) -> ApiResult<Account> {
    state
        .store
        .get_account(id)
        .await?
        .ok_or_else(|| CoreError::AccountNotFound(id.to_string()).into())
}

pub async fn list_accounts(State(state): State<ApiState>) -> ApiResult<Json<Vec<AccountView>>> {
    let accounts = state.store.list_accounts().await?;
    Ok(Json(accounts.into_iter().map(AccountView::from).collect()))
}

pub async fn get_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    let id = account_id(&id)?;
    Ok(Json(load_account(&state, &id).await?.into()))
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    display_name: String,
    email: String,
    client_id: String,
    client_secret: String,
    tenant_id: String,
    #[serde(default)]
    priority: u32,
}

pub async fn create_account(
    State(state): State<ApiState>,
    Json(req): Json<CreateAccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountView>)> {
    let email = Email::new(req.email).map_err(CoreError::from)?;
    if state.store.get_account_by_email(email.as_str()).await?.is_some() {
        return Err(CoreError::AccountExists(email.to_string()).into());
    }
    let account = Account::new(
        req.display_name,
        email,
        req.client_id,
        req.client_secret,
        req.tenant_id,
        req.priority,
    );
    state.store.create_account(&account).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    priority: Option<u32>,
    disabled: Option<bool>,
}

pub async fn update_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<Json<AccountView>> {
    let id = account_id(&id)?;
    let mut account = load_account(&state, &id).await?;

    if let Some(priority) = req.priority {
        account.set_priority(priority);
    }
    if let Some(disabled) = req.disabled {
        if disabled {
            account.disable();
        } else if *account.status() == AccountStatus::Disabled {
            account.activate();
        }
    }

    state.store.update_account(&account).await?;
    Ok(Json(account.into()))
}

pub async fn delete_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = account_id(&id)?;
    load_account(&state, &id).await?;
    state.store.delete_account(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    let id = account_id(&id)?;
    let account = state.registry.ensure_valid(&id).await?;
    Ok(Json(account.into()))
}

/// Pulls current quota usage from the backend and records it, the HTTP
/// surface for what the Audit Service's sync path does automatically.
pub async fn sync_account(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    let id = account_id(&id)?;
    let mut account = state.registry.ensure_valid(&id).await?;
    let token = account
        .access_token()
        .ok_or_else(|| CoreError::AuthExpired(id.to_string()))?
        .to_string();
    let drive = state
        .backend
        .get_drive(&token)
        .await
        .map_err(|e| CoreError::Upstream(e.to_string()))?;
    account.update_quota(drive.used_space, drive.total_space);
    account.record_sync(Utc::now());
    state.store.update_account(&account).await?;
    Ok(Json(account.into()))
}
