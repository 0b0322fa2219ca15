//! OAuth HTTP surface: the three-hop authorize / callback / status flow
//! that completes an Account's registration.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use drivemesh_core::domain::{Account, AccountId, AccountStatus, CoreError};

use crate::error::ApiResult;
use crate::state::{ApiState, PendingAuthorization};

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

/// Redirects the caller to the backend's consent screen, stashing the
/// PKCE verifier under the CSRF state token so the callback can recover it.
pub async fn authorize(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let account_id = account_id(&id)?;
    let account = load_account(&state, &account_id).await?;

    let request = state.auth.authorization_url(
        account.client_id(),
        account.tenant_id(),
        &state.config.token.redirect_uri,
    );

    state.pending_oauth.insert(
        request.csrf_state.clone(),
        PendingAuthorization {
            account_id,
            pkce_verifier: request.pkce_verifier,
        },
    );

    let mut response = StatusCode::TEMPORARY_REDIRECT.into_response();
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_str(&request.url).map_err(|_| {
            CoreError::Internal("authorization url is not a valid header value".into())
        })?);
    Ok(response)
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: String,
    state: String,
}

pub async fn callback(
    State(state): State<ApiState>,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<super::accounts::AccountView>> {
    let (_, pending) = state
        .pending_oauth
        .remove(&query.state)
        .ok_or_else(|| CoreError::InvalidRequest("unknown or expired oauth state".into()))?;

    let mut account = load_account(&state, &pending.account_id).await?;

    let tokens = state
        .auth
        .exchange_code(
            account.client_id(),
            account.client_secret(),
            account.tenant_id(),
            &state.config.token.redirect_uri,
            &query.code,
            &pending.pkce_verifier,
        )
        .await?;

    account.set_tokens(tokens.access_token, tokens.refresh_token, tokens.expires_at);
    account.set_status(AccountStatus::Active);
    state.store.update_account(&account).await?;

    Ok(Json(account.into()))
}

#[derive(Serialize)]
pub struct OAuthStatusView {
    pub account_id: String,
    pub status: String,
    pub needs_token_refresh: bool,
}

pub async fn status(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<OAuthStatusView>> {
    let account_id = account_id(&id)?;
    let account = load_account(&state, &account_id).await?;
    Ok(Json(OAuthStatusView {
        account_id: account.id().to_string(),
        status: account.status().to_string(),
        needs_token_refresh: account.needs_token_refresh(),
    }))
}
