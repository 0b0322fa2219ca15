//! OAuth2 PKCE authentication flow for the backend's identity provider
//!
//! Implements the Authorization Code flow with PKCE (RFC 7636). The API
//! layer owns the browser redirect and the callback HTTP route; this module
//! only builds authorization URLs and performs the token exchange/refresh,
//! the pieces that satisfy the [`AuthFlow`] port.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use drivemesh_core::ports::{AuthFlow, AuthorizationRequest, TokenPair};
use oauth2::{
    basic::BasicClient, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use tracing::{debug, info};

/// OAuth2 scopes requested for drive access.
const DEFAULT_SCOPES: &[&str] = &["Files.ReadWrite.All", "User.Read", "offline_access"];

fn authority_urls(tenant_id: &str) -> (String, String) {
    (
        format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/authorize"),
        format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token"),
    )
}

type Oauth2Client = BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

fn build_client(
    client_id: &str,
    tenant_id: &str,
    redirect_uri: &str,
) -> Result<Oauth2Client> {
    let (auth_url, token_url) = authority_urls(tenant_id);
    Ok(BasicClient::new(ClientId::new(client_id.to_string()))
        .set_auth_uri(AuthUrl::new(auth_url).context("invalid authorization URL")?)
        .set_token_uri(TokenUrl::new(token_url).context("invalid token URL")?)
        .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string()).context("invalid redirect URI")?))
}

/// [`AuthFlow`] implementation backed by the `oauth2` crate's Authorization
/// Code + PKCE support.
pub struct GraphAuthFlow;

impl GraphAuthFlow {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GraphAuthFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthFlow for GraphAuthFlow {
    fn authorization_url(&self, client_id: &str, tenant_id: &str, redirect_uri: &str) -> AuthorizationRequest {
        let client = build_client(client_id, tenant_id, redirect_uri)
            .expect("authorization_url called with invalid client configuration");

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in DEFAULT_SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (url, csrf_state) = request.set_pkce_challenge(pkce_challenge).url();

        debug!(tenant_id, "generated authorization URL");
        AuthorizationRequest {
            url: url.to_string(),
            pkce_verifier: pkce_verifier.secret().to_string(),
            csrf_state: csrf_state.secret().to_string(),
        }
    }

    async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
        redirect_uri: &str,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenPair> {
        let client = build_client(client_id, tenant_id, redirect_uri)?
            .set_client_secret(ClientSecret::new(client_secret.to_string()));

        info!(tenant_id, "exchanging authorization code for tokens");
        let http_client = reqwest::Client::new();
        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&http_client)
            .await
            .context("failed to exchange authorization code")?;

        Ok(to_token_pair(&token_result))
    }

    async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
        refresh_token: &str,
    ) -> Result<TokenPair> {
        // Redirect URI is unused for refresh; pass a placeholder that still
        // parses as a valid URL.
        let client = build_client(client_id, tenant_id, "http://localhost/unused")?
            .set_client_secret(ClientSecret::new(client_secret.to_string()));

        info!(tenant_id, "refreshing access token");
        let http_client = reqwest::Client::new();
        let token_result = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .context("failed to refresh token")?;

        let mut pair = to_token_pair(&token_result);
        if pair.refresh_token.is_empty() {
            pair.refresh_token = refresh_token.to_string();
        }
        Ok(pair)
    }
}

fn to_token_pair<T>(token_result: &T) -> TokenPair
where
    T: TokenResponse,
{
    let expires_at = token_result
        .expires_in()
        .map(|d| Utc::now() + Duration::seconds(d.as_secs() as i64))
        .unwrap_or_else(|| Utc::now() + Duration::hours(1));

    TokenPair {
        access_token: token_result.access_token().secret().to_string(),
        refresh_token: token_result
            .refresh_token()
            .map(|t| t.secret().to_string())
            .unwrap_or_default(),
        expires_at,
    }
}
