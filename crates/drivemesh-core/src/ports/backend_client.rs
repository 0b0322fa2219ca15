//! Backend Client port
//!
//! The trait boundary between the core and a concrete backend's wire
//! protocol (OAuth + upload/download/delete/metadata). Implementations
//! live in adapter crates (`drivemesh-backend`); the core only depends on
//! this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// OAuth2 authorization-code-with-PKCE flow, as a narrow sub-surface of
/// the Backend Client.
#[async_trait]
pub trait AuthFlow: Send + Sync {
    /// Builds the authorization URL the user is redirected to, along with
    /// the PKCE verifier that must be supplied back to `exchange_code`.
    fn authorization_url(&self, client_id: &str, tenant_id: &str, redirect_uri: &str) -> AuthorizationRequest;

    /// Exchanges an authorization code for a fresh token pair.
    async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
        redirect_uri: &str,
        code: &str,
        pkce_verifier: &str,
    ) -> anyhow::Result<TokenPair>;

    /// Uses a refresh token to obtain a new access token.
    async fn refresh(
        &self,
        client_id: &str,
        client_secret: &str,
        tenant_id: &str,
        refresh_token: &str,
    ) -> anyhow::Result<TokenPair>;
}

#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub pkce_verifier: String,
    pub csrf_state: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Quota and identity information for a backend drive.
#[derive(Debug, Clone)]
pub struct DriveInfo {
    pub total_space: u64,
    pub used_space: u64,
}

/// Metadata for one item on the backend, as returned from an upload or a
/// `get_item` lookup.
#[derive(Debug, Clone)]
pub struct RemoteItem {
    pub remote_id: String,
    pub remote_path: String,
    pub size: u64,
    pub etag: String,
}

/// A byte range for partial downloads, inclusive on both ends.
#[derive(Debug, Clone, Copy)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

/// Wire-protocol operations against one backend account's drive.
///
/// Every method takes the caller's current access token; callers are
/// responsible for keeping it fresh via [`AuthFlow::refresh`] (the
/// Account Registry use case owns that policy).
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Uploads content small enough to send in a single request.
    async fn upload_small(
        &self,
        access_token: &str,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<RemoteItem, BackendError>;

    /// Creates a resumable upload session for large/chunked content and
    /// returns the session's upload URL.
    async fn create_upload_session(
        &self,
        access_token: &str,
        remote_path: &str,
        total_size: u64,
    ) -> Result<String, BackendError>;

    /// Uploads one aligned chunk of a resumable session.
    async fn upload_session_part(
        &self,
        upload_url: &str,
        range: ByteRange,
        total_size: u64,
        content: Vec<u8>,
    ) -> Result<Option<RemoteItem>, BackendError>;

    /// Downloads a byte range of an item. `None` downloads the whole item.
    async fn download(
        &self,
        access_token: &str,
        remote_id: &str,
        range: Option<ByteRange>,
    ) -> Result<Vec<u8>, BackendError>;

    async fn delete(&self, access_token: &str, remote_id: &str) -> Result<(), BackendError>;

    async fn get_item(&self, access_token: &str, remote_id: &str) -> Result<RemoteItem, BackendError>;

    async fn get_thumbnail(&self, access_token: &str, remote_id: &str) -> Result<Vec<u8>, BackendError>;

    async fn get_drive(&self, access_token: &str) -> Result<DriveInfo, BackendError>;
}

/// Failure classification for a Backend Client call. Maps onto the core
/// error taxonomy at the call site, not here: this type only carries
/// enough structure for that classification.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("access token expired or rejected")]
    AuthExpired,

    #[error("backend has no space for this upload")]
    BackendFull,

    #[error("remote item not found: {0}")]
    NotFound(String),

    #[error("transient backend error, retryable: {0}")]
    Transient(String),

    #[error("backend error: {0}")]
    Backend(String),
}
