//! Domain and core error types
//!
//! `DomainError` covers validation failures in newtypes and entity
//! constructors. `CoreError` is the taxonomy every component raises; it
//! carries enough structure for the HTTP boundary to map it onto a
//! `{code, status}` table without re-deriving the classification.

use thiserror::Error;

/// Errors that can occur in domain value construction and entity invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid bucket name: {0}")]
    InvalidBucket(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidState { from: String, to: String },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

/// The error taxonomy shared by every component (Object Engine, VFS,
/// Account Registry, Backend Client, Audit). Each variant maps 1:1 to a
/// `(code, status)` pair the HTTP boundary reads off directly, without
/// additional classification.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("bucket already exists: {0}")]
    BucketExists(String),

    #[error("object already exists: {bucket}/{key}")]
    ObjectExists { bucket: String, key: String },

    #[error("path already exists: {0}")]
    PathExists(String),

    #[error("bucket not empty: {0}")]
    BucketNotEmpty(String),

    #[error("directory not empty: {0}")]
    DirNotEmpty(String),

    #[error("account already exists: {0}")]
    AccountExists(String),

    #[error("range not satisfiable")]
    RangeNotSatisfiable,

    #[error("file too large: {size} exceeds limit {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("no backend has enough space for {0} bytes")]
    StorageFull(u64),

    #[error("no backend available")]
    NoBackend,

    #[error("authorization expired for account {0}")]
    AuthExpired(String),

    #[error("account {0} has no refresh token")]
    NoRefreshToken(String),

    #[error("upstream backend error: {0}")]
    Upstream(String),

    #[error("thumbnail unavailable")]
    ThumbnailUnavailable,

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The stable `UPPER_SNAKE` error code used in the HTTP envelope.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidRequest(_) => "INVALID_REQUEST",
            CoreError::Domain(DomainError::InvalidBucket(_)) => "INVALID_BUCKET",
            CoreError::Domain(DomainError::InvalidKey(_)) => "INVALID_KEY",
            CoreError::Domain(DomainError::InvalidPath(_)) => "INVALID_PATH",
            CoreError::Domain(_) => "INVALID_REQUEST",
            CoreError::BucketNotFound(_) => "BUCKET_NOT_FOUND",
            CoreError::ObjectNotFound { .. } => "OBJECT_NOT_FOUND",
            CoreError::PathNotFound(_) => "PATH_NOT_FOUND",
            CoreError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            CoreError::BucketExists(_) => "BUCKET_EXISTS",
            CoreError::ObjectExists { .. } => "OBJECT_EXISTS",
            CoreError::PathExists(_) => "PATH_EXISTS",
            CoreError::BucketNotEmpty(_) => "BUCKET_NOT_EMPTY",
            CoreError::DirNotEmpty(_) => "DIR_NOT_EMPTY",
            CoreError::AccountExists(_) => "ACCOUNT_EXISTS",
            CoreError::RangeNotSatisfiable => "RANGE_NOT_SATISFIABLE",
            CoreError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            CoreError::StorageFull(_) => "STORAGE_FULL",
            CoreError::NoBackend => "STORAGE_FULL",
            CoreError::AuthExpired(_) => "AUTH_EXPIRED",
            CoreError::NoRefreshToken(_) => "NO_REFRESH_TOKEN",
            CoreError::Upstream(_) => "UPSTREAM_ERROR",
            CoreError::ThumbnailUnavailable => "UPSTREAM_ERROR",
            CoreError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// The HTTP status the code maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            CoreError::InvalidRequest(_) | CoreError::Domain(_) => 400,
            CoreError::BucketNotFound(_)
            | CoreError::ObjectNotFound { .. }
            | CoreError::PathNotFound(_)
            | CoreError::AccountNotFound(_) => 404,
            CoreError::BucketExists(_)
            | CoreError::ObjectExists { .. }
            | CoreError::PathExists(_)
            | CoreError::BucketNotEmpty(_)
            | CoreError::DirNotEmpty(_)
            | CoreError::AccountExists(_) => 409,
            CoreError::RangeNotSatisfiable => 416,
            CoreError::FileTooLarge { .. } => 413,
            CoreError::StorageFull(_) | CoreError::NoBackend => 507,
            CoreError::AuthExpired(_) => 401,
            CoreError::NoRefreshToken(_) => 400,
            CoreError::Upstream(_) | CoreError::ThumbnailUnavailable => 502,
            CoreError::ServiceUnavailable(_) => 503,
            CoreError::Internal(_) => 500,
        }
    }
}
