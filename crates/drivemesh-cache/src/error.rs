//! Error type for the SQLite-backed metadata cache.

/// Errors returned by [`crate::pool::DatabasePool`] and
/// [`crate::repository::SqliteMetadataStore`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to connect to cache database: {0}")]
    ConnectionFailed(String),

    #[error("failed to run cache migrations: {0}")]
    MigrationFailed(String),

    #[error("failed to serialize or reconstruct a cached row: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}
