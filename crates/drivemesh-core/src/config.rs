//! Configuration module for the storage engine.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, defaults, and a builder pattern for
//! programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for the storage engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub token: TokenConfig,
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

/// SQLite metadata store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Storage-wide settings: upload chunking, load balancing, retry policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload: UploadConfig,
    pub load_balance: LoadBalanceConfig,
    pub retry: RetryConfig,
}

/// Upload / chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Objects above this size (in MiB) are striped into chunks.
    pub chunk_threshold_mb: u64,
    /// Size of each chunk (in MiB).
    pub chunk_size_mb: u64,
    /// Maximum concurrent chunk uploads per object.
    pub max_concurrent_chunks: u32,
}

/// Load Balancer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadBalanceConfig {
    /// Placement strategy: `least_used`, `round_robin`, or `weighted`.
    pub strategy: String,
}

/// Backend-call retry/backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

/// OAuth token lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Seconds before expiry at which a token is proactively refreshed.
    pub refresh_margin_secs: i64,
    pub redirect_uri: String,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/drivemesh/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("drivemesh")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("drivemesh");
        Self {
            path: data_dir.join("drivemesh.sqlite"),
            max_connections: 8,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_threshold_mb: 10,
            chunk_size_mb: 10,
            max_concurrent_chunks: 4,
        }
    }
}

impl Default for LoadBalanceConfig {
    fn default() -> Self {
        Self {
            strategy: "least_used".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 200,
            max_backoff_ms: 10_000,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_margin_secs: 60,
            redirect_uri: "http://localhost:8080/accounts/oauth/callback".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"storage.upload.chunk_size_mb"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `storage.load_balance.strategy`.
const VALID_STRATEGIES: &[&str] = &["least_used", "round_robin", "weighted"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ValidationError {
                field: "server.port".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.database.max_connections == 0 {
            errors.push(ValidationError {
                field: "database.max_connections".into(),
                message: "must be greater than 0".into(),
            });
        }

        if self.storage.upload.chunk_size_mb == 0 {
            errors.push(ValidationError {
                field: "storage.upload.chunk_size_mb".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.storage.upload.chunk_threshold_mb == 0 {
            errors.push(ValidationError {
                field: "storage.upload.chunk_threshold_mb".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.storage.upload.chunk_size_mb > self.storage.upload.chunk_threshold_mb {
            errors.push(ValidationError {
                field: "storage.upload.chunk_size_mb".into(),
                message: format!(
                    "chunk_size_mb ({}) must not exceed chunk_threshold_mb ({})",
                    self.storage.upload.chunk_size_mb, self.storage.upload.chunk_threshold_mb
                ),
            });
        }
        if self.storage.upload.max_concurrent_chunks == 0 {
            errors.push(ValidationError {
                field: "storage.upload.max_concurrent_chunks".into(),
                message: "must be greater than 0".into(),
            });
        }

        if !VALID_STRATEGIES.contains(&self.storage.load_balance.strategy.as_str()) {
            errors.push(ValidationError {
                field: "storage.load_balance.strategy".into(),
                message: format!(
                    "invalid strategy '{}'; valid options: {}",
                    self.storage.load_balance.strategy,
                    VALID_STRATEGIES.join(", ")
                ),
            });
        }

        if self.storage.retry.max_attempts == 0 {
            errors.push(ValidationError {
                field: "storage.retry.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.storage.retry.initial_backoff_ms > self.storage.retry.max_backoff_ms {
            errors.push(ValidationError {
                field: "storage.retry.initial_backoff_ms".into(),
                message: "must not exceed max_backoff_ms".into(),
            });
        }

        if self.token.refresh_margin_secs <= 0 {
            errors.push(ValidationError {
                field: "token.refresh_margin_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn server_bind_address(mut self, addr: impl Into<String>) -> Self {
        self.config.server.bind_address = addr.into();
        self
    }

    pub fn server_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.config.database.path = path;
        self
    }

    pub fn database_max_connections(mut self, n: u32) -> Self {
        self.config.database.max_connections = n;
        self
    }

    pub fn upload_chunk_threshold_mb(mut self, mb: u64) -> Self {
        self.config.storage.upload.chunk_threshold_mb = mb;
        self
    }

    pub fn upload_chunk_size_mb(mut self, mb: u64) -> Self {
        self.config.storage.upload.chunk_size_mb = mb;
        self
    }

    pub fn load_balance_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.config.storage.load_balance.strategy = strategy.into();
        self
    }

    pub fn retry_max_attempts(mut self, n: u32) -> Self {
        self.config.storage.retry.max_attempts = n;
        self
    }

    pub fn token_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.token.redirect_uri = uri.into();
        self
    }

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
