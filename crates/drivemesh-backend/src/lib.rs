//! Backend Client adapter - drive API client and OAuth2 PKCE flow
//!
//! Provides an async client for:
//! - OAuth2 authentication (Authorization Code with PKCE), implementing the
//!   core [`AuthFlow`](drivemesh_core::ports::AuthFlow) port
//! - Drive operations (upload/download/delete/metadata), implementing the
//!   core [`BackendClient`](drivemesh_core::ports::BackendClient) port
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 PKCE authentication flow components
//! - [`client`] - drive API HTTP client with adaptive rate limiting
//! - [`provider`] - [`BackendClient`](drivemesh_core::ports::BackendClient) implementation
//! - [`rate_limit`] - token-bucket rate limiter with adaptive throttling
//! - [`upload`] - small and chunked/resumable upload operations

pub mod auth;
pub mod client;
pub mod provider;
pub mod rate_limit;
pub mod upload;

pub use auth::GraphAuthFlow;
pub use provider::GraphBackendClient;
