//! Backend drive API client
//!
//! Provides a typed HTTP client for interacting with a cloud drive's REST
//! API. Handles authentication headers, JSON deserialization, endpoint
//! construction, and (optionally) adaptive rate limiting and 429 retry.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use drivemesh_backend::client::GraphClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = GraphClient::new("access-token-here");
//! let (used, total) = client.get_drive_quota().await?;
//! println!("{used} / {total} bytes used");
//! # Ok(())
//! # }
//! ```

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::rate_limit::{parse_retry_after, AdaptiveRateLimiter};

/// Base URL for the backend drive API.
const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Response from the `/me/drive` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveResponse {
    #[allow(dead_code)]
    id: Option<String>,
    quota: Option<QuotaResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotaResponse {
    total: Option<u64>,
    used: Option<u64>,
    #[allow(dead_code)]
    remaining: Option<u64>,
}

/// Default retry-after duration when header is missing.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Maximum number of retries for 429 responses when no rate limiter is configured.
const DEFAULT_MAX_RETRIES: u32 = 5;

/// HTTP client for a backend drive's API calls.
///
/// Wraps `reqwest::Client` with authentication headers and base URL
/// construction. Optionally integrates with an [`AdaptiveRateLimiter`] for
/// proactive rate limiting and automatic 429 retry handling.
pub struct GraphClient {
    client: Client,
    base_url: String,
    access_token: String,
    rate_limiter: Option<Arc<AdaptiveRateLimiter>>,
}

impl GraphClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: GRAPH_BASE_URL.to_string(),
            access_token: access_token.into(),
            rate_limiter: None,
        }
    }

    /// Creates a new client with a custom base URL (useful for testing).
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<AdaptiveRateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn set_rate_limiter(&mut self, limiter: Arc<AdaptiveRateLimiter>) {
        self.rate_limiter = Some(limiter);
        debug!("rate limiter attached to GraphClient");
    }

    pub fn rate_limiter(&self) -> Option<&Arc<AdaptiveRateLimiter>> {
        self.rate_limiter.as_ref()
    }

    pub fn set_access_token(&mut self, token: impl Into<String>) {
        self.access_token = token.into();
        debug!("updated GraphClient access token");
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Creates an authenticated request builder for the given method and path.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).bearer_auth(&self.access_token)
    }

    /// Retrieves drive quota information as `(used_bytes, total_bytes)`.
    pub async fn get_drive_quota(&self) -> Result<(u64, u64)> {
        debug!("fetching drive quota from /me/drive");

        let drive: DriveResponse = self
            .request(Method::GET, "/me/drive")
            .send()
            .await
            .context("failed to fetch /me/drive")?
            .error_for_status()
            .context("GET /me/drive returned error status")?
            .json()
            .await
            .context("failed to parse /me/drive response")?;

        let used = drive.quota.as_ref().and_then(|q| q.used).unwrap_or(0);
        let total = drive.quota.as_ref().and_then(|q| q.total).unwrap_or(0);

        if total == 0 {
            warn!("drive quota total is 0, this may indicate an API issue");
        }

        debug!(used, total, "drive quota");
        Ok((used, total))
    }

    /// Downloads a file by its remote item ID, optionally restricted to a
    /// byte range via a `Range` header.
    pub async fn download_file(&self, id: &str, range: Option<(u64, u64)>) -> Result<Vec<u8>> {
        let path = format!("/me/drive/items/{id}/content");
        debug!(id, "downloading file");

        let mut request = self.request(Method::GET, &path);
        if let Some((start, end)) = range {
            request = request.header("Range", format!("bytes={start}-{end}"));
        }

        let response = request
            .send()
            .await
            .context("failed to send download request")?
            .error_for_status()
            .context("download request returned error status")?;

        let bytes = response
            .bytes()
            .await
            .context("failed to read download response body")?;

        debug!(id, len = bytes.len(), "download complete");
        Ok(bytes.to_vec())
    }

    /// Executes an HTTP request with automatic 429 retry and rate limiting.
    ///
    /// 1. **Proactive rate limiting**: if a rate limiter is configured, acquires
    ///    a token for the given endpoint category before sending the request.
    /// 2. **429 handling**: on HTTP 429, parses `Retry-After`, notifies the
    ///    rate limiter, sleeps, and retries.
    /// 3. **Success notification**: on success, notifies the rate limiter to
    ///    support adaptive capacity recovery.
    pub async fn execute_with_retry(
        &self,
        method: Method,
        path: &str,
        endpoint_category: &str,
    ) -> Result<Response> {
        let max_retries = self
            .rate_limiter
            .as_ref()
            .map(|rl| rl.max_retries())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        for attempt in 0..=max_retries {
            if let Some(ref limiter) = self.rate_limiter {
                let _guard = limiter.acquire(endpoint_category).await;
            }

            let response = self
                .request(method.clone(), path)
                .send()
                .await
                .context("failed to send request")?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= max_retries {
                    warn!(path, attempts = attempt + 1, "429 retry limit exhausted");
                    return Err(anyhow::anyhow!(
                        "too many requests: retry limit exhausted after {} attempts for {}",
                        attempt + 1,
                        path
                    ));
                }

                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                    .unwrap_or(DEFAULT_RETRY_AFTER);

                if let Some(ref limiter) = self.rate_limiter {
                    limiter.on_throttle(endpoint_category);
                }

                info!(
                    path,
                    attempt,
                    retry_after_ms = retry_after.as_millis(),
                    "received 429, backing off"
                );

                tokio::time::sleep(retry_after).await;
                continue;
            }

            if let Some(ref limiter) = self.rate_limiter {
                limiter.on_success(endpoint_category);
            }

            if attempt > 0 {
                info!(path, attempt, "request succeeded after retry");
            }

            return Ok(response);
        }

        Err(anyhow::anyhow!(
            "request failed: retry loop exited unexpectedly for {}",
            path
        ))
    }

    pub(crate) fn http_client(&self) -> &Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
