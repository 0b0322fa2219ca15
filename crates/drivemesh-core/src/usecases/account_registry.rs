//! Account Registry use case
//!
//! Owns account selection and token freshness ahead of every backend call.
//! Guarantees that two concurrent callers asking for the same account's
//! token never trigger two refresh requests: refreshes are serialized
//! per-account behind a `DashMap` of locks, the same single-flight shape
//! the cloud provider's authenticate use case uses for its login/refresh
//! calls, generalized from one global flow to one lock per account.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::{Account, AccountId, CoreError};
use crate::ports::{AuthFlow, MetadataStore};

/// Coordinates account lookup, token refresh, and free-space accounting.
pub struct AccountRegistry {
    metadata_store: Arc<dyn MetadataStore>,
    auth_flow: Arc<dyn AuthFlow>,
    refresh_locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountRegistry {
    pub fn new(metadata_store: Arc<dyn MetadataStore>, auth_flow: Arc<dyn AuthFlow>) -> Self {
        Self {
            metadata_store,
            auth_flow,
            refresh_locks: DashMap::new(),
        }
    }

    /// Returns the account with a valid (non-expiring) access token,
    /// refreshing it first if needed.
    ///
    /// Concurrent calls for the same account share one refresh: the first
    /// caller to acquire the per-account lock performs the HTTP round
    /// trip, the rest observe the already-refreshed account once they
    /// acquire the lock in turn.
    ///
    /// On refresh failure, the account is moved to `Error` status with the
    /// failure recorded and persisted, and this returns `AuthExpired`
    /// rather than propagating the raw backend error.
    pub async fn ensure_valid(&self, account_id: &AccountId) -> Result<Account, CoreError> {
        let account = self
            .metadata_store
            .get_account(account_id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        if !account.needs_token_refresh() {
            return Ok(account);
        }

        let lock = self.lock_for(account_id);
        let _guard = lock.lock().await;

        // Re-read after acquiring the lock: another caller may have already
        // refreshed while we were waiting.
        let mut account = self
            .metadata_store
            .get_account(account_id)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        if !account.needs_token_refresh() {
            return Ok(account);
        }

        let Some(refresh_token) = account.refresh_token().map(str::to_string) else {
            account.mark_error("no refresh token on file");
            let _ = self.metadata_store.update_account(&account).await;
            return Err(CoreError::NoRefreshToken(account_id.to_string()));
        };

        let refreshed = self
            .auth_flow
            .refresh(
                account.client_id(),
                account.client_secret(),
                account.tenant_id(),
                &refresh_token,
            )
            .await;

        let tokens = match refreshed {
            Ok(tokens) => tokens,
            Err(e) => {
                account.mark_error(e.to_string());
                if let Err(persist_err) = self.metadata_store.update_account(&account).await {
                    return Err(CoreError::Internal(persist_err.to_string()));
                }
                return Err(CoreError::AuthExpired(account_id.to_string()));
            }
        };

        account.set_tokens(tokens.access_token, tokens.refresh_token, tokens.expires_at);

        self.metadata_store
            .update_account(&account)
            .await
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        Ok(account)
    }

    /// Lists every account currently eligible for placement (`Active`
    /// status), the pool the Load Balancer picks from.
    pub async fn active_accounts(&self) -> Result<Vec<Account>> {
        let all = self
            .metadata_store
            .list_accounts()
            .await
            .context("failed to list accounts")?;
        Ok(all.into_iter().filter(|a| a.can_sync()).collect())
    }

    fn lock_for(&self, account_id: &AccountId) -> Arc<Mutex<()>> {
        self.refresh_locks
            .entry(*account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
