//! Account domain entity
//!
//! This module defines the Account entity, which represents one backend
//! storage account registered with the system: its OAuth credentials, token
//! lifecycle, quota, and placement priority.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{AccountId, Email};

/// Represents the current state of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Account has been registered but has not completed the OAuth flow
    #[default]
    Pending,
    /// Account is active and can be used for placement
    Active,
    /// Account is in an error state with a description
    Error(String),
    /// Account has been administratively disabled
    Disabled,
}

impl AccountStatus {
    /// Returns true if the account can be selected by the load balancer
    /// or used as an upload/download target.
    pub fn can_sync(&self) -> bool {
        matches!(self, AccountStatus::Active)
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "pending"),
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Error(msg) => write!(f, "error: {}", msg),
            AccountStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Represents a registered backend storage account
///
/// An Account entity contains everything needed to authenticate against,
/// and place objects on, one backend drive: OAuth client credentials, the
/// current token pair, quota usage, and the priority used when the load
/// balancer weighs candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    display_name: String,
    email: Email,
    client_id: String,
    client_secret: String,
    tenant_id: String,
    refresh_token: Option<String>,
    access_token: Option<String>,
    token_expires: Option<DateTime<Utc>>,
    total_space: u64,
    used_space: u64,
    status: AccountStatus,
    priority: u32,
    last_sync: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Account {
    /// Creates a new Account in `Pending` state, prior to completing OAuth.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        display_name: impl Into<String>,
        email: Email,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        priority: u32,
    ) -> Self {
        Self {
            id: AccountId::new(),
            display_name: display_name.into(),
            email,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            refresh_token: None,
            access_token: None,
            token_expires: None,
            total_space: 0,
            used_space: 0,
            status: AccountStatus::Pending,
            priority,
            last_sync: None,
            created_at: Utc::now(),
        }
    }

    /// Reconstitutes an Account from storage with a known ID and timestamp.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        id: AccountId,
        display_name: impl Into<String>,
        email: Email,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        priority: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            refresh_token: None,
            access_token: None,
            token_expires: None,
            total_space: 0,
            used_space: 0,
            status: AccountStatus::Pending,
            priority,
            last_sync: None,
            created_at,
        }
    }

    // --- Getters ---

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn token_expires(&self) -> Option<DateTime<Utc>> {
        self.token_expires
    }

    pub fn total_space(&self) -> u64 {
        self.total_space
    }

    pub fn used_space(&self) -> u64 {
        self.used_space
    }

    pub fn free_space(&self) -> u64 {
        self.total_space.saturating_sub(self.used_space)
    }

    pub fn status(&self) -> &AccountStatus {
        &self.status
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // --- Derived values ---

    /// Calculates the percentage of quota used.
    ///
    /// Returns 0.0 if `total_space` is 0, to avoid division by zero.
    pub fn quota_percent(&self) -> f64 {
        if self.total_space == 0 {
            return 0.0;
        }
        (self.used_space as f64 / self.total_space as f64) * 100.0
    }

    /// Returns true if the account can currently be used for placement.
    pub fn can_sync(&self) -> bool {
        self.status.can_sync()
    }

    /// Returns true if the access token is missing or expires within the
    /// next 60 seconds, meaning a refresh should be attempted before use.
    pub fn needs_token_refresh(&self) -> bool {
        match (self.access_token.as_ref(), self.token_expires) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(_), Some(expires)) => expires <= Utc::now() + chrono::Duration::seconds(60),
        }
    }

    // --- Mutations ---

    pub fn update_quota(&mut self, used: u64, total: u64) {
        self.used_space = used;
        self.total_space = total;
    }

    /// Records a freshly-issued token pair from a completed OAuth exchange
    /// or refresh, and moves the account to `Active`.
    pub fn set_tokens(
        &mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) {
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
        self.token_expires = Some(expires_at);
        self.status = AccountStatus::Active;
    }

    pub fn record_sync(&mut self, timestamp: DateTime<Utc>) {
        self.last_sync = Some(timestamp);
    }

    pub fn set_status(&mut self, status: AccountStatus) {
        self.status = status;
    }

    pub fn activate(&mut self) {
        self.status = AccountStatus::Active;
    }

    pub fn disable(&mut self) {
        self.status = AccountStatus::Disabled;
    }

    pub fn mark_error(&mut self, reason: impl Into<String>) {
        self.status = AccountStatus::Error(reason.into());
    }

    pub fn set_priority(&mut self, priority: u32) {
        self.priority = priority;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_account() -> Account {
        let email = Email::new("test@example.com".to_string()).unwrap();
        Account::new(
            "Test Account",
            email,
            "client-123",
            "secret-456",
            "tenant-789",
            10,
        )
    }

    mod account_status_tests {
        use super::*;

        #[test]
        fn test_can_sync_active() {
            assert!(AccountStatus::Active.can_sync());
        }

        #[test]
        fn test_cannot_sync_pending() {
            assert!(!AccountStatus::Pending.can_sync());
        }

        #[test]
        fn test_cannot_sync_disabled() {
            assert!(!AccountStatus::Disabled.can_sync());
        }

        #[test]
        fn test_cannot_sync_error() {
            assert!(!AccountStatus::Error("x".to_string()).can_sync());
        }

        #[test]
        fn test_display() {
            assert_eq!(format!("{}", AccountStatus::Active), "active");
            assert_eq!(format!("{}", AccountStatus::Pending), "pending");
            assert_eq!(format!("{}", AccountStatus::Disabled), "disabled");
            assert_eq!(
                format!("{}", AccountStatus::Error("network".to_string())),
                "error: network"
            );
        }

        #[test]
        fn test_serialization() {
            let active = AccountStatus::Active;
            let json = serde_json::to_string(&active).unwrap();
            assert_eq!(json, "\"active\"");
        }
    }

    mod account_tests {
        use super::*;

        #[test]
        fn test_new_account_is_pending() {
            let account = create_test_account();

            assert_eq!(account.email().as_str(), "test@example.com");
            assert_eq!(account.display_name(), "Test Account");
            assert_eq!(account.client_id(), "client-123");
            assert_eq!(account.used_space(), 0);
            assert_eq!(account.total_space(), 0);
            assert!(account.refresh_token().is_none());
            assert!(account.last_sync().is_none());
            assert_eq!(*account.status(), AccountStatus::Pending);
            assert!(!account.can_sync());
        }

        #[test]
        fn test_quota_percent_zero_total() {
            let account = create_test_account();
            assert!((account.quota_percent() - 0.0).abs() < f64::EPSILON);
        }

        #[test]
        fn test_quota_percent_real_values() {
            let mut account = create_test_account();
            account.update_quota(5_368_709_120, 16_106_127_360);
            let percent = account.quota_percent();
            assert!(percent > 33.0 && percent < 34.0);
        }

        #[test]
        fn test_free_space() {
            let mut account = create_test_account();
            account.update_quota(30, 100);
            assert_eq!(account.free_space(), 70);
        }

        #[test]
        fn test_set_tokens_activates_account() {
            let mut account = create_test_account();
            assert!(account.needs_token_refresh());

            account.set_tokens("access-tok", "refresh-tok", Utc::now() + chrono::Duration::hours(1));
            assert_eq!(*account.status(), AccountStatus::Active);
            assert!(!account.needs_token_refresh());
            assert_eq!(account.access_token(), Some("access-tok"));
        }

        #[test]
        fn test_needs_token_refresh_near_expiry() {
            let mut account = create_test_account();
            account.set_tokens("a", "r", Utc::now() + chrono::Duration::seconds(10));
            assert!(account.needs_token_refresh());
        }

        #[test]
        fn test_record_sync() {
            let mut account = create_test_account();
            let timestamp = Utc::now();
            account.record_sync(timestamp);
            assert_eq!(account.last_sync(), Some(timestamp));
        }

        #[test]
        fn test_state_transitions() {
            let mut account = create_test_account();

            account.activate();
            assert_eq!(*account.status(), AccountStatus::Active);
            assert!(account.can_sync());

            account.disable();
            assert_eq!(*account.status(), AccountStatus::Disabled);
            assert!(!account.can_sync());

            account.mark_error("Network failure");
            assert!(
                matches!(account.status(), AccountStatus::Error(msg) if msg == "Network failure")
            );
            assert!(!account.can_sync());
        }

        #[test]
        fn test_serialization_roundtrip() {
            let account = create_test_account();
            let json = serde_json::to_string(&account).unwrap();
            let deserialized: Account = serde_json::from_str(&json).unwrap();

            assert_eq!(account.email(), deserialized.email());
            assert_eq!(account.display_name(), deserialized.display_name());
            assert_eq!(account.client_id(), deserialized.client_id());
            assert_eq!(*account.status(), *deserialized.status());
        }
    }
}
