// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (OTP verification, session limits) lives in domains/auth and uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseSessionStore, BaseOtpStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::domains::auth::models::{Account, NewSession, Session};

// =============================================================================
// Session Store Trait (Infrastructure - durable session rows)
// =============================================================================

/// Durable session table.
///
/// Every method that depends on expiry takes `now` explicitly so that all
/// comparisons use the caller's clock rather than the store's.
#[async_trait]
pub trait BaseSessionStore: Send + Sync {
    /// Insert a session row and return it
    async fn insert(&self, session: NewSession) -> Result<Session>;

    /// Point lookup, no expiry filter
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>>;

    /// Lookup restricted to `expires_at > now`
    async fn find_valid(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>>;

    /// Sessions of an account with `expires_at > now`, oldest first
    async fn list_active(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>>;

    /// Every row owned by the account, expired or not
    async fn count_for_account(&self, account_id: Uuid) -> Result<u64>;

    /// Set `updated_at = now`; returns false when the row no longer exists
    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool>;

    /// Delete one row; returns rows removed (0 or 1)
    async fn delete(&self, id: Uuid) -> Result<u64>;

    /// Delete every row owned by the account
    async fn delete_for_account(&self, account_id: Uuid) -> Result<u64>;

    /// Delete every row with `expires_at <= now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// Cheap liveness check for the health endpoint
    async fn ping(&self) -> Result<()>;
}

// =============================================================================
// Account Store Trait (Infrastructure - account rows)
// =============================================================================

#[async_trait]
pub trait BaseAccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Account>>;

    /// Insert a new account. Returns `None` if the phone number is already taken.
    async fn insert(&self, phone_number: &str) -> Result<Option<Account>>;
}

// =============================================================================
// OTP Staging Store Trait (Infrastructure - keyed cache with TTL)
// =============================================================================

#[async_trait]
pub trait BaseOtpStore: Send + Sync {
    /// Store `code` under `key`, replacing any previous value, expiring after `ttl`
    async fn stage(&self, key: &str, code: &str, ttl: Duration) -> Result<()>;

    /// Currently staged code, if any and not yet expired
    async fn fetch(&self, key: &str) -> Result<Option<String>>;

    /// Remove a staged code
    async fn discard(&self, key: &str) -> Result<()>;
}

// =============================================================================
// OTP Delivery Trait (Infrastructure - SMS/OTP)
// =============================================================================

#[async_trait]
pub trait BaseOtpSender: Send + Sync {
    /// Deliver a one-time code to a phone number
    async fn send_code(&self, phone_number: &str, code: &str) -> Result<()>;
}
