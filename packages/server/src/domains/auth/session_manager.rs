//! Session lifecycle: the only writer of session rows.
//!
//! ```text
//! login ──► create()            (expires_at = now + validity)
//! request ─► find_valid() ──► refresh_activity()   (spawned, best-effort)
//! logout ──► destroy()          (errors logged, never raised)
//! revoke ──► destroy_all_for_account()
//! cron ────► sweep_expired()    (errors logged, count returned)
//! ```
//!
//! No in-process locking: correctness under concurrent requests and the sweeper
//! relies on row-level atomicity in the store. The session limit is checked by
//! count-then-insert and is therefore a soft limit.

use anyhow::{anyhow, Result};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::common::AuthError;
use crate::config::SessionConfig;
use crate::domains::auth::models::{NewSession, Session};
use crate::kernel::{with_deadline, BaseSessionStore};

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn BaseSessionStore>,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn BaseSessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run a store call under the configured deadline
    async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        with_deadline(self.config.store_timeout, op).await
    }

    /// Create a session for an account. The caller sets the cookie.
    pub async fn create(
        &self,
        account_id: Uuid,
        device_tag: Option<String>,
    ) -> Result<Session, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.validity)
            .filter(|expires_at| *expires_at > now)
            .ok_or_else(|| anyhow!("session validity {} is out of range", self.config.validity))?;
        let new_session = NewSession {
            id: Uuid::new_v4(),
            account_id,
            device_tag,
            expires_at,
            created_at: now,
        };

        let session = self.bounded(self.store.insert(new_session)).await?;
        info!(session_id = %session.id, account_id = %account_id, "Session created");
        Ok(session)
    }

    /// Point lookup without an expiry filter
    pub async fn find_by_id(&self, session_id: Uuid) -> Result<Option<Session>, AuthError> {
        Ok(self.bounded(self.store.find_by_id(session_id)).await?)
    }

    /// Lookup of a session that has not yet expired
    pub async fn find_valid(&self, session_id: Uuid) -> Result<Option<Session>, AuthError> {
        let now = Utc::now();
        Ok(self.bounded(self.store.find_valid(session_id, now)).await?)
    }

    /// Number of rows owned by the account, including expired-but-unswept ones
    pub async fn count_for_account(&self, account_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.bounded(self.store.count_for_account(account_id)).await?)
    }

    /// Active sessions of an account, oldest first
    pub async fn list_active_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<Session>, AuthError> {
        let now = Utc::now();
        Ok(self
            .bounded(self.store.list_active(account_id, now))
            .await?)
    }

    /// Delete a session. Never fails from the caller's point of view.
    pub async fn destroy(&self, session_id: Uuid) {
        match self.bounded(self.store.delete(session_id)).await {
            Ok(0) => debug!(session_id = %session_id, "Session already gone"),
            Ok(_) => info!(session_id = %session_id, "Session destroyed"),
            Err(e) => error!(session_id = %session_id, error = %e, "Error destroying session"),
        }
    }

    /// Delete every session of an account ("log out everywhere")
    pub async fn destroy_all_for_account(&self, account_id: Uuid) -> Result<u64, AuthError> {
        let removed = self
            .bounded(self.store.delete_for_account(account_id))
            .await
            .map_err(AuthError::RevocationFailed)?;
        info!(account_id = %account_id, removed, "Revoked all sessions");
        Ok(removed)
    }

    /// Delete every expired session. Errors are logged and reported as 0 removed.
    pub async fn sweep_expired(&self) -> u64 {
        let now = Utc::now();
        match self.bounded(self.store.delete_expired(now)).await {
            Ok(removed) => removed,
            Err(e) => {
                error!(error = %e, "Error cleaning up sessions");
                0
            }
        }
    }

    /// Bump `updated_at` now, returning whether the row still existed
    pub async fn touch(&self, session_id: Uuid) -> Result<bool> {
        let now = Utc::now();
        self.bounded(self.store.touch(session_id, now)).await
    }

    /// Liveness check used by the health endpoint
    pub async fn ping(&self) -> Result<()> {
        self.bounded(self.store.ping()).await
    }

    /// Fire-and-forget activity refresh; never blocks or fails the request
    pub fn refresh_activity(&self, session_id: Uuid) {
        let manager = self.clone();
        tokio::spawn(async move {
            match manager.touch(session_id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(session_id = %session_id, "Session vanished before activity refresh")
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to refresh session activity")
                }
            }
        });
    }
}
