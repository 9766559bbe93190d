use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::BaseSessionStore;

/// Session - one authenticated browser/device, mirrored by the session cookie
///
/// `id` is the opaque cookie value. A session is valid while `now < expires_at`;
/// `updated_at` is an activity marker and never extends the expiry.
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Free-form device/model tag supplied at login
    pub device_tag: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Row to insert; built by the session manager
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub account_id: Uuid,
    pub device_tag: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewSession {
    pub fn into_session(self) -> Session {
        Session {
            id: self.id,
            account_id: self.account_id,
            device_tag: self.device_tag,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Session {
    pub async fn insert(new: &NewSession, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sessions (id, account_id, device_tag, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.account_id)
        .bind(&new.device_tag)
        .bind(new.expires_at)
        .bind(new.created_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_valid(id: Uuid, now: DateTime<Utc>, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sessions WHERE id = $1 AND expires_at > $2")
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_active_for_account(
        account_id: Uuid,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM sessions
             WHERE account_id = $1 AND expires_at > $2
             ORDER BY created_at ASC",
        )
        .bind(account_id)
        .bind(now)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_for_account(account_id: Uuid, pool: &PgPool) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sessions WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_one(pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn touch(id: Uuid, now: DateTime<Utc>, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("UPDATE sessions SET updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_for_account(account_id: Uuid, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
            .bind(account_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions whose expiry has passed
    pub async fn delete_expired(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Postgres-backed BaseSessionStore
// =============================================================================

#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseSessionStore for PgSessionStore {
    async fn insert(&self, session: NewSession) -> Result<Session> {
        Session::insert(&session, &self.pool).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Session::find_by_id(id, &self.pool).await
    }

    async fn find_valid(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        Session::find_valid(id, now, &self.pool).await
    }

    async fn list_active(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>> {
        Session::find_active_for_account(account_id, now, &self.pool).await
    }

    async fn count_for_account(&self, account_id: Uuid) -> Result<u64> {
        Session::count_for_account(account_id, &self.pool).await
    }

    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        Session::touch(id, now, &self.pool).await
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        Session::delete(id, &self.pool).await
    }

    async fn delete_for_account(&self, account_id: Uuid) -> Result<u64> {
        Session::delete_for_account(account_id, &self.pool).await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        Session::delete_expired(now, &self.pool).await
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validity_is_strict_before_expiry() {
        let now = Utc::now();
        let session = NewSession {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            device_tag: Some("web".to_string()),
            expires_at: now + Duration::hours(1),
            created_at: now,
        }
        .into_session();

        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(session.expires_at));
        assert!(!session.is_valid_at(session.expires_at + Duration::seconds(1)));
        assert_eq!(session.updated_at, session.created_at);
    }
}
