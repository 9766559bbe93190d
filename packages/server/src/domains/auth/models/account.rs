use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::kernel::BaseAccountStore;

/// Account - a person who owns outlets, keyed for login by phone number
#[derive(sqlx::FromRow, Serialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "mobile_number")]
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Account {
    /// Find account by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find account by phone number
    pub async fn find_by_phone(phone_number: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM accounts WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert account for a phone number.
    ///
    /// The unique constraint decides races between concurrent signups: the
    /// loser gets `None` instead of an error.
    pub async fn insert(phone_number: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO accounts (phone_number)
            VALUES ($1)
            ON CONFLICT (phone_number) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

// =============================================================================
// Postgres-backed BaseAccountStore
// =============================================================================

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseAccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Account::find_by_id(id, &self.pool).await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Account>> {
        Account::find_by_phone(phone_number, &self.pool).await
    }

    async fn insert(&self, phone_number: &str) -> Result<Option<Account>> {
        Account::insert(phone_number, &self.pool).await
    }
}
