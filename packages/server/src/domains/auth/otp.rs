//! One-time codes: generation, flow-scoped keys and the Redis staging store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::fmt;
use std::time::Duration;

use crate::common::AuthError;
use crate::kernel::BaseOtpStore;

/// Which flow a staged code authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFlow {
    Login,
    Register,
}

impl OtpFlow {
    pub fn from_login_flag(login: bool) -> Self {
        if login {
            OtpFlow::Login
        } else {
            OtpFlow::Register
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpFlow::Login => "login",
            OtpFlow::Register => "register",
        }
    }
}

impl fmt::Display for OtpFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staging key: `{flow}:{phone_number}`
pub fn otp_key(flow: OtpFlow, phone_number: &str) -> String {
    format!("{}:{}", flow, phone_number)
}

/// Uniform 6-digit code in [100000, 999999]
pub fn generate_otp_code() -> String {
    rand::rng().random_range(100_000..=999_999u32).to_string()
}

/// Trim a submitted phone number and reject anything that is not an
/// optional leading `+` followed by 7 to 15 digits.
pub fn normalize_phone_number(raw: &str) -> Result<String, AuthError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuthError::InvalidPhoneNumber);
    }

    Ok(trimmed.to_string())
}

// =============================================================================
// Redis-backed BaseOtpStore
// =============================================================================

#[derive(Clone)]
pub struct RedisOtpStore {
    conn: ConnectionManager,
}

impl RedisOtpStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl BaseOtpStore for RedisOtpStore {
    async fn stage(&self, key: &str, code: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, code, ttl.as_secs().max(1))
            .await
            .context("Failed to stage OTP")?;
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let code: Option<String> = conn.get(key).await.context("Failed to read OTP")?;
        Ok(code)
    }

    async fn discard(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.context("Failed to discard OTP")?;
        Ok(())
    }
}
