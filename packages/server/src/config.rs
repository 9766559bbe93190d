use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Cookie name used when `SESSION_COOKIE_NAME` is not set
pub const DEFAULT_SESSION_COOKIE: &str = "sessionId";

/// Longest accepted `SESSION_TTL_SECS` (one year)
pub const MAX_SESSION_TTL_SECS: i64 = 31_536_000;

/// Immutable session settings handed to the session manager and middleware.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// How long a session (and its cookie) lives after login
    pub validity: chrono::Duration,
    /// `Secure` cookie attribute; only set outside local development
    pub secure_cookie: bool,
    pub max_sessions_per_account: u64,
    /// Upper bound for a single session store call
    pub store_timeout: Duration,
    /// Cron expression (with seconds) for the expiry sweep
    pub sweep_schedule: String,
}

impl SessionConfig {
    /// Defaults for the given deployment environment.
    pub fn for_environment(app_env: &str) -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            validity: chrono::Duration::hours(24),
            secure_cookie: app_env.eq_ignore_ascii_case("production"),
            max_sessions_per_account: 5,
            store_timeout: Duration::from_secs(5),
            sweep_schedule: "0 */10 * * * *".to_string(),
        }
    }

    /// Cookie `Max-Age`, whole seconds
    pub fn cookie_max_age_secs(&self) -> i64 {
        self.validity.num_seconds()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::for_environment("development")
    }
}

/// OTP staging settings.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// TTL of a staged code in the OTP store
    pub ttl: Duration,
    /// Login code accepted when nothing is staged. Only honored in debug builds.
    pub bypass_code: Option<String>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            bypass_code: None,
        }
    }
}

/// Twilio credentials; SMS delivery is disabled when absent
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub port: u16,
    pub app_env: String,
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub session: SessionConfig,
    pub otp: OtpConfig,
    pub twilio: Option<TwilioConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let defaults = SessionConfig::for_environment(&app_env);
        let session = SessionConfig {
            cookie_name: env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            validity: session_validity(parse_var("SESSION_TTL_SECS", 86_400i64)?)?,
            secure_cookie: defaults.secure_cookie,
            max_sessions_per_account: parse_var(
                "MAX_SESSIONS_PER_ACCOUNT",
                defaults.max_sessions_per_account,
            )?,
            store_timeout: Duration::from_secs(parse_var("STORE_TIMEOUT_SECS", 5u64)?),
            sweep_schedule: env::var("SESSION_SWEEP_SCHEDULE")
                .unwrap_or(defaults.sweep_schedule),
        };

        let otp = OtpConfig {
            ttl: Duration::from_secs(parse_var("OTP_TTL_SECS", 300u64)?),
            bypass_code: env::var("OTP_BYPASS_CODE").ok().filter(|c| !c.is_empty()),
        };

        let twilio = match (
            env::var("TWILIO_ACCOUNT_SID"),
            env::var("TWILIO_AUTH_TOKEN"),
            env::var("TWILIO_FROM_NUMBER"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(TwilioConfig {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            port: parse_var("PORT", 8080u16)?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 30u64)?),
            app_env,
            session,
            otp,
            twilio,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a valid number")),
        Err(_) => Ok(default),
    }
}

/// Session validity from `SESSION_TTL_SECS`, limited to 1 second ..= 1 year
fn session_validity(secs: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        bail!("SESSION_TTL_SECS must be between 1 and {MAX_SESSION_TTL_SECS}, got {secs}");
    }
    Ok(chrono::Duration::seconds(secs))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_cookie_only_in_production() {
        assert!(SessionConfig::for_environment("production").secure_cookie);
        assert!(SessionConfig::for_environment("Production").secure_cookie);
        assert!(!SessionConfig::for_environment("development").secure_cookie);
        assert!(!SessionConfig::for_environment("test").secure_cookie);
    }

    #[test]
    fn test_session_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "sessionId");
        assert_eq!(config.cookie_max_age_secs(), 86_400);
        assert_eq!(config.max_sessions_per_account, 5);
        assert_eq!(config.sweep_schedule, "0 */10 * * * *");
    }

    #[test]
    fn test_session_validity_accepts_range_bounds() {
        assert_eq!(session_validity(1).unwrap(), chrono::Duration::seconds(1));
        assert_eq!(
            session_validity(MAX_SESSION_TTL_SECS).unwrap().num_seconds(),
            MAX_SESSION_TTL_SECS
        );
    }

    #[test]
    fn test_session_validity_rejects_out_of_range() {
        assert!(session_validity(0).is_err());
        assert!(session_validity(-60).is_err());
        assert!(session_validity(MAX_SESSION_TTL_SECS + 1).is_err());
        assert!(session_validity(10_000_000_000_000).is_err());
        assert!(session_validity(i64::MAX).is_err());
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("http://localhost:3000, https://shop.example.com,,"),
            vec!["http://localhost:3000", "https://shop.example.com"]
        );
        assert!(split_list("").is_empty());
    }
}
