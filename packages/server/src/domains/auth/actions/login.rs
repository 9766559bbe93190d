//! Login action

use tracing::info;

use super::verify_otp::{consume_code, verify_staged_code};
use crate::common::AuthError;
use crate::domains::auth::models::{Account, Session};
use crate::domains::auth::otp::{normalize_phone_number, OtpFlow};
use crate::kernel::ServerDeps;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub account: Account,
    pub session: Session,
}

/// Verify the `login` code and open a new session for the account.
///
/// The session limit is a soft limit: the existing rows are counted and the new
/// row inserted without a transaction, so concurrent logins at the boundary
/// may both succeed. Expired rows that the sweeper has not removed yet count
/// toward the limit.
pub async fn login(
    phone_number: &str,
    otp: &str,
    device_tag: Option<String>,
    deps: &ServerDeps,
) -> Result<LoginResult, AuthError> {
    let phone_number = normalize_phone_number(phone_number)?;
    let key = verify_staged_code(OtpFlow::Login, &phone_number, otp, deps).await?;

    let account = deps
        .bounded(deps.accounts.find_by_phone(&phone_number))
        .await?
        .ok_or(AuthError::NotFound)?;

    let existing = deps.sessions.count_for_account(account.id).await?;
    if existing >= deps.sessions.config().max_sessions_per_account {
        info!(account_id = %account.id, existing, "Login refused: session limit reached");
        return Err(AuthError::TooManySessions);
    }

    let device_tag = device_tag.filter(|tag| !tag.trim().is_empty());
    let session = deps.sessions.create(account.id, device_tag).await?;

    consume_code(&key, deps).await;
    Ok(LoginResult { account, session })
}
