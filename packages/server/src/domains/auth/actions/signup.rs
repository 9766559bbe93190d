//! Signup action

use tracing::info;

use super::verify_otp::{consume_code, verify_staged_code};
use crate::common::AuthError;
use crate::domains::auth::models::Account;
use crate::domains::auth::otp::{normalize_phone_number, OtpFlow};
use crate::kernel::ServerDeps;

/// Create an account after verifying the `register` code.
///
/// Does not create a session; the client logs in separately.
pub async fn signup(phone_number: &str, otp: &str, deps: &ServerDeps) -> Result<Account, AuthError> {
    let phone_number = normalize_phone_number(phone_number)?;
    let key = verify_staged_code(OtpFlow::Register, &phone_number, otp, deps).await?;

    if deps
        .bounded(deps.accounts.find_by_phone(&phone_number))
        .await?
        .is_some()
    {
        return Err(AuthError::AlreadyExists);
    }

    // A concurrent signup can still win between the check and the insert
    let account = deps
        .bounded(deps.accounts.insert(&phone_number))
        .await?
        .ok_or(AuthError::AlreadyExists)?;

    consume_code(&key, deps).await;
    info!(account_id = %account.id, "Account created");
    Ok(account)
}
