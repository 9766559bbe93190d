//! Request OTP action

use tracing::{error, info};

use crate::common::AuthError;
use crate::domains::auth::otp::{generate_otp_code, normalize_phone_number, otp_key, OtpFlow};
use crate::kernel::ServerDeps;

/// Stage a fresh code for `flow` and hand it to the delivery channel.
///
/// Reports success whether or not the number belongs to an account, so the
/// endpoint cannot be used to discover registered numbers. Delivery failures
/// are logged only; the staging store failing is surfaced.
pub async fn request_otp(
    phone_number: &str,
    flow: OtpFlow,
    deps: &ServerDeps,
) -> Result<(), AuthError> {
    let phone_number = normalize_phone_number(phone_number)?;
    let code = generate_otp_code();
    let key = otp_key(flow, &phone_number);

    deps.bounded(deps.otp_store.stage(&key, &code, deps.otp.ttl))
        .await?;

    if let Err(e) = deps
        .bounded(deps.otp_sender.send_code(&phone_number, &code))
        .await
    {
        error!(flow = %flow, error = %e, "Failed to deliver OTP");
        return Ok(());
    }

    info!(flow = %flow, "OTP staged and dispatched");
    Ok(())
}
