//! Staged-code verification shared by signup and login

use tracing::{debug, warn};

use crate::common::AuthError;
use crate::domains::auth::otp::{otp_key, OtpFlow};
use crate::kernel::ServerDeps;

/// Compare a submitted code against the code staged for `flow:phone_number`.
///
/// A missing key compares unequal to any input. A mismatch leaves the staged
/// code in place. Returns the staging key on success so the caller can
/// consume it.
pub(crate) async fn verify_staged_code(
    flow: OtpFlow,
    phone_number: &str,
    submitted: &str,
    deps: &ServerDeps,
) -> Result<String, AuthError> {
    let key = otp_key(flow, phone_number);
    let staged = deps.bounded(deps.otp_store.fetch(&key)).await?;

    let expected = match staged {
        Some(code) => Some(code),
        None if flow == OtpFlow::Login => debug_bypass_code(deps),
        None => None,
    };

    match expected {
        Some(code) if codes_match(&code, submitted.trim()) => Ok(key),
        Some(_) => {
            debug!(flow = %flow, "OTP mismatch");
            Err(AuthError::InvalidCode)
        }
        None => {
            debug!(flow = %flow, "No OTP staged");
            Err(AuthError::InvalidCode)
        }
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ. Length is not hidden; staged codes have a fixed length.
fn codes_match(expected: &str, submitted: &str) -> bool {
    let (expected, submitted) = (expected.as_bytes(), submitted.as_bytes());
    if expected.len() != submitted.len() {
        return false;
    }
    expected
        .iter()
        .zip(submitted)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Fixed login code for local testing; ignored in release builds.
fn debug_bypass_code(deps: &ServerDeps) -> Option<String> {
    let code = deps.otp.bypass_code.clone()?;
    if cfg!(debug_assertions) {
        warn!("Accepting OTP bypass code for login; never enable this in production");
        Some(code)
    } else {
        None
    }
}

/// Remove a code after it has been used. Failure only means the code lives
/// until its TTL runs out.
pub(crate) async fn consume_code(key: &str, deps: &ServerDeps) {
    if let Err(e) = deps.bounded(deps.otp_store.discard(key)).await {
        warn!(error = %e, "Failed to discard used OTP");
    }
}
