//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by the auth
//! actions and HTTP handlers. All external services use trait abstractions to
//! enable testing.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;
use twilio::TwilioService;

use crate::config::OtpConfig;
use crate::domains::auth::SessionManager;
use crate::kernel::{with_deadline, BaseAccountStore, BaseOtpSender, BaseOtpStore};

// =============================================================================
// TwilioService Adapter (implements BaseOtpSender trait)
// =============================================================================

/// Wrapper around TwilioService that delivers codes by SMS
pub struct TwilioAdapter(pub Arc<TwilioService>);

impl TwilioAdapter {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseOtpSender for TwilioAdapter {
    async fn send_code(&self, phone_number: &str, code: &str) -> Result<()> {
        let body = format!("Your verification code is {code}");
        self.0
            .send_sms(phone_number, &body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

// =============================================================================
// Log-only sender (no SMS provider configured)
// =============================================================================

/// Placeholder delivery channel: the code only appears in server logs.
pub struct LogOtpSender;

#[async_trait]
impl BaseOtpSender for LogOtpSender {
    async fn send_code(&self, phone_number: &str, code: &str) -> Result<()> {
        debug!(phone_number = %phone_number, code = %code, "OTP delivery not configured");
        Ok(())
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub accounts: Arc<dyn BaseAccountStore>,
    pub otp_store: Arc<dyn BaseOtpStore>,
    pub otp_sender: Arc<dyn BaseOtpSender>,
    pub sessions: SessionManager,
    pub otp: OtpConfig,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        accounts: Arc<dyn BaseAccountStore>,
        otp_store: Arc<dyn BaseOtpStore>,
        otp_sender: Arc<dyn BaseOtpSender>,
        sessions: SessionManager,
        otp: OtpConfig,
    ) -> Self {
        Self {
            accounts,
            otp_store,
            otp_sender,
            sessions,
            otp,
        }
    }

    /// Run an account-store, OTP-store or delivery call under the same
    /// deadline as the session store
    pub async fn bounded<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        with_deadline(self.sessions.config().store_timeout, op).await
    }
}
