//! Auth domain - phone number OTP login backed by server-side sessions
//!
//! Responsibilities:
//! - Staging and verifying one-time codes (login / register flows)
//! - Account creation on signup
//! - Session lifecycle via `SessionManager` (create, validate, destroy, sweep)

pub mod actions;
pub mod models;
pub mod otp;
pub mod session_manager;

pub use models::{Account, Session};
pub use otp::{OtpFlow, RedisOtpStore};
pub use session_manager::SessionManager;
