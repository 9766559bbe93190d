//! Auth domain actions - business logic functions
//!
//! Actions are async functions called directly from the HTTP handlers.

mod login;
mod logout;
mod request_otp;
mod signup;
mod verify_otp;

pub use login::{login, LoginResult};
pub use logout::{current_account, list_sessions, logout, revoke_all_sessions};
pub use request_otp::request_otp;
pub use signup::signup;
