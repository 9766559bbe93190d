// Session auth server - API Core
//
// Phone number OTP login backed by server-side sessions stored in Postgres.
// Domain logic lives in domains/auth; kernel/ holds the store traits and
// dependency container; server/ is the Axum layer.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
