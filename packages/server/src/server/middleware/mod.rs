// HTTP middleware
pub mod require_session;
pub mod session_auth;

pub use require_session::*;
pub use session_auth::*;
