//! Request-scoped authentication types shared by middleware, routes and actions.

mod errors;
mod identity;

pub use errors::AuthError;
pub use identity::SessionIdentity;
