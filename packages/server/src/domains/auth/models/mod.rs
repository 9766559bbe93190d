pub mod account;
pub mod session;

pub use account::{Account, PgAccountStore};
pub use session::{NewSession, PgSessionStore, Session};
