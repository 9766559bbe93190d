//! Logout and session-management actions for an authenticated identity

use crate::common::{AuthError, SessionIdentity};
use crate::domains::auth::models::{Account, Session};
use crate::kernel::ServerDeps;

/// Destroy the caller's session. Always succeeds.
pub async fn logout(identity: &SessionIdentity, deps: &ServerDeps) {
    deps.sessions.destroy(identity.session_id).await;
}

/// Destroy every session of the caller's account, this one included.
pub async fn revoke_all_sessions(
    identity: &SessionIdentity,
    deps: &ServerDeps,
) -> Result<u64, AuthError> {
    deps.sessions
        .destroy_all_for_account(identity.account_id)
        .await
}

/// Active sessions of the caller's account, oldest first
pub async fn list_sessions(
    identity: &SessionIdentity,
    deps: &ServerDeps,
) -> Result<Vec<Session>, AuthError> {
    deps.sessions
        .list_active_for_account(identity.account_id)
        .await
}

/// Profile of the account behind the caller's session
pub async fn current_account(
    identity: &SessionIdentity,
    deps: &ServerDeps,
) -> Result<Account, AuthError> {
    deps.bounded(deps.accounts.find_by_id(identity.account_id))
        .await?
        .ok_or(AuthError::NotFound)
}
