use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::common::{AuthError, SessionIdentity};

/// Guard for routes that need an authenticated session.
///
/// Runs after `session_auth_middleware`; rejects with 401 when it attached no
/// identity.
pub async fn require_session(request: Request, next: Next) -> Response {
    if request.extensions().get::<SessionIdentity>().is_none() {
        return AuthError::Unauthorized.into_response();
    }
    next.run(request).await
}
