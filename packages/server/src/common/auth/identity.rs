use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::AuthError;

/// Identity resolved from a valid session cookie.
///
/// Inserted into request extensions by `session_auth_middleware`. Absent on
/// anonymous requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionIdentity {
    pub session_id: Uuid,
    pub account_id: Uuid,
}

/// Extracting `SessionIdentity` in a handler acts as the access guard:
/// anonymous requests are rejected with `401`.
#[async_trait]
impl<S> FromRequestParts<S> for SessionIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionIdentity>()
            .cloned()
            .ok_or(AuthError::Unauthorized)
    }
}
