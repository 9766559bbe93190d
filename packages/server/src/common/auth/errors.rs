use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Authentication and session errors surfaced to API callers
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid OTP")]
    InvalidCode,

    #[error("User already exists")]
    AlreadyExists,

    #[error("Account not found")]
    NotFound,

    #[error("You have reached the maximum number of sessions. Log out from another device and try again")]
    TooManySessions,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid mobile number")]
    InvalidPhoneNumber,

    #[error("Service temporarily unavailable")]
    StoreUnavailable(#[from] anyhow::Error),

    #[error("Failed to revoke sessions")]
    RevocationFailed(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable machine-readable kind, sent as `error` in the response body
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCode => "invalid_code",
            AuthError::AlreadyExists => "already_exists",
            AuthError::NotFound => "not_found",
            AuthError::TooManySessions => "too_many_sessions",
            AuthError::Unauthorized => "unauthorized",
            AuthError::InvalidPhoneNumber => "invalid_phone_number",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::RevocationFailed(_) => "revocation_failed",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCode
            | AuthError::TooManySessions
            | AuthError::InvalidPhoneNumber => StatusCode::BAD_REQUEST,
            AuthError::AlreadyExists => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::RevocationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::StoreUnavailable(e) | AuthError::RevocationFailed(e) => {
                tracing::error!(error = %e, kind = self.code(), "Auth request failed");
            }
            _ => tracing::debug!(kind = self.code(), "Auth request rejected"),
        }

        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));
        (self.status(), body).into_response()
    }
}
