//! Auth routes: OTP issue, signup, login, logout and session management.

use axum::{extract::Extension, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{AuthError, SessionIdentity};
use crate::domains::auth::actions;
use crate::domains::auth::models::{Account, Session};
use crate::domains::auth::OtpFlow;
use crate::server::app::AxumAppState;
use crate::server::cookies::{removal_cookie, session_cookie};

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    #[serde(alias = "mobileNumber")]
    pub mobile_number: String,
    #[serde(default)]
    pub login: bool,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(alias = "mobileNumber")]
    pub mobile_number: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "mobileNumber")]
    pub mobile_number: String,
    pub otp: String,
    /// Free-form device label stored with the session
    #[serde(default, alias = "device_tag")]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    fn new(message: &str, data: T) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    #[serde(flatten)]
    pub account: Account,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RevokedData {
    pub revoked: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /auth/otp
///
/// Responds identically whether or not the number is registered.
pub async fn request_otp_handler(
    Extension(state): Extension<AxumAppState>,
    Json(body): Json<OtpRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    let flow = OtpFlow::from_login_flag(body.login);
    actions::request_otp(&body.mobile_number, flow, &state.deps).await?;

    Ok(Json(MessageResponse {
        message: "OTP sent successfully".to_string(),
    }))
}

/// POST /auth/signup
pub async fn signup_handler(
    Extension(state): Extension<AxumAppState>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<DataResponse<Account>>), AuthError> {
    let account = actions::signup(&body.mobile_number, &body.otp, &state.deps).await?;
    Ok((
        StatusCode::CREATED,
        DataResponse::new("User created successfully", account),
    ))
}

/// POST /auth/login
///
/// Sets the session cookie. The response body carries the session id only as
/// an identifier for the sessions list.
pub async fn login_handler(
    Extension(state): Extension<AxumAppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<DataResponse<LoginData>>), AuthError> {
    let result =
        actions::login(&body.mobile_number, &body.otp, body.model, &state.deps).await?;

    let cookie = session_cookie(state.deps.sessions.config(), result.session.id);
    let data = LoginData {
        account: result.account,
        session_id: result.session.id,
    };

    Ok((jar.add(cookie), DataResponse::new("Login successful", data)))
}

/// POST /auth/logout
pub async fn logout_handler(
    Extension(state): Extension<AxumAppState>,
    identity: SessionIdentity,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    actions::logout(&identity, &state.deps).await;

    let jar = jar.add(removal_cookie(state.deps.sessions.config()));
    (
        jar,
        Json(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    )
}

/// GET /auth/me
pub async fn me_handler(
    Extension(state): Extension<AxumAppState>,
    identity: SessionIdentity,
) -> Result<Json<DataResponse<Account>>, AuthError> {
    let account = actions::current_account(&identity, &state.deps).await?;
    Ok(DataResponse::new("Account fetched successfully", account))
}

/// GET /auth/sessions
pub async fn list_sessions_handler(
    Extension(state): Extension<AxumAppState>,
    identity: SessionIdentity,
) -> Result<Json<DataResponse<Vec<Session>>>, AuthError> {
    let sessions = actions::list_sessions(&identity, &state.deps).await?;
    Ok(DataResponse::new("Sessions fetched successfully", sessions))
}

/// POST /auth/sessions/revoke
pub async fn revoke_sessions_handler(
    Extension(state): Extension<AxumAppState>,
    identity: SessionIdentity,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DataResponse<RevokedData>>), AuthError> {
    let revoked = actions::revoke_all_sessions(&identity, &state.deps).await?;

    let jar = jar.add(removal_cookie(state.deps.sessions.config()));
    Ok((
        jar,
        DataResponse::new("All sessions revoked", RevokedData { revoked }),
    ))
}
