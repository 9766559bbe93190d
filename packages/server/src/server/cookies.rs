//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::config::SessionConfig;

/// Cookie carrying a freshly issued session id.
///
/// `Max-Age` equals the session validity window, so browser and server agree
/// on when the session ends.
pub fn session_cookie(config: &SessionConfig, session_id: Uuid) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(config.cookie_max_age_secs()))
        .build()
}

/// Cookie that makes the browser drop the session id
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookie)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .build()
}
