use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::common::SessionIdentity;
use crate::config::SessionConfig;
use crate::domains::auth::SessionManager;
use crate::server::cookies::removal_cookie;

/// Middleware to resolve the session cookie and populate `SessionIdentity`
///
/// This middleware:
/// 1. Reads the session cookie; without one the request continues anonymously
/// 2. Looks up a session with that id that has not expired
/// 3. On a hit, stores `SessionIdentity` in request extensions and refreshes
///    `updated_at` in the background
/// 4. On a miss or a store error, continues anonymously and clears the cookie
///
/// Note: This middleware never rejects a request. Routes that need an identity
/// sit behind `require_session`.
pub async fn session_auth_middleware(
    State(sessions): State<SessionManager>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(raw_id) = jar
        .get(&sessions.config().cookie_name)
        .map(|cookie| cookie.value().to_owned())
    else {
        return next.run(request).await;
    };

    match resolve_session(&sessions, &raw_id).await {
        Some(identity) => {
            debug!(session_id = %identity.session_id, "Authenticated session");
            sessions.refresh_activity(identity.session_id);
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => {
            let mut response = next.run(request).await;
            clear_stale_cookie(&mut response, sessions.config());
            response
        }
    }
}

/// Look up a valid session for a raw cookie value
async fn resolve_session(sessions: &SessionManager, raw_id: &str) -> Option<SessionIdentity> {
    let Ok(session_id) = Uuid::parse_str(raw_id) else {
        debug!("Malformed session cookie");
        return None;
    };

    match sessions.find_valid(session_id).await {
        Ok(Some(session)) => Some(SessionIdentity {
            session_id: session.id,
            account_id: session.account_id,
        }),
        Ok(None) => {
            debug!(session_id = %session_id, "Session not found or expired");
            None
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "Session middleware error");
            None
        }
    }
}

/// Append a removal cookie unless the handler already set a new session cookie
/// (a fresh login from a browser still holding a dead id).
fn clear_stale_cookie(response: &mut Response, config: &SessionConfig) {
    let prefix = format!("{}=", config.cookie_name);
    let handler_set_cookie = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .any(|value| {
            value
                .to_str()
                .map(|v| v.starts_with(&prefix))
                .unwrap_or(false)
        });
    if handler_set_cookie {
        return;
    }

    match HeaderValue::from_str(&removal_cookie(config).to_string()) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Failed to build session removal cookie"),
    }
}
