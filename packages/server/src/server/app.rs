//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::{require_session, session_auth_middleware};
use crate::server::routes::{
    health_handler, list_sessions_handler, login_handler, logout_handler, me_handler,
    request_otp_handler, revoke_sessions_handler, signup_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// Every request passes through `session_auth_middleware`, which attaches a
/// `SessionIdentity` when the session cookie is valid. Routes in the protected
/// group additionally require that identity.
pub fn build_app(
    deps: ServerDeps,
    allowed_origins: &[String],
    request_timeout: Duration,
) -> Router {
    let sessions = deps.sessions.clone();
    let app_state = AxumAppState {
        deps: Arc::new(deps),
    };

    let public = Router::new()
        .route("/auth/otp", post(request_otp_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/health", get(health_handler));

    let protected = Router::new()
        .route("/auth/logout", post(logout_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/sessions", get(list_sessions_handler))
        .route("/auth/sessions/revoke", post(revoke_sessions_handler))
        .route_layer(middleware::from_fn(require_session));

    // Middleware layers (applied in reverse order - last added runs first)
    public
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            sessions,
            session_auth_middleware,
        ))
        .layer(Extension(app_state))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for the browser client. Cookies are only sent cross-origin with an
/// explicit origin list; without one, any origin is allowed but without
/// credentials.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins).allow_credentials(true)
    }
}
