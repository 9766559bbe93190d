//! In-process router client for HTTP-level tests.
//!
//! Builds the real router over in-memory stores and drives it with
//! `tower::ServiceExt::oneshot`, so no socket or database is needed.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use outlet_core::kernel::{BaseAccountStore, TestDependencies};
use outlet_core::server::build_app;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SESSION_COOKIE: &str = "sessionId";

/// Decoded response: status, every `Set-Cookie` header and the JSON body
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestResponse {
    /// `sessionId=<value>` pair suitable for a `Cookie` request header, if the
    /// response issued a non-empty session cookie
    pub fn session_cookie(&self) -> Option<String> {
        let prefix = format!("{}=", SESSION_COOKIE);
        self.set_cookies.iter().find_map(|header| {
            let pair = header.split(';').next()?.trim();
            let value = pair.strip_prefix(&prefix)?;
            (!value.is_empty()).then(|| pair.to_string())
        })
    }

    /// True if the response tells the browser to drop the session cookie
    pub fn clears_session_cookie(&self) -> bool {
        let prefix = format!("{}=;", SESSION_COOKIE);
        self.set_cookies
            .iter()
            .any(|header| header.starts_with(&prefix) && header.contains("Max-Age=0"))
    }

    pub fn error_code(&self) -> Option<&str> {
        self.body["error"].as_str()
    }
}

/// Router plus handles on the in-memory collaborators behind it
pub struct TestApp {
    pub deps: TestDependencies,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        let router = build_app(deps.server_deps(), &[], Duration::from_secs(30));
        Self { deps, router }
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }

    pub async fn post(&self, path: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, path, Some(body), cookie).await
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, path, None, cookie).await
    }

    /// Request a code for a flow and read it back from the spy sender
    pub async fn request_code(&self, phone_number: &str, login: bool) -> String {
        let response = self
            .post(
                "/auth/otp",
                json!({ "mobile_number": phone_number, "login": login }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        self.deps
            .otp_sender
            .last_code_for(phone_number)
            .expect("code was delivered")
    }

    pub async fn login(&self, phone_number: &str, cookie: Option<&str>) -> TestResponse {
        let code = self.request_code(phone_number, true).await;
        self.post(
            "/auth/login",
            json!({ "mobile_number": phone_number, "otp": code, "model": "test-device" }),
            cookie,
        )
        .await
    }

    /// Seed an account and log it in, returning the session cookie pair
    pub async fn logged_in(&self, phone_number: &str) -> String {
        let existing = self.deps.accounts.find_by_phone(phone_number).await.unwrap();
        if existing.is_none() {
            self.deps.accounts.create(phone_number).await;
        }
        let response = self.login(phone_number, None).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.session_cookie().expect("login sets a session cookie")
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
