// HTTP server setup (Axum + session cookies)
pub mod app;
pub mod cookies;
pub mod middleware;
pub mod routes;

pub use app::*;
