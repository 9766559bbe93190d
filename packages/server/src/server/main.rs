// Main entry point for the session auth server

use std::sync::Arc;

use anyhow::{Context, Result};
use outlet_core::domains::auth::models::{PgAccountStore, PgSessionStore};
use outlet_core::domains::auth::{RedisOtpStore, SessionManager};
use outlet_core::kernel::{start_scheduler, BaseOtpSender, LogOtpSender, ServerDeps, TwilioAdapter};
use outlet_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use twilio::{TwilioOptions, TwilioService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,outlet_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting session auth server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(app_env = %config.app_env, "Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.session.store_timeout)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // OTP staging store
    let otp_store = RedisOtpStore::connect(&config.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    tracing::info!("Redis connected");

    let otp_sender: Arc<dyn BaseOtpSender> = match &config.twilio {
        Some(twilio) => Arc::new(TwilioAdapter::new(Arc::new(TwilioService::new(
            TwilioOptions {
                account_sid: twilio.account_sid.clone(),
                auth_token: twilio.auth_token.clone(),
                from_number: twilio.from_number.clone(),
            },
        )))),
        None => {
            tracing::warn!("Twilio not configured; OTP codes are only written to debug logs");
            Arc::new(LogOtpSender)
        }
    };

    if config.otp.bypass_code.is_some() {
        if cfg!(debug_assertions) {
            tracing::warn!("OTP_BYPASS_CODE is set; any phone number can log in with it");
        } else {
            tracing::warn!("OTP_BYPASS_CODE is ignored in release builds");
        }
    }

    let sessions = SessionManager::new(
        Arc::new(PgSessionStore::new(pool.clone())),
        config.session.clone(),
    );
    let deps = ServerDeps::new(
        Arc::new(PgAccountStore::new(pool.clone())),
        Arc::new(otp_store),
        otp_sender,
        sessions.clone(),
        config.otp.clone(),
    );

    // Start scheduled tasks (expired session sweep)
    let mut scheduler = start_scheduler(sessions)
        .await
        .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(deps, &config.allowed_origins, config.request_timeout);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
