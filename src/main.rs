// src/main.rs
use axum::{extract::Extension, middleware, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::Duration;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod auth;
mod common;
mod logging_middleware;
mod seller;
mod services;
mod session_security_middleware;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::config::{EmailProvider, StoreBackend};
use common::{AppConfig, AppState};
use services::monitoring::init_sentry;
use services::{LogMailer, Mailer, MemoryStore, OtpService, SesMailer, SqliteStore, TtlStore};
use session_security_middleware::session_security_middleware;

const STORE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Portal routes with the shared middleware stack.
///
/// The session security layer is outermost so it also catches panics raised
/// inside the logging middleware and handlers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let session_config = Arc::new(state.config.session.clone());

    Router::new()
        // ====================================================================
        // SELLER PORTAL (Signup, Login, Session)
        // ====================================================================
        .merge(seller::seller_routes())
        // ====================================================================
        // ADMIN PORTAL (Login, Session, Seller Management)
        // ====================================================================
        .merge(admin::admin_routes())
        // ====================================================================
        // MIDDLEWARE
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(state))
        .layer(middleware::from_fn_with_state(
            session_config,
            session_security_middleware,
        ))
}

fn spawn_store_cleanup(store: Arc<dyn TtlStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(STORE_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match store.cleanup_expired().await {
                Ok(removed) if removed > 0 => debug!(removed = removed, "Expired OTP entries swept"),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Failed to sweep expired OTP entries"),
            }
        }
    });
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer())
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env()?;
    let _sentry_guard = init_sentry(&config.monitoring);

    info!(
        admins = config.admin_accounts.len(),
        otp_store = ?config.otp_store,
        email_provider = ?config.email_provider,
        "Configuration loaded"
    );
    if config.admin_accounts.is_empty() {
        warn!("ADMIN_EMAILS is empty - nobody can sign in to the admin portal");
    }

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options =
        SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let store: Arc<dyn TtlStore> = match config.otp_store {
        StoreBackend::Memory => {
            warn!("OTP_STORE=memory - codes are local to this instance");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => Arc::new(SqliteStore::new(pool.clone())),
    };
    spawn_store_cleanup(store.clone());
    info!("OTP store cleanup task started");

    let mailer: Arc<dyn Mailer> = match config.email_provider {
        EmailProvider::Ses => Arc::new(
            SesMailer::new(config.ses_from_email.clone(), config.aws_region.clone()).await?,
        ),
        EmailProvider::Log => {
            warn!("EMAIL_PROVIDER=log - verification emails are not delivered");
            Arc::new(LogMailer)
        }
    };

    let otp_service = OtpService::new(store, mailer, config.otp.clone());

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let cors_origins: Vec<axum::http::HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let port = config.port;

    let shared = Arc::new(AppState::new(pool, config, otp_service));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = build_router(shared)
        .layer(
            CorsLayer::new()
                .allow_origin(cors_origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::HeaderName::from_static("x-request-id"),
                    axum::http::HeaderName::from_static("x-session-id"),
                    axum::http::HeaderName::from_static("x-session-start"),
                ])
                .allow_credentials(true),
        )
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
