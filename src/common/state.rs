// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::admin::directory::AdminDirectory;
use crate::auth::tokens::TokenService;
use crate::services::OtpService;

/// Database pool, services and configuration.
///
/// Built once at startup and shared read-only as `Extension<Arc<AppState>>`.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub otp: OtpService,
    pub admins: Arc<AdminDirectory>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig, otp: OtpService) -> Self {
        let tokens = TokenService::new(&config.jwt_secret, config.cookies.clone());
        let admins = Arc::new(AdminDirectory::new(config.admin_accounts.clone()));
        Self {
            db,
            config: Arc::new(config),
            tokens,
            otp,
            admins,
        }
    }
}
