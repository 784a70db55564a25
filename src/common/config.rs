// src/common/config.rs
//! Environment configuration
//!
//! Every setting is read through a lookup closure so tests can build a
//! configuration without touching the process environment.

use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::admin::directory::AdminAccount;
use crate::services::monitoring::MonitoringConfig;
use crate::services::otp::OtpConfig;
use crate::session_security_middleware::SessionSecurityConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Read-only view of the environment
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Parses `key` with `FromStr`, falling back to `default` when unset or empty
pub fn parse_var<T>(lookup: EnvLookup<'_>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value,
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

/// Like [`parse_var`], but rejects values outside `min..=max`
pub fn parse_bounded<T>(
    lookup: EnvLookup<'_>,
    key: &'static str,
    default: T,
    min: T,
    max: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    let value = parse_var(lookup, key, default)?;
    if value < min || value > max {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be between {} and {}", min, max),
        });
    }
    Ok(value)
}

/// Parses a boolean flag (`true/false`, `1/0`, `yes/no`)
pub fn parse_flag(lookup: EnvLookup<'_>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        Some(value) if !value.is_empty() => match value.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
        _ => Ok(default),
    }
}

pub fn string_var(lookup: EnvLookup<'_>, key: &str, default: &str) -> String {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Longest session token lifetime accepted from the environment
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

/// Names and flags of the two session cookies
#[derive(Debug, Clone, PartialEq)]
pub struct CookieConfig {
    pub seller_name: String,
    pub admin_name: String,
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            seller_name: "seller_access".to_string(),
            admin_name: "admin_access".to_string(),
            secure: false,
        }
    }
}

impl CookieConfig {
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            seller_name: string_var(lookup, "SELLER_ACCESS_TOKEN_NAME", &defaults.seller_name),
            admin_name: string_var(lookup, "ADMIN_ACCESS_TOKEN_NAME", &defaults.admin_name),
            secure: parse_flag(lookup, "COOKIE_SECURE", defaults.secure)?,
        })
    }
}

/// Which backing store holds OTP and rate-limit records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Outbound email transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailProvider {
    Ses,
    Log,
}

impl FromStr for EmailProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ses" => Ok(EmailProvider::Ses),
            "log" => Ok(EmailProvider::Log),
            other => Err(format!("unknown email provider '{}'", other)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub cookies: CookieConfig,
    pub seller_token_ttl_hours: i64,
    pub admin_token_ttl_hours: i64,
    pub otp: OtpConfig,
    pub session: SessionSecurityConfig,
    pub admin_accounts: Vec<AdminAccount>,
    pub database_url: String,
    pub otp_store: StoreBackend,
    pub email_provider: EmailProvider,
    pub ses_from_email: Option<String>,
    pub aws_region: Option<String>,
    pub cors_origins: Vec<String>,
    pub monitoring: MonitoringConfig,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let admin_accounts = match lookup("ADMIN_EMAILS") {
            Some(raw) => AdminAccount::parse_list(&raw).map_err(|reason| ConfigError::Invalid {
                key: "ADMIN_EMAILS",
                value: raw.clone(),
                reason,
            })?,
            None => Vec::new(),
        };

        let cors_origins = string_var(
            lookup,
            "CORS_ORIGINS",
            "http://localhost:3000,http://localhost:5173",
        )
        .split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

        Ok(Self {
            jwt_secret,
            cookies: CookieConfig::from_lookup(lookup)?,
            seller_token_ttl_hours: parse_bounded(
                lookup,
                "SELLER_TOKEN_TTL_HOURS",
                24 * 7,
                1,
                MAX_TOKEN_TTL_HOURS,
            )?,
            admin_token_ttl_hours: parse_bounded(
                lookup,
                "ADMIN_TOKEN_TTL_HOURS",
                8,
                1,
                MAX_TOKEN_TTL_HOURS,
            )?,
            otp: OtpConfig::from_lookup(lookup)?,
            session: SessionSecurityConfig::from_lookup(lookup)?,
            admin_accounts,
            database_url: string_var(lookup, "DATABASE_URL", "sqlite://backoffice.db"),
            otp_store: parse_var(lookup, "OTP_STORE", StoreBackend::Memory)?,
            email_provider: parse_var(lookup, "EMAIL_PROVIDER", EmailProvider::Log)?,
            ses_from_email: lookup("AWS_SES_FROM_EMAIL").filter(|v| !v.trim().is_empty()),
            aws_region: lookup("AWS_REGION").filter(|v| !v.trim().is_empty()),
            cors_origins,
            monitoring: MonitoringConfig::from_lookup(lookup)?,
            port: parse_var(lookup, "PORT", 8080)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AdminRole;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_jwt_secret_fails_fast() {
        let lookup = lookup_from(&[]);
        let err = AppConfig::from_lookup(&lookup).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let blank = lookup_from(&[("JWT_SECRET", "   ")]);
        assert!(AppConfig::from_lookup(&blank).is_err());
    }

    #[test]
    fn test_defaults() {
        let lookup = lookup_from(&[("JWT_SECRET", "s3cret")]);
        let config = AppConfig::from_lookup(&lookup).unwrap();

        assert_eq!(config.cookies.seller_name, "seller_access");
        assert_eq!(config.cookies.admin_name, "admin_access");
        assert_eq!(config.otp.ttl_seconds, 300);
        assert_eq!(config.otp.max_attempts, 5);
        assert_eq!(config.otp.max_requests_per_window, 3);
        assert_eq!(config.otp.window_seconds, 3600);
        assert_eq!(config.session.max_session_age_ms, 8 * 60 * 60 * 1000);
        assert!(config.session.require_active_session);
        assert!(config.session.log_security_events);
        assert_eq!(config.otp_store, StoreBackend::Memory);
        assert_eq!(config.port, 8080);
        assert!(config.admin_accounts.is_empty());
    }

    #[test]
    fn test_overrides() {
        let lookup = lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SELLER_ACCESS_TOKEN_NAME", "shop_session"),
            ("COOKIE_SECURE", "true"),
            ("OTP_STORE", "sqlite"),
            ("ADMIN_EMAILS", "Root@Market.example:super_admin:Root, mod@market.example:moderator"),
        ]);
        let config = AppConfig::from_lookup(&lookup).unwrap();

        assert_eq!(config.cookies.seller_name, "shop_session");
        assert!(config.cookies.secure);
        assert_eq!(config.otp_store, StoreBackend::Sqlite);
        assert_eq!(config.admin_accounts.len(), 2);
        assert_eq!(config.admin_accounts[0].email, "root@market.example");
        assert_eq!(config.admin_accounts[0].role, AdminRole::SuperAdmin);
        assert_eq!(config.admin_accounts[1].role, AdminRole::Moderator);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let lookup = lookup_from(&[("JWT_SECRET", "s3cret"), ("PORT", "eighty")]);
        assert!(matches!(
            AppConfig::from_lookup(&lookup),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));

        let flag = lookup_from(&[("JWT_SECRET", "s3cret"), ("COOKIE_SECURE", "maybe")]);
        assert!(matches!(
            AppConfig::from_lookup(&flag),
            Err(ConfigError::Invalid { key: "COOKIE_SECURE", .. })
        ));
    }

    #[test]
    fn test_out_of_range_values_fail_at_startup() {
        let cases = [
            ("SELLER_TOKEN_TTL_HOURS", "9223372036854775807"),
            ("SELLER_TOKEN_TTL_HOURS", "-1"),
            ("ADMIN_TOKEN_TTL_HOURS", "0"),
            ("OTP_TTL_SECONDS", "0"),
            ("OTP_MAX_ATTEMPTS", "0"),
            ("OTP_MAX_REQUESTS_PER_HOUR", "0"),
            ("OTP_RATE_WINDOW_SECONDS", "18446744073709551615"),
            ("OTP_RATE_WINDOW_SECONDS", "0"),
            ("SESSION_MAX_AGE_SECONDS", "-5"),
            ("SESSION_MAX_AGE_SECONDS", "9223372036854775807"),
        ];

        for (key, value) in cases {
            let lookup = lookup_from(&[("JWT_SECRET", "s3cret"), (key, value)]);
            match AppConfig::from_lookup(&lookup) {
                Err(ConfigError::Invalid { key: reported, .. }) => {
                    assert_eq!(reported, key, "{}={}", key, value)
                }
                other => panic!("{}={} was accepted: {:?}", key, value, other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_boundary_values_are_accepted() {
        let lookup = lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("SELLER_TOKEN_TTL_HOURS", "8760"),
            ("ADMIN_TOKEN_TTL_HOURS", "1"),
            ("OTP_MAX_ATTEMPTS", "1"),
        ]);
        let config = AppConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.seller_token_ttl_hours, MAX_TOKEN_TTL_HOURS);
        assert_eq!(config.admin_token_ttl_hours, 1);
        assert_eq!(config.otp.max_attempts, 1);
    }
}
