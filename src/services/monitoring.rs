// Monitoring with Sentry integration
use serde_json::Value;
use tracing::info;

use crate::common::config::{parse_var, string_var, ConfigError, EnvLookup};

#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringConfig {
    pub sentry_dsn: Option<String>,
    pub environment: String,
    pub traces_sample_rate: f32,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sentry_dsn: None,
            environment: "development".to_string(),
            traces_sample_rate: 0.0,
        }
    }
}

impl MonitoringConfig {
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            sentry_dsn: lookup("SENTRY_DSN")
                .map(|dsn| dsn.trim().to_string())
                .filter(|dsn| !dsn.is_empty()),
            environment: string_var(lookup, "ENVIRONMENT", &defaults.environment),
            traces_sample_rate: parse_var(
                lookup,
                "SENTRY_TRACES_SAMPLE_RATE",
                defaults.traces_sample_rate,
            )?,
        })
    }
}

/// Initialize the Sentry client; `None` when no DSN is configured.
///
/// The returned guard must be held for the life of the process.
pub fn init_sentry(config: &MonitoringConfig) -> Option<sentry::ClientInitGuard> {
    let Some(dsn) = config.sentry_dsn.as_deref() else {
        info!("Sentry DSN not configured");
        return None;
    };

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            traces_sample_rate: config.traces_sample_rate,
            ..Default::default()
        },
    ));

    info!(environment = %config.environment, "Sentry initialized successfully");
    Some(guard)
}

/// Reports a panic caught at the request boundary
pub fn capture_handler_panic(method: &str, path: &str, message: &str) {
    sentry::with_scope(
        |scope| {
            scope.set_tag("http.method", method);
            scope.set_tag("http.path", path);
        },
        || sentry::capture_message(&format!("Handler panicked: {}", message), sentry::Level::Error),
    );
}

/// Records a security event as a breadcrumb for later error reports
pub fn security_breadcrumb(message: &str, data: Value) {
    let mut breadcrumb = sentry::Breadcrumb {
        ty: "default".into(),
        category: Some("security".into()),
        level: sentry::Level::Warning,
        message: Some(message.to_string()),
        ..Default::default()
    };

    if let Value::Object(map) = data {
        for (key, value) in map {
            breadcrumb.data.insert(key, value);
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitoringConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config, MonitoringConfig::default());
        assert!(init_sentry(&config).is_none());
    }

    #[test]
    fn test_config_from_lookup() {
        let lookup = |key: &str| match key {
            "SENTRY_DSN" => Some("https://key@o0.ingest.sentry.io/1".to_string()),
            "ENVIRONMENT" => Some("production".to_string()),
            "SENTRY_TRACES_SAMPLE_RATE" => Some("0.25".to_string()),
            _ => None,
        };
        let config = MonitoringConfig::from_lookup(&lookup).unwrap();
        assert!(config.sentry_dsn.is_some());
        assert_eq!(config.environment, "production");
        assert_eq!(config.traces_sample_rate, 0.25);
    }

    #[test]
    fn test_reporting_without_client_is_noop() {
        capture_handler_panic("GET", "/api/seller/me", "boom");
        security_breadcrumb("Session exceeded maximum age", serde_json::json!({ "elapsedMs": 1 }));
    }
}
