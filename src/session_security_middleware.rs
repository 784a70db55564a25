// src/session_security_middleware.rs
//! Session policy layer on top of token verification
//!
//! Enforces an absolute session age from the client-supplied
//! `x-session-start` header, flags scripted user agents, adds defensive
//! response headers and turns handler panics into a generic 500.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use regex::Regex;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, warn};

use crate::common::config::{parse_bounded, parse_flag, ConfigError, EnvLookup};
use crate::common::error::internal_error_response;
use crate::common::ApiError;
use crate::services::monitoring::{capture_handler_panic, security_breadcrumb};

const MAX_SESSION_AGE_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSecurityConfig {
    pub max_session_age_ms: i64,
    pub require_active_session: bool,
    pub log_security_events: bool,
}

impl Default for SessionSecurityConfig {
    fn default() -> Self {
        Self {
            max_session_age_ms: 8 * 60 * 60 * 1000,
            require_active_session: true,
            log_security_events: true,
        }
    }
}

impl SessionSecurityConfig {
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_age_seconds: i64 = parse_bounded(
            lookup,
            "SESSION_MAX_AGE_SECONDS",
            defaults.max_session_age_ms / 1000,
            1,
            MAX_SESSION_AGE_SECONDS,
        )?;
        Ok(Self {
            max_session_age_ms: max_age_seconds * 1000,
            require_active_session: parse_flag(
                lookup,
                "SESSION_REQUIRE_ACTIVE",
                defaults.require_active_session,
            )?,
            log_security_events: parse_flag(
                lookup,
                "SESSION_LOG_SECURITY_EVENTS",
                defaults.log_security_events,
            )?,
        })
    }
}

/// Outcome of checking `x-session-start` against the configured maximum age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAge {
    Active { elapsed_ms: i64 },
    Expired { elapsed_ms: i64 },
    Unreadable,
}

/// Parses a session start given as epoch milliseconds or RFC 3339
pub fn parse_session_start(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|started| started.with_timezone(&Utc).timestamp_millis())
}

/// Elapsed time strictly greater than `max_age_ms` is expired
pub fn evaluate_session_age(raw_start: &str, now_ms: i64, max_age_ms: i64) -> SessionAge {
    match parse_session_start(raw_start) {
        Some(started_ms) => {
            let elapsed_ms = now_ms.saturating_sub(started_ms);
            if elapsed_ms > max_age_ms {
                SessionAge::Expired { elapsed_ms }
            } else {
                SessionAge::Active { elapsed_ms }
            }
        }
        None => SessionAge::Unreadable,
    }
}

fn suspicious_agent_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)(bot|crawler|spider|scraper|curl|wget|python-requests|python-urllib|go-http-client|java/|libwww|httpclient|headless)")
            .expect("valid user agent regex")
    })
}

/// Scripted or automated client signature; informational only
pub fn is_suspicious_user_agent(user_agent: &str) -> bool {
    suspicious_agent_regex().is_match(user_agent)
}

/// Client IP from proxy headers, first hop of `x-forwarded-for` wins
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first_ip) = forwarded.split(',').next() {
            let first_ip = first_ip.trim();
            if !first_ip.is_empty() {
                return Some(first_ip.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
];

fn apply_security_headers(headers: &mut HeaderMap, session_present: bool) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    if session_present {
        headers.insert(
            HeaderName::from_static("x-session-valid"),
            HeaderValue::from_static("true"),
        );
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Session security middleware, installed with `from_fn_with_state`
pub async fn session_security_middleware(
    State(config): State<Arc<SessionSecurityConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let session_id = header_str(headers, "x-session-id").map(str::to_string);
    let session_start = header_str(headers, "x-session-start").map(str::to_string);
    let user_agent = header_str(headers, "user-agent").unwrap_or("").to_string();
    let client_ip = extract_client_ip(headers);

    if config.require_active_session {
        if let Some(raw_start) = session_start.as_deref() {
            match evaluate_session_age(raw_start, Utc::now().timestamp_millis(), config.max_session_age_ms) {
                SessionAge::Expired { elapsed_ms } => {
                    if config.log_security_events {
                        warn!(
                            path = %path,
                            ip = ?client_ip,
                            session_id = ?session_id,
                            elapsed_ms = elapsed_ms,
                            max_age_ms = config.max_session_age_ms,
                            "Session exceeded maximum age"
                        );
                        security_breadcrumb(
                            "Session exceeded maximum age",
                            serde_json::json!({ "path": path, "elapsedMs": elapsed_ms }),
                        );
                    }
                    let mut response = ApiError::SessionExpired.into_response();
                    apply_security_headers(response.headers_mut(), false);
                    return response;
                }
                SessionAge::Unreadable => {
                    if config.log_security_events {
                        warn!(
                            path = %path,
                            ip = ?client_ip,
                            "Ignoring unreadable x-session-start header"
                        );
                    }
                }
                SessionAge::Active { elapsed_ms } => {
                    debug!(path = %path, elapsed_ms = elapsed_ms, "Session within maximum age");
                }
            }
        }
    }

    if config.log_security_events && is_suspicious_user_agent(&user_agent) {
        warn!(
            path = %path,
            ip = ?client_ip,
            user_agent = %user_agent,
            "Suspicious user agent"
        );
    }

    let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(
                method = %method,
                path = %path,
                ip = ?client_ip,
                panic = %message,
                "Unhandled error in request handler"
            );
            capture_handler_panic(method.as_str(), &path, &message);
            internal_error_response()
        }
    };

    apply_security_headers(response.headers_mut(), session_id.is_some());
    response
}
