//! Login plumbing shared by the seller and admin portals

use axum::{
    http::{header::SET_COOKIE, HeaderName, HeaderValue, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::Serialize;
use tracing::{error, info};

use super::cookies::{clear_cookie, session_cookie};
use super::models::{Principal, PrincipalKind};
use super::tokens::TokenService;
use crate::common::{safe_email_log, ApiError};
use crate::services::otp::{OtpPurpose, OtpService, SendOutcome, VerifyOutcome};

/// `Set-Cookie` header attached to login and logout responses
pub type SessionCookie = AppendHeaders<[(HeaderName, HeaderValue); 1]>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

/// Signs a token for `principal` and wraps it in its portal cookie
pub fn start_session(
    tokens: &TokenService,
    principal: Principal,
    ttl_hours: i64,
) -> Result<SessionCookie, ApiError> {
    let kind = principal.kind();
    let user_id = principal.user_id().to_string();
    let ttl = Duration::try_hours(ttl_hours)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| {
            error!(ttl_hours = ttl_hours, "Session lifetime out of range");
            ApiError::InternalServer("session ttl out of range".to_string())
        })?;
    let token = tokens.issue(principal, ttl)?;

    let cookie = session_cookie(
        tokens.cookie_name(kind),
        &token,
        ttl.num_seconds(),
        tokens.cookies().secure,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to build session cookie");
        ApiError::InternalServer("cookie error".to_string())
    })?;

    info!(kind = %kind, user_id = %user_id, "Session started");
    Ok(AppendHeaders([(SET_COOKIE, cookie)]))
}

/// Expires the portal cookie; there is no server-side session to revoke
pub fn end_session(tokens: &TokenService, kind: PrincipalKind) -> Result<SessionCookie, ApiError> {
    let cookie = clear_cookie(tokens.cookie_name(kind), tokens.cookies().secure).map_err(|e| {
        error!(error = %e, "Failed to build clearing cookie");
        ApiError::InternalServer("cookie error".to_string())
    })?;
    Ok(AppendHeaders([(SET_COOKIE, cookie)]))
}

/// Generates and emails a fresh code, mapping refusals to HTTP errors
pub async fn send_code(
    otp: &OtpService,
    purpose: OtpPurpose,
    email: &str,
    name: &str,
) -> Result<(), ApiError> {
    let code = OtpService::generate();
    match otp.send_email(purpose, email, &code, name).await? {
        SendOutcome::Sent => Ok(()),
        SendOutcome::RateLimited(status) => Err(ApiError::RateLimited {
            retry_after: status.retry_after_seconds(),
        }),
        SendOutcome::DeliveryFailed => {
            error!(email = %safe_email_log(email), purpose = %purpose.as_str(), "Verification email not delivered");
            Err(ApiError::ServiceUnavailable(
                "Failed to send verification code. Please try again later.".to_string(),
            ))
        }
    }
}

/// 400 response carrying the outcome body, including `attemptsRemaining`
pub fn verify_failure(outcome: VerifyOutcome) -> Response {
    (StatusCode::BAD_REQUEST, Json(outcome.to_response())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{SellerPrincipal, SellerStatus};
    use crate::common::CookieConfig;

    fn tokens(secure: bool) -> TokenService {
        TokenService::new(
            "test_secret_key",
            CookieConfig {
                secure,
                ..CookieConfig::default()
            },
        )
    }

    fn seller() -> Principal {
        Principal::Seller(SellerPrincipal {
            user_id: "S_K7NP3X".to_string(),
            email: "seller@shop.example".to_string(),
            business_name: "Corner Shop".to_string(),
            verified: true,
            status: SellerStatus::Pending,
        })
    }

    #[test]
    fn test_start_session_sets_portal_cookie() {
        let AppendHeaders([(name, value)]) = start_session(&tokens(true), seller(), 168).unwrap();
        assert_eq!(name, SET_COOKIE);

        let cookie = value.to_str().unwrap();
        assert!(cookie.starts_with("seller_access="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.ends_with("; Secure"));
    }

    #[test]
    fn test_start_session_rejects_unrepresentable_lifetime() {
        for ttl_hours in [i64::MAX, 0, -1] {
            let result = start_session(&tokens(false), seller(), ttl_hours);
            assert!(matches!(result, Err(ApiError::InternalServer(_))), "ttl {}", ttl_hours);
        }
    }

    #[test]
    fn test_end_session_expires_cookie() {
        let AppendHeaders([(_, value)]) = end_session(&tokens(false), PrincipalKind::Admin).unwrap();
        let cookie = value.to_str().unwrap();
        assert!(cookie.starts_with("admin_access=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }
}
