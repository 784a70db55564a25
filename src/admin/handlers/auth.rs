// src/admin/handlers/auth.rs

use crate::admin::models::{AdminResponse, AdminSendOtpRequest, AdminVerifyRequest};
use crate::admin::validators::{AdminSendOtpValidator, AdminVerifyValidator};
use crate::auth::extractors::Authenticated;
use crate::auth::models::{Principal, PrincipalKind};
use crate::auth::session::{end_session, start_session, verify_failure, MessageResponse};
use crate::auth::AdminSession;
use crate::common::{normalize_email, safe_email_log, ApiError, AppState, Validator};
use crate::services::otp::{OtpPurpose, OtpService, SendOutcome};
use axum::{
    extract::{Extension, Json},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const ADMIN_CODE_MESSAGE: &str =
    "If this email belongs to an administrator, a verification code has been sent";

/// POST /api/admin/login/send-otp - Email a login code to a configured admin.
///
/// Unknown addresses get the same answer and no email.
pub async fn login_send_otp(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<AdminSendOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    AdminSendOtpValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let status = match state.admins.find(&email) {
        Some(account) => {
            let code = OtpService::generate();
            match state
                .otp
                .send_email(OtpPurpose::AdminLogin, &email, &code, &account.name)
                .await?
            {
                SendOutcome::Sent => None,
                SendOutcome::RateLimited(status) => Some(status),
                SendOutcome::DeliveryFailed => {
                    warn!(email = %safe_email_log(&email), "Admin login code delivery failed");
                    None
                }
            }
        }
        None => {
            warn!(email = %safe_email_log(&email), "Admin login requested for unknown email");
            let status = state
                .otp
                .check_rate_limit(OtpPurpose::AdminLogin, &email)
                .await?;
            (!status.allowed).then_some(status)
        }
    };

    if let Some(status) = status {
        return Err(ApiError::RateLimited {
            retry_after: status.retry_after_seconds(),
        });
    }

    Ok(Json(json!({
        "success": true,
        "message": ADMIN_CODE_MESSAGE,
        "expiresInSeconds": state.otp.config().ttl_seconds,
    })))
}

/// POST /api/admin/login/verify - Exchange a login code for the admin cookie
pub async fn login_verify(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<AdminVerifyRequest>,
) -> Result<Response, ApiError> {
    AdminVerifyValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let outcome = state
        .otp
        .verify(OtpPurpose::AdminLogin, &email, &request.otp)
        .await?;
    if !outcome.is_success() {
        return Ok(verify_failure(outcome));
    }
    state.otp.clear(OtpPurpose::AdminLogin, &email).await?;

    // The account may have been removed from the directory since the code was sent.
    let account = state.admins.find(&email).ok_or(ApiError::Unauthorized)?;
    let Principal::Admin(admin) = account.to_principal() else {
        return Err(ApiError::Unauthorized);
    };

    let cookie = start_session(
        &state.tokens,
        Principal::Admin(admin.clone()),
        state.config.admin_token_ttl_hours,
    )?;

    info!(user_id = %admin.user_id, role = %admin.role.as_str(), "Admin signed in");
    Ok((
        cookie,
        Json(AdminResponse {
            success: true,
            admin,
        }),
    )
        .into_response())
}

/// POST /api/admin/logout - Clear the admin cookie
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cookie = end_session(&state.tokens, PrincipalKind::Admin)?;
    Ok((cookie, MessageResponse::ok("Signed out")))
}

/// GET /api/admin/me - Current administrator
pub async fn me(Authenticated(admin): AdminSession) -> Json<AdminResponse> {
    Json(AdminResponse {
        success: true,
        admin,
    })
}
