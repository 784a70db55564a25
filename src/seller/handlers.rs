// src/seller/handlers.rs

use super::models::{
    CompleteSignupRequest, LoginSendOtpRequest, OtpSentResponse, SellerResponse,
    SignupSendOtpRequest, SignupVerifiedResponse, VerifyOtpRequest,
};
use super::services::SellerService;
use super::validators::{
    CompleteSignupValidator, LoginSendOtpValidator, SignupSendOtpValidator, VerifyOtpValidator,
};
use crate::auth::models::PrincipalKind;
use crate::auth::session::{end_session, send_code, start_session, verify_failure, MessageResponse};
use crate::auth::extractors::Authenticated;
use crate::auth::SellerSession;
use crate::common::{normalize_email, safe_email_log, ApiError, AppState, Validator};
use crate::services::otp::{OtpPurpose, OtpService, SendOutcome, VerifyOutcome};
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

const LOGIN_CODE_MESSAGE: &str =
    "If an account exists for this email, a verification code has been sent";

fn otp_sent(state: &AppState, message: &str) -> Json<OtpSentResponse> {
    Json(OtpSentResponse {
        success: true,
        message: message.to_string(),
        expires_in_seconds: state.otp.config().ttl_seconds,
    })
}

// ============================================================================
// Signup
// ============================================================================

/// POST /api/seller/signup/send-otp - Email a signup code
pub async fn signup_send_otp(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SignupSendOtpRequest>,
) -> Result<Json<OtpSentResponse>, ApiError> {
    SignupSendOtpValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let sellers = SellerService::new(state.db.clone());
    if sellers.email_exists(&email).await? {
        info!(email = %safe_email_log(&email), "Signup requested for registered email");
        return Err(ApiError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let name = request.name.as_deref().unwrap_or("");
    send_code(&state.otp, OtpPurpose::SellerSignup, &email, name).await?;

    Ok(otp_sent(&state, "Verification code sent"))
}

/// POST /api/seller/signup/verify-otp - Check a signup code
pub async fn signup_verify_otp(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    VerifyOtpValidator.validate(&request).into_result()?;

    let outcome = state
        .otp
        .verify(OtpPurpose::SellerSignup, &request.email, &request.otp)
        .await?;

    if !outcome.is_success() {
        return Ok(verify_failure(outcome));
    }

    // The record can expire between the two calls.
    let Some(signup_token) = state
        .otp
        .issue_grant(OtpPurpose::SellerSignup, &request.email)
        .await?
    else {
        return Ok(verify_failure(VerifyOutcome::NotFound));
    };

    Ok(Json(SignupVerifiedResponse {
        outcome: outcome.to_response(),
        signup_token,
    })
    .into_response())
}

/// POST /api/seller/signup/complete - Create the account once the email is verified
pub async fn signup_complete(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<CompleteSignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    CompleteSignupValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let verified = state.otp.is_verified(OtpPurpose::SellerSignup, &email).await?
        && state
            .otp
            .grant_matches(OtpPurpose::SellerSignup, &email, &request.signup_token)
            .await?;
    if !verified {
        warn!(email = %safe_email_log(&email), "Signup completion without verified email or matching token");
        return Err(ApiError::Otp {
            message: "Email address has not been verified".to_string(),
            code: "OTP_NOT_VERIFIED",
        });
    }

    let sellers = SellerService::new(state.db.clone());
    let seller = sellers.create(&email, &request.business_name).await?;

    // The code has served its purpose; replaying it must fail.
    state.otp.clear(OtpPurpose::SellerSignup, &email).await?;

    let cookie = start_session(
        &state.tokens,
        seller.to_principal(),
        state.config.seller_token_ttl_hours,
    )?;

    Ok((
        StatusCode::CREATED,
        cookie,
        Json(SellerResponse {
            success: true,
            seller,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/seller/login/send-otp - Email a login code.
///
/// The answer is the same whether or not the account exists.
pub async fn login_send_otp(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<LoginSendOtpRequest>,
) -> Result<Json<OtpSentResponse>, ApiError> {
    LoginSendOtpValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let sellers = SellerService::new(state.db.clone());
    match sellers.find_by_email(&email).await? {
        Some(seller) => {
            let code = OtpService::generate();
            match state
                .otp
                .send_email(OtpPurpose::SellerLogin, &email, &code, &seller.business_name)
                .await?
            {
                SendOutcome::Sent => {}
                SendOutcome::RateLimited(status) => {
                    return Err(ApiError::RateLimited {
                        retry_after: status.retry_after_seconds(),
                    })
                }
                SendOutcome::DeliveryFailed => {
                    warn!(seller_id = %seller.id, "Login code delivery failed");
                }
            }
        }
        None => {
            // Unknown emails still consume the window so both paths throttle alike.
            let status = state
                .otp
                .check_rate_limit(OtpPurpose::SellerLogin, &email)
                .await?;
            if !status.allowed {
                return Err(ApiError::RateLimited {
                    retry_after: status.retry_after_seconds(),
                });
            }
            info!(email = %safe_email_log(&email), "Login code requested for unknown email");
        }
    }

    Ok(otp_sent(&state, LOGIN_CODE_MESSAGE))
}

/// POST /api/seller/login/verify - Exchange a login code for a session cookie
pub async fn login_verify(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Response, ApiError> {
    VerifyOtpValidator.validate(&request).into_result()?;
    let email = normalize_email(&request.email);

    let outcome = state
        .otp
        .verify(OtpPurpose::SellerLogin, &email, &request.otp)
        .await?;
    if !outcome.is_success() {
        return Ok(verify_failure(outcome));
    }
    state.otp.clear(OtpPurpose::SellerLogin, &email).await?;

    let sellers = SellerService::new(state.db.clone());
    let seller = sellers
        .find_by_email(&email)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !seller.can_sign_in() {
        warn!(
            seller_id = %seller.id,
            status = %seller.status,
            "Sign-in refused for seller account"
        );
        return Err(ApiError::Forbidden(format!(
            "This seller account is {}",
            seller.status().as_str()
        )));
    }

    let cookie = start_session(
        &state.tokens,
        seller.to_principal(),
        state.config.seller_token_ttl_hours,
    )?;

    info!(seller_id = %seller.id, "Seller signed in");
    Ok((
        cookie,
        Json(SellerResponse {
            success: true,
            seller,
        }),
    )
        .into_response())
}

/// POST /api/seller/logout - Clear the seller cookie
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cookie = end_session(&state.tokens, PrincipalKind::Seller)?;
    Ok((cookie, MessageResponse::ok("Signed out")))
}

// ============================================================================
// Session
// ============================================================================

/// GET /api/seller/me - Current seller, read fresh from the database
pub async fn me(
    Extension(state): Extension<Arc<AppState>>,
    Authenticated(principal): SellerSession,
) -> Result<Json<SellerResponse>, ApiError> {
    let sellers = SellerService::new(state.db.clone());
    let seller = sellers
        .find_by_id(&principal.user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(SellerResponse {
        success: true,
        seller,
    }))
}
