// src/seller/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::models::{Principal, SellerPrincipal, SellerStatus};
use crate::services::otp::VerifyResponse;

/// Seller account row
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: String,
    pub email: String,
    pub business_name: String,
    pub status: String,
    pub verified: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Seller {
    /// Unknown values in the column read as `pending`
    pub fn status(&self) -> SellerStatus {
        self.status.parse().unwrap_or(SellerStatus::Pending)
    }

    /// Whether the account may sign in to the portal
    pub fn can_sign_in(&self) -> bool {
        !matches!(self.status(), SellerStatus::Suspended | SellerStatus::Rejected)
    }

    pub fn to_principal(&self) -> Principal {
        Principal::Seller(SellerPrincipal {
            user_id: self.id.clone(),
            email: self.email.clone(),
            business_name: self.business_name.clone(),
            verified: self.verified,
            status: self.status(),
        })
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupSendOtpRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSignupRequest {
    pub email: String,
    pub business_name: String,
    /// Returned by signup verify-otp; binds completion to that client
    pub signup_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginSendOtpRequest {
    pub email: String,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSentResponse {
    pub success: bool,
    pub message: String,
    pub expires_in_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupVerifiedResponse {
    #[serde(flatten)]
    pub outcome: VerifyResponse,
    pub signup_token: String,
}

#[derive(Debug, Serialize)]
pub struct SellerResponse {
    pub success: bool,
    pub seller: Seller,
}
