// src/admin/models.rs

use serde::{Deserialize, Serialize};

use crate::auth::models::AdminPrincipal;
use crate::seller::models::Seller;

#[derive(Debug, Deserialize)]
pub struct AdminSendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminVerifyRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct SellerListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSellerStatusRequest {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdminResponse {
    pub success: bool,
    pub admin: AdminPrincipal,
}

#[derive(Debug, Serialize)]
pub struct SellerListResponse {
    pub success: bool,
    pub sellers: Vec<Seller>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SellerStatusResponse {
    pub success: bool,
    pub seller: Seller,
}
