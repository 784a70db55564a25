//! Authentication data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Permission names carried in admin tokens
pub mod permissions {
    pub const SELLERS_READ: &str = "sellers.read";
    pub const SELLERS_APPROVE: &str = "sellers.approve";
    pub const PRODUCTS_APPROVE: &str = "products.approve";
    pub const ORDERS_MANAGE: &str = "orders.manage";
    pub const PAYOUTS_MANAGE: &str = "payouts.manage";
    pub const REVIEWS_MODERATE: &str = "reviews.moderate";
    pub const ANALYTICS_VIEW: &str = "analytics.view";
    pub const ADMINS_MANAGE: &str = "admins.manage";
}

/// The two principal types a session token can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Seller,
    Admin,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Seller => "seller",
            PrincipalKind::Admin => "admin",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seller account lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

impl SellerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SellerStatus::Pending => "pending",
            SellerStatus::Approved => "approved",
            SellerStatus::Suspended => "suspended",
            SellerStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for SellerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SellerStatus::Pending),
            "approved" => Ok(SellerStatus::Approved),
            "suspended" => Ok(SellerStatus::Suspended),
            "rejected" => Ok(SellerStatus::Rejected),
            other => Err(format!("unknown seller status '{}'", other)),
        }
    }
}

/// Back-office roles and the permissions each one grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Moderator,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Admin => "admin",
            AdminRole::Moderator => "moderator",
        }
    }

    pub fn permissions(&self) -> Vec<String> {
        use permissions::*;

        let granted: &[&str] = match self {
            AdminRole::SuperAdmin => &[
                SELLERS_READ,
                SELLERS_APPROVE,
                PRODUCTS_APPROVE,
                ORDERS_MANAGE,
                PAYOUTS_MANAGE,
                REVIEWS_MODERATE,
                ANALYTICS_VIEW,
                ADMINS_MANAGE,
            ],
            AdminRole::Admin => &[
                SELLERS_READ,
                SELLERS_APPROVE,
                PRODUCTS_APPROVE,
                ORDERS_MANAGE,
                PAYOUTS_MANAGE,
                REVIEWS_MODERATE,
                ANALYTICS_VIEW,
            ],
            AdminRole::Moderator => &[SELLERS_READ, PRODUCTS_APPROVE, REVIEWS_MODERATE],
        };
        granted.iter().map(|p| p.to_string()).collect()
    }
}

impl FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "super_admin" | "superadmin" => Ok(AdminRole::SuperAdmin),
            "admin" => Ok(AdminRole::Admin),
            "moderator" => Ok(AdminRole::Moderator),
            other => Err(format!("unknown admin role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SellerPrincipal {
    pub user_id: String,
    pub email: String,
    pub business_name: String,
    pub verified: bool,
    pub status: SellerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPrincipal {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub permissions: Vec<String>,
}

impl AdminPrincipal {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Role-scoped token payload, discriminated by the `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Principal {
    Seller(SellerPrincipal),
    Admin(AdminPrincipal),
}

impl Principal {
    pub fn kind(&self) -> PrincipalKind {
        match self {
            Principal::Seller(_) => PrincipalKind::Seller,
            Principal::Admin(_) => PrincipalKind::Admin,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Principal::Seller(s) => &s.user_id,
            Principal::Admin(a) => &a.user_id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::Seller(s) => &s.email,
            Principal::Admin(a) => &a.email,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(flatten)]
    pub principal: Principal,
    pub iat: i64,
    pub exp: i64,
}
