//! Authentication extractors for Axum
//!
//! A guarded handler takes `SellerSession` or `AdminSession` as its first
//! argument after the state extension. When no valid principal of that type is
//! present the extractor rejects with 401 and the handler body never runs.

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::models::{AdminPrincipal, Principal, PrincipalKind, SellerPrincipal};
use crate::common::{safe_email_log, ApiError, AppState};

/// A principal type that a route guard can require.
///
/// Each implementation pins the cookie and claim type it accepts, so the seller
/// and admin guards stay separate.
pub trait GuardedPrincipal: Sized + Send {
    const KIND: PrincipalKind;

    fn from_principal(principal: Principal) -> Option<Self>;
}

impl GuardedPrincipal for SellerPrincipal {
    const KIND: PrincipalKind = PrincipalKind::Seller;

    fn from_principal(principal: Principal) -> Option<Self> {
        match principal {
            Principal::Seller(seller) => Some(seller),
            Principal::Admin(_) => None,
        }
    }
}

impl GuardedPrincipal for AdminPrincipal {
    const KIND: PrincipalKind = PrincipalKind::Admin;

    fn from_principal(principal: Principal) -> Option<Self> {
        match principal {
            Principal::Admin(admin) => Some(admin),
            Principal::Seller(_) => None,
        }
    }
}

/// Verified principal injected into a guarded handler
#[derive(Debug, Clone)]
pub struct Authenticated<P>(pub P);

/// Requires a valid `seller_access` token
pub type SellerSession = Authenticated<SellerPrincipal>;

/// Requires a valid `admin_access` token
pub type AdminSession = Authenticated<AdminPrincipal>;

impl Authenticated<AdminPrincipal> {
    /// Fails with 403 unless the admin holds `permission`
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.0.has_permission(permission) {
            Ok(())
        } else {
            warn!(
                user_id = %self.0.user_id,
                role = %self.0.role.as_str(),
                permission = %permission,
                "Admin permission denied"
            );
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authenticated<P>
where
    S: Send + Sync,
    P: GuardedPrincipal,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let principal = app_state
            .tokens
            .current_principal(&parts.headers, P::KIND);

        match principal {
            Some(principal) => {
                debug!(
                    kind = %P::KIND,
                    user_id = %principal.user_id(),
                    email = %safe_email_log(principal.email()),
                    "Request authenticated"
                );
                P::from_principal(principal)
                    .map(Authenticated)
                    .ok_or(ApiError::Unauthorized)
            }
            None => {
                warn!(
                    kind = %P::KIND,
                    path = %parts.uri.path(),
                    "Authentication failed"
                );
                Err(ApiError::Unauthorized)
            }
        }
    }
}
