//! Session token issuance and verification

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error};

use super::cookies::read_cookie;
use super::models::{Claims, Principal, PrincipalKind};
use crate::common::{safe_token_log, ApiError, CookieConfig};

/// Signs and verifies HS256 session tokens for both portals.
///
/// The secret is read once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookies: CookieConfig,
}

impl TokenService {
    pub fn new(secret: &str, cookies: CookieConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cookies,
        }
    }

    pub fn cookies(&self) -> &CookieConfig {
        &self.cookies
    }

    /// Cookie that carries the token for the given principal type
    pub fn cookie_name(&self, kind: PrincipalKind) -> &str {
        match kind {
            PrincipalKind::Seller => &self.cookies.seller_name,
            PrincipalKind::Admin => &self.cookies.admin_name,
        }
    }

    /// Signs a token for `principal` valid for `ttl`
    pub fn issue(&self, principal: Principal, ttl: Duration) -> Result<String, ApiError> {
        let now = Utc::now();
        let user_id = principal.user_id().to_string();
        let claims = Claims {
            principal,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, user_id = %user_id, "JWT encoding error");
            ApiError::InternalServer("jwt error".to_string())
        })
    }

    /// Verifies signature and expiry.
    ///
    /// Every failure collapses to `None`; the reason is only logged.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(
                    error = %e,
                    token = %safe_token_log(token),
                    "Session token rejected"
                );
                None
            }
        }
    }

    /// Resolves the principal of the requested type from the request cookies.
    ///
    /// A token of the other type is rejected even when its signature is valid.
    pub fn current_principal(&self, headers: &HeaderMap, kind: PrincipalKind) -> Option<Principal> {
        let token = read_cookie(headers, self.cookie_name(kind))?;
        let claims = self.verify(&token)?;

        if claims.principal.kind() != kind {
            debug!(
                expected = %kind,
                presented = %claims.principal.kind(),
                "Session token type mismatch"
            );
            return None;
        }

        Some(claims.principal)
    }
}
