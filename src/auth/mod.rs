//! # Auth Module
//!
//! Session tokens and route guards shared by both portals:
//! - HS256 session token issuance and verification
//! - `SellerSession` / `AdminSession` extractors for protected routes
//! - Session cookie helpers and login plumbing

pub mod cookies;
pub mod extractors;
pub mod models;
pub mod session;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use extractors::{AdminSession, SellerSession};
pub use models::{AdminPrincipal, Principal, PrincipalKind, SellerPrincipal};
pub use tokens::TokenService;
