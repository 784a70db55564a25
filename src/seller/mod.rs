//! # Seller Module
//!
//! Seller portal authentication:
//! - Three-step signup (send code, verify code, complete registration)
//! - Passwordless login by emailed code
//! - Seller account storage

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;


pub use routes::seller_routes;
