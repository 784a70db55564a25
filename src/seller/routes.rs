// src/seller/routes.rs

use super::handlers;
use axum::{
    routing::{get, post},
    Router,
};

/// Creates the seller portal router
pub fn seller_routes() -> Router {
    Router::new()
        // Signup flow
        .route("/api/seller/signup/send-otp", post(handlers::signup_send_otp))
        .route(
            "/api/seller/signup/verify-otp",
            post(handlers::signup_verify_otp),
        )
        .route("/api/seller/signup/complete", post(handlers::signup_complete))
        // Login flow
        .route("/api/seller/login/send-otp", post(handlers::login_send_otp))
        .route("/api/seller/login/verify", post(handlers::login_verify))
        .route("/api/seller/logout", post(handlers::logout))
        // Session
        .route("/api/seller/me", get(handlers::me))
}
