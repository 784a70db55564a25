// src/admin/routes.rs

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::handlers;

pub fn admin_routes() -> Router {
    Router::new()
        // Admin login flow
        .route("/api/admin/login/send-otp", post(handlers::auth::login_send_otp))
        .route("/api/admin/login/verify", post(handlers::auth::login_verify))
        .route("/api/admin/logout", post(handlers::auth::logout))
        .route("/api/admin/me", get(handlers::auth::me))
        // Seller management endpoints
        .route("/api/admin/sellers", get(handlers::sellers::list_sellers))
        .route(
            "/api/admin/sellers/:id/status",
            patch(handlers::sellers::update_seller_status),
        )
}
