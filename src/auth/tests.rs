//! Tests for auth module
//!
//! These tests verify the route guards end to end:
//! - A rejected request never reaches the guarded handler
//! - Seller and admin sessions are not interchangeable
//! - Expired and tampered tokens are refused

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::common::test_support::{json_request, read_json, TestApp, TEST_SECRET};
    use crate::common::CookieConfig;
    use axum::{
        extract::Extension,
        http::{Method, StatusCode},
        routing::get,
        Router,
    };
    use chrono::Duration;
    use models::{AdminRole, SellerStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Router whose single handler counts how often it runs
    fn spy_router(app: &TestApp) -> (Router, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seller_hits = hits.clone();
        let admin_hits = hits.clone();

        let router = Router::new()
            .route(
                "/seller-only",
                get(move |extractors::Authenticated(seller): SellerSession| {
                    let hits = seller_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        seller.user_id
                    }
                }),
            )
            .route(
                "/admin-only",
                get(move |extractors::Authenticated(admin): AdminSession| {
                    let hits = admin_hits.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        admin.user_id
                    }
                }),
            )
            .layer(Extension(app.state.clone()));

        (router, hits)
    }

    async fn call(router: &Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
        use tower::ServiceExt;
        router
            .clone()
            .oneshot(json_request(Method::GET, uri, None, cookie))
            .await
            .unwrap()
    }

    fn seller() -> Principal {
        Principal::Seller(SellerPrincipal {
            user_id: "sel_guard".to_string(),
            email: "guard@shop.example".to_string(),
            business_name: "Guard Shop".to_string(),
            verified: true,
            status: SellerStatus::Approved,
        })
    }

    fn admin() -> Principal {
        Principal::Admin(AdminPrincipal {
            user_id: "adm_guard".to_string(),
            email: "root@market.example".to_string(),
            name: "Root".to_string(),
            role: AdminRole::SuperAdmin,
            permissions: AdminRole::SuperAdmin.permissions(),
        })
    }

    #[tokio::test]
    async fn test_guard_rejects_before_handler_runs() {
        let app = TestApp::new().await;
        let (router, hits) = spy_router(&app);

        let response = call(&router, "/seller-only", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["error"], "Authentication required");

        let response = call(&router, "/admin-only", Some("admin_access=garbage")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guard_admits_matching_session() {
        let app = TestApp::new().await;
        let (router, hits) = spy_router(&app);

        let token = app.state.tokens.issue(seller(), Duration::hours(1)).unwrap();
        let response = call(&router, "/seller-only", Some(&format!("seller_access={}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let token = app.state.tokens.issue(admin(), Duration::hours(1)).unwrap();
        let response = call(&router, "/admin-only", Some(&format!("admin_access={}", token))).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_sessions_are_not_interchangeable() {
        let app = TestApp::new().await;
        let (router, hits) = spy_router(&app);

        let admin_token = app.state.tokens.issue(admin(), Duration::hours(1)).unwrap();
        let seller_token = app.state.tokens.issue(seller(), Duration::hours(1)).unwrap();

        // Right cookie name, wrong principal type
        let response = call(
            &router,
            "/seller-only",
            Some(&format!("seller_access={}", admin_token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = call(
            &router,
            "/admin-only",
            Some(&format!("admin_access={}", seller_token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Holding both cookies still grants only what each guard asks for
        let both = format!("seller_access={}; admin_access={}", seller_token, admin_token);
        assert_eq!(call(&router, "/seller-only", Some(&both)).await.status(), StatusCode::OK);
        assert_eq!(call(&router, "/admin-only", Some(&both)).await.status(), StatusCode::OK);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_and_foreign_tokens_are_refused() {
        let app = TestApp::new().await;
        let (router, hits) = spy_router(&app);

        let expired = app.state.tokens.issue(seller(), Duration::seconds(-1)).unwrap();
        let response = call(&router, "/seller-only", Some(&format!("seller_access={}", expired))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let foreign = TokenService::new("another_secret", CookieConfig::default())
            .issue(seller(), Duration::hours(1))
            .unwrap();
        let response = call(&router, "/seller-only", Some(&format!("seller_access={}", foreign))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Control: the same claims signed with the configured secret pass
        let genuine = TokenService::new(TEST_SECRET, CookieConfig::default())
            .issue(seller(), Duration::hours(1))
            .unwrap();
        let response = call(&router, "/seller-only", Some(&format!("seller_access={}", genuine))).await;
        assert_eq!(response.status(), StatusCode::OK);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
