//! Tests for admin module
//!
//! Admin login by emailed code and the seller management endpoints,
//! including role checks.

#[cfg(test)]
mod tests {
    use crate::auth::models::SellerStatus;
    use crate::common::test_support::{json_request, read_json, session_cookie_from, TestApp};
    use crate::seller::services::SellerService;
    use axum::http::{header, Method, StatusCode};
    use axum::response::Response;
    use serde_json::json;

    const ROOT: &str = "root@market.example";
    const MODERATOR: &str = "mod@market.example";

    async fn admin_login(app: &TestApp, email: &str) -> String {
        let response = app
            .post_json("/api/admin/login/send-otp", json!({ "email": email }), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let code = app.mailer.last_code_for(email).unwrap();

        let response = app
            .post_json(
                "/api/admin/login/verify",
                json!({ "email": email, "otp": code }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie_from(&response).unwrap()
    }

    async fn patch_status(app: &TestApp, seller_id: &str, status: &str, cookie: &str) -> Response {
        app.send(json_request(
            Method::PATCH,
            &format!("/api/admin/sellers/{}/status", seller_id),
            Some(json!({ "status": status, "reason": "documents checked" })),
            Some(cookie),
        ))
        .await
    }

    #[tokio::test]
    async fn test_admin_login_and_me() {
        let app = TestApp::new().await;
        let cookie = admin_login(&app, "Root@Market.example").await;
        assert!(cookie.starts_with("admin_access="));

        let response = app.get("/api/admin/me", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["admin"]["email"], ROOT);
        assert_eq!(body["admin"]["role"], "super_admin");
        assert!(body["admin"]["permissions"]
            .as_array()
            .unwrap()
            .contains(&json!("sellers.approve")));
    }

    #[tokio::test]
    async fn test_unknown_admin_gets_uniform_answer() {
        let app = TestApp::new().await;

        let known = app
            .post_json("/api/admin/login/send-otp", json!({ "email": ROOT }), None)
            .await;
        let unknown = app
            .post_json(
                "/api/admin/login/send-otp",
                json!({ "email": "intruder@market.example" }),
                None,
            )
            .await;

        assert_eq!(known.status(), StatusCode::OK);
        assert_eq!(unknown.status(), StatusCode::OK);
        assert_eq!(read_json(known).await, read_json(unknown).await);
        assert_eq!(app.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_admin_verify_wrong_code() {
        let app = TestApp::new().await;
        app.post_json("/api/admin/login/send-otp", json!({ "email": ROOT }), None)
            .await;
        let code = app.mailer.last_code_for(ROOT).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        let response = app
            .post_json(
                "/api/admin/login/verify",
                json!({ "email": ROOT, "otp": wrong }),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(session_cookie_from(&response).is_none());
        let body = read_json(response).await;
        assert_eq!(body["code"], "OTP_MISMATCH");
        assert_eq!(body["attemptsRemaining"], 4);
    }

    #[tokio::test]
    async fn test_seller_session_is_rejected_by_admin_routes() {
        let app = TestApp::new().await;
        let sellers = SellerService::new(app.state.db.clone());
        let seller = sellers.create("shop@shop.example", "Shop").await.unwrap();

        let token = app
            .state
            .tokens
            .issue(seller.to_principal(), chrono::Duration::hours(1))
            .unwrap();

        let response = app
            .get("/api/admin/me", Some(&format!("seller_access={}", token)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Same token presented under the admin cookie name.
        let response = app
            .get("/api/admin/sellers", Some(&format!("admin_access={}", token)))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(read_json(response).await["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_list_sellers_with_filter() {
        let app = TestApp::new().await;
        let sellers = SellerService::new(app.state.db.clone());
        let first = sellers.create("one@shop.example", "One").await.unwrap();
        sellers.create("two@shop.example", "Two").await.unwrap();
        sellers
            .update_status(&first.id, SellerStatus::Approved)
            .await
            .unwrap();

        let cookie = admin_login(&app, MODERATOR).await;

        let response = app.get("/api/admin/sellers", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["total"], 2);

        let response = app
            .get("/api/admin/sellers?status=approved", Some(&cookie))
            .await;
        let body = read_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["sellers"][0]["email"], "one@shop.example");

        let response = app
            .get("/api/admin/sellers?status=archived", Some(&cookie))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_moderator_cannot_change_status() {
        let app = TestApp::new().await;
        let seller = SellerService::new(app.state.db.clone())
            .create("shop@shop.example", "Shop")
            .await
            .unwrap();
        let cookie = admin_login(&app, MODERATOR).await;

        let response = patch_status(&app, &seller.id, "approved", &cookie).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(read_json(response).await["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_super_admin_approves_seller() {
        let app = TestApp::new().await;
        let seller = SellerService::new(app.state.db.clone())
            .create("shop@shop.example", "Shop")
            .await
            .unwrap();
        let cookie = admin_login(&app, ROOT).await;

        let response = patch_status(&app, &seller.id, "approved", &cookie).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["seller"]["status"], "approved");

        let response = patch_status(&app, "missing-id", "approved", &cookie).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = patch_status(&app, &seller.id, "archived", &cookie).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_admin_logout_expires_cookie() {
        let app = TestApp::new().await;
        let cookie = admin_login(&app, ROOT).await;

        let response = app.post_json("/api/admin/logout", json!({}), Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("admin_access=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
