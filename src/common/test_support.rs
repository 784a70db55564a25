// Shared fixtures for HTTP-level tests

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::Arc;

use super::config::AppConfig;
use super::migrations::run_migrations;
use super::state::AppState;
use crate::services::email::testing::RecordingMailer;
use crate::services::{MemoryStore, OtpService};

pub const TEST_SECRET: &str = "test_secret_key";
pub const TEST_ADMINS: &str =
    "root@market.example:super_admin:Root,mod@market.example:moderator:Mod";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_mailer(RecordingMailer::default()).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        let env: HashMap<&str, &str> =
            HashMap::from([("JWT_SECRET", TEST_SECRET), ("ADMIN_EMAILS", TEST_ADMINS)]);
        let lookup = move |key: &str| env.get(key).map(|v| v.to_string());
        let config = AppConfig::from_lookup(&lookup).unwrap();

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();

        let mailer = Arc::new(mailer);
        let otp = OtpService::new(
            Arc::new(MemoryStore::new()),
            mailer.clone(),
            config.otp.clone(),
        );
        let state = Arc::new(AppState::new(pool, config, otp));

        Self {
            router: crate::build_router(state.clone()),
            state,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        use tower::ServiceExt;
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value, cookie: Option<&str>) -> Response {
        self.send(json_request(Method::POST, uri, Some(body), cookie)).await
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        self.send(json_request(Method::GET, uri, None, cookie)).await
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    body: Option<Value>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` pair from the response's `Set-Cookie` header
pub fn session_cookie_from(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookie| cookie.split(';').next())
        .map(str::to_string)
}
