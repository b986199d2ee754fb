use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use inventoria_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db, AppState,
};

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness spinning up the full router over an in-memory SQLite
/// database. Each instance gets fresh state.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new("sqlite::memory:", TEST_JWT_SECRET, "127.0.0.1", 0);
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        );
        let auth = Arc::new(AuthService::new(auth_cfg));
        let state = AppState::new(Arc::new(pool), cfg, auth);
        let router = inventoria_api::api_routes(state.clone());

        Self { router, state }
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Register an account and return its bearer token.
    pub async fn register_user(&self, username: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/register",
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": "correct-horse-battery",
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), 200, "registration should succeed");

        let body = response_json(response).await;
        body["token"]
            .as_str()
            .expect("registration response carries a token")
            .to_string()
    }

    /// Create an item for the given token and return its response body.
    #[allow(dead_code)]
    pub async fn create_item(&self, token: &str, payload: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/inventory", Some(payload), Some(token))
            .await;
        assert_eq!(response.status(), 201, "item creation should succeed");
        response_json(response).await
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
