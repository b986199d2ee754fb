use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::bearer_token;
use crate::errors::ServiceError;
use crate::handlers::common::{success_response, validate_input};
use crate::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token plus profile returned by register and login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub username: String,
    pub email: String,
}

impl AuthResponse {
    fn bearer(token: String, username: String, email: String) -> Self {
        Self {
            token,
            token_type: "Bearer".to_string(),
            username,
            email,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Register a new account and log it in with one round trip.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, token issued", body = AuthResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username or email already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    info!(username = %payload.username, "POST /api/auth/register");

    let user = state
        .users
        .register(payload.username, payload.email, payload.password)
        .await?;
    // The account was just created from these credentials; issue the token
    // directly instead of re-verifying the password we hashed a moment ago.
    let token = state.auth.generate_token(&user)?;

    Ok(success_response(AuthResponse::bearer(
        token,
        user.username,
        user.email,
    )))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;
    info!(username = %payload.username, "POST /api/auth/login");

    let user = state
        .users
        .authenticate(&payload.username, &payload.password)
        .await?;
    let token = state.auth.generate_token(&user)?;

    Ok(success_response(AuthResponse::bearer(
        token,
        user.username,
        user.email,
    )))
}

/// Invalidate the presented token ahead of its natural expiry.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Token invalidated"),
        (status = 400, description = "Authorization header missing or malformed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Token invalid or already revoked", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ServiceError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        ServiceError::BadRequest("Invalid or missing Authorization header".to_string())
    })?;

    state.auth.revoke_token(token)?;
    info!("POST /api/auth/logout");

    Ok(success_response(json!({
        "message": "Logged out successfully"
    })))
}
