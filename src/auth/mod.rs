//! Token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user's id, profile, and roles. A
//! logged-out token keeps a valid signature until natural expiry, so every
//! verification also consults the in-memory [`TokenRegistry`] of revoked
//! token ids.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user;
use crate::errors::ServiceError;

mod token_registry;

pub use token_registry::TokenRegistry;

/// Claim structure for issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    /// Unique id for this token, the unit of revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Identity resolved from a verified bearer token, attached to the request
/// extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub token_id: String,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_expiration,
        }
    }
}

/// Issues and validates bearer tokens and tracks early invalidation.
#[derive(Debug)]
pub struct AuthService {
    config: AuthConfig,
    registry: TokenRegistry,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            registry: TokenRegistry::new(),
        }
    }

    /// Generate a signed token for a user.
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let expires_at = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| ServiceError::InternalError("invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles.0.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("token creation failed: {}", e)))
    }

    /// Validate a token's signature, expiry, issuer, and audience, then check
    /// it has not been revoked.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.jwt_issuer]);
        validation.set_audience(&[&self.config.jwt_audience]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::Unauthorized("Token has expired".to_string())
            }
            _ => ServiceError::Unauthorized("Invalid authentication token".to_string()),
        })?
        .claims;

        if self.registry.is_invalidated(&claims.jti) {
            return Err(ServiceError::Unauthorized(
                "Token has been revoked".to_string(),
            ));
        }

        Ok(claims)
    }

    /// Revoke a token ahead of its natural expiry.
    pub fn revoke_token(&self, token: &str) -> Result<(), ServiceError> {
        let claims = self.validate_token(token)?;
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        self.registry.invalidate(claims.jti, expires_at);
        Ok(())
    }

    fn current_user(&self, claims: Claims) -> Result<CurrentUser, ServiceError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::Unauthorized("Invalid authentication token".to_string()))?;
        Ok(CurrentUser {
            user_id,
            username: claims.username,
            email: claims.email,
            roles: claims.roles,
            token_id: claims.jti,
        })
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Middleware guarding every inventory route: verifies the bearer token and
/// attaches the resolved [`CurrentUser`] to the request.
pub async fn require_auth(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        ServiceError::Unauthorized("No authentication token provided".to_string())
    })?;

    let claims = auth.validate_token(token)?;
    let user = auth.current_user(claims)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Roles;

    fn test_service(expiration: Duration) -> AuthService {
        AuthService::new(AuthConfig::new(
            "test_secret_key_for_testing_purposes_only_32chars".to_string(),
            "inventoria-auth".to_string(),
            "inventoria-api".to_string(),
            expiration,
        ))
    }

    fn test_user() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            roles: Roles(vec!["USER".to_string()]),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let service = test_service(Duration::from_secs(3600));
        let user = test_user();

        let token = service.generate_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["USER".to_string()]);
    }

    #[test]
    fn revoked_token_is_rejected() {
        let service = test_service(Duration::from_secs(3600));
        let token = service.generate_token(&test_user()).unwrap();

        service.revoke_token(&token).unwrap();

        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn revocation_is_per_token_not_per_user() {
        let service = test_service(Duration::from_secs(3600));
        let user = test_user();
        let first = service.generate_token(&user).unwrap();
        let second = service.generate_token(&user).unwrap();

        service.revoke_token(&first).unwrap();

        assert!(service.validate_token(&first).is_err());
        assert!(service.validate_token(&second).is_ok());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let service = test_service(Duration::from_secs(3600));
        let other = AuthService::new(AuthConfig::new(
            "another_secret_key_for_testing_that_is_long_enough".to_string(),
            "inventoria-auth".to_string(),
            "inventoria-api".to_string(),
            Duration::from_secs(3600),
        ));

        let token = other.generate_token(&test_user()).unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
