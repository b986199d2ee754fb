use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::user::{self, Roles};
use crate::errors::ServiceError;

/// Role granted to every newly registered account.
const DEFAULT_ROLE: &str = "USER";

/// Service for account creation and credential verification.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a new account. Username is checked before email so the caller
    /// sees the username conflict when both are taken.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> Result<user::Model, ServiceError> {
        let db = &*self.db;

        if user::Entity::find()
            .filter(user::Column::Username.eq(&username))
            .one(db)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyExists(
                "Username is already taken".to_string(),
            ));
        }

        if user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(db)
            .await?
            .is_some()
        {
            return Err(ServiceError::AlreadyExists(
                "Email is already in use".to_string(),
            ));
        }

        let now = Utc::now();
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(hash_password(&password)?),
            roles: Set(Roles(vec![DEFAULT_ROLE.to_string()])),
            enabled: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(user_id = %created.id, username = %created.username, "user registered");
        Ok(created)
    }

    /// Verifies a username/password pair. Unknown users, disabled accounts,
    /// and wrong passwords all surface as the same authentication failure.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await?;

        let Some(user) = found else {
            return Err(ServiceError::AuthenticationFailed);
        };
        if !user.enabled {
            return Err(ServiceError::AuthenticationFailed);
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(ServiceError::AuthenticationFailed);
        }

        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| ServiceError::InternalError(format!("stored hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
