use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRef,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{user, User},
    errors::ServiceError,
    AppState,
};

/// Role strings stored on the user row and carried in JWT claims.
pub mod roles {
    pub const STUDENT: &str = "student";
    pub const INSTRUCTOR: &str = "instructor";
    pub const ADMIN: &str = "admin";
}

const TOKEN_USE_ACCESS: &str = "access";
const TOKEN_USE_REFRESH: &str = "refresh";

/// JWT claims for both access and refresh tokens, distinguished by
/// `token_use`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub token_use: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
}

/// Authentication configuration.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Access/refresh token pair returned by login and refresh.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
}

/// Issues and validates tokens and manages account credentials.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Creates a new student account. Fails with Conflict when the email is
    /// already registered.
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let existing = User::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Email is already registered".to_string(),
            ));
        }

        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            role: Set(roles::STUDENT.to_string()),
            created_at: Set(Utc::now()),
        };

        Ok(account.insert(&*self.db).await?)
    }

    /// Verifies credentials and issues a token pair.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(user::Model, TokenPair), ServiceError> {
        let account = User::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Invalid credentials".to_string()))?;

        if !verify_password(password, &account.password_hash) {
            return Err(ServiceError::AuthError("Invalid credentials".to_string()));
        }

        let tokens = self.issue_tokens(&account)?;
        Ok((account, tokens))
    }

    /// Exchanges a valid refresh token for a fresh pair (stateless rotation).
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.decode_token(refresh_token)?;
        if claims.token_use != TOKEN_USE_REFRESH {
            return Err(ServiceError::AuthError(
                "Refresh token required".to_string(),
            ));
        }

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::AuthError("Malformed token subject".to_string()))?;
        let account = User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Account no longer exists".to_string()))?;

        self.issue_tokens(&account)
    }

    /// Validates an access token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let claims = self.decode_token(token)?;
        if claims.token_use != TOKEN_USE_ACCESS {
            return Err(ServiceError::AuthError("Access token required".to_string()));
        }
        Ok(claims)
    }

    pub fn issue_tokens(&self, account: &user::Model) -> Result<TokenPair, ServiceError> {
        Ok(TokenPair {
            access_token: self.encode_token(
                account,
                TOKEN_USE_ACCESS,
                self.config.access_token_expiration,
            )?,
            refresh_token: self.encode_token(
                account,
                TOKEN_USE_REFRESH,
                self.config.refresh_token_expiration,
            )?,
        })
    }

    fn encode_token(
        &self,
        account: &user::Model,
        token_use: &str,
        lifetime: Duration,
    ) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.to_string(),
            email: account.email.clone(),
            role: account.role.clone(),
            token_use: token_use.to_string(),
            iat: now.timestamp() as usize,
            exp: (now.timestamp() + lifetime.as_secs() as i64) as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token encoding failed: {e}")))
    }

    fn decode_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ServiceError::AuthError(format!("Invalid token: {e}")))
    }
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Password hashing failed: {e}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Caller identity extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(roles::ADMIN)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::AuthError("Missing authorization header".to_string()))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::AuthError("Bearer token required".to_string()))?
            .trim();

        let claims = state.auth.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::AuthError("Malformed token subject".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}
