//! Authentication service: registration, login and token lifecycle.
//!
//! Tokens are HS256 JWTs. Logout stores the token's `jti` in the cache until
//! the token would have expired, and `verify_token` rejects revoked ids.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::config::{Config, CACHE_PREFIX_REVOKED_TOKEN, TOKEN_TYPE_BEARER};
use crate::domain::slug::{normalize_email, title_case};
use crate::domain::{Actor, NewUser, Password, User, UserResponse, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::{CacheStore, UnitOfWork};

/// Verified against when the email is unknown, so both paths pay for one
/// argon2 verification.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("timing-equaliser")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Token id, used for revocation
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn actor(&self) -> Actor {
        Actor::new(self.sub, self.email.clone(), UserRole::from(self.role.as_str()))
    }
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[serde(rename = "type")]
    #[schema(example = "bearer")]
    pub token_type: String,
}

/// Authentication service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a customer account and sign it in
    async fn register(&self, name: String, email: String, password: String)
        -> AppResult<AuthResponse>;

    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse>;

    /// Revoke the token the claims were read from
    async fn logout(&self, claims: &Claims) -> AppResult<()>;

    /// Decode a bearer token and make sure it has not been revoked
    async fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn issue_token(user: &User, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        jti: Uuid::new_v4(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;
    Ok(token)
}

fn decode_token(token: &str, config: &Config) -> AppResult<Claims> {
    // No leeway: a revocation entry lives exactly until `exp`
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

fn revoked_key(jti: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_REVOKED_TOKEN, jti)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>, config: Config) -> Self {
        Self { uow, cache, config }
    }

    fn respond(&self, user: User) -> AppResult<AuthResponse> {
        let token = issue_token(&user, &self.config)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(
        &self,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<AuthResponse> {
        let email = normalize_email(&email);
        let users = self.uow.repositories().users();

        if users.email_exists(&email).await? {
            return Err(AppError::validation(
                "email",
                "The Email Address has already been taken.",
            ));
        }

        let password_hash = Password::new(&password)?.into_string();
        let user = users
            .create(NewUser {
                name: title_case(&name),
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        self.respond(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<AuthResponse> {
        let email = normalize_email(&email);
        let user = self.uow.repositories().users().find_by_email(&email).await?;

        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::from_hash(DUMMY_HASH.clone()),
        };
        let password_valid = stored.verify(&password);

        match user {
            Some(user) if password_valid => self.respond(user),
            _ => Err(AppError::validation(
                "email",
                "The provided credentials are incorrect.",
            )),
        }
    }

    async fn logout(&self, claims: &Claims) -> AppResult<()> {
        let remaining = (claims.exp - Utc::now().timestamp()).max(1) as u64;
        self.cache
            .set_raw(&revoked_key(claims.jti), "1".to_string(), remaining)
            .await?;

        tracing::info!(user_id = %claims.sub, "Token revoked");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode_token(token, &self.config)?;

        if self.cache.exists(&revoked_key(claims.jti)).await? {
            return Err(AppError::Unauthenticated);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("sqlite::memory:", "a-very-long-secret-used-only-in-tests")
    }

    fn signed(claims: &Claims, config: &Config) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(config.jwt_secret_bytes()),
        )
        .unwrap()
    }

    fn claims_expiring_in(seconds: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: Uuid::new_v4(),
            email: "jane@example.com".to_string(),
            role: "customer".to_string(),
            jti: Uuid::new_v4(),
            exp: now + seconds,
            iat: now - 3600,
        }
    }

    #[test]
    fn test_live_token_decodes() {
        let config = config();
        let claims = claims_expiring_in(300);

        let decoded = decode_token(&signed(&claims, &config), &config).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_token_is_rejected_as_soon_as_it_expires() {
        let config = config();
        // Inside the default 60 second leeway
        let claims = claims_expiring_in(-30);

        let err = decode_token(&signed(&claims, &config), &config).unwrap_err();
        assert!(matches!(err, AppError::Jwt(_)));
    }
}
