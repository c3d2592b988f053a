//! Authentication port and the per-request session resolver.
//!
//! Handlers never read identity from request bodies. They take a
//! [`SessionResolver`] and call [`SessionResolver::require`] before touching
//! any user data.

mod context;
mod memory;
mod postgres;

pub use context::{SessionContext, SessionSubscription};
pub use memory::MemoryAuthService;
pub use postgres::PgAuthService;

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use uuid::Uuid;

use crate::error::AppError;

/// The authenticated user every user-scoped operation is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub access_token: String,
    pub user: Identity,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("❌ Auth store error: {}", e);
        AuthError::Backend(e.to_string())
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AuthError::Backend(e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::AlreadyRegistered => {
                AppError::Validation(e.to_string())
            }
            AuthError::Backend(msg) => AppError::Persistence(msg),
        }
    }
}

/// External identity provider.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Returns `None` for unknown or expired tokens.
    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError>;
}

pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub(crate) fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("stored password hash is unreadable: {}", e);
            false
        }
    }
}

pub(crate) fn new_access_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Resolves the caller's identity from the bearer token of one request.
#[derive(Clone)]
pub struct SessionResolver {
    auth: Arc<dyn AuthService>,
    access_token: Option<String>,
}

impl SessionResolver {
    pub fn new(auth: Arc<dyn AuthService>, access_token: Option<String>) -> Self {
        Self { auth, access_token }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub async fn resolve(&self) -> Option<Identity> {
        let token = self.access_token.as_deref()?;
        match self.auth.get_session(token).await {
            Ok(session) => session.map(|s| s.user),
            Err(e) => {
                tracing::warn!("session lookup failed: {}", e);
                None
            }
        }
    }

    pub async fn require(&self) -> Result<Identity, AppError> {
        self.resolve().await.ok_or(AppError::Unauthenticated)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionResolver
where
    S: Send + Sync,
    Arc<dyn AuthService>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let access_token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(SessionResolver::new(
            Arc::<dyn AuthService>::from_ref(state),
            access_token,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn resolver_without_token_is_absent() {
        let auth: Arc<dyn AuthService> = Arc::new(MemoryAuthService::new());
        let resolver = SessionResolver::new(auth, None);

        assert!(resolver.resolve().await.is_none());
        assert!(matches!(
            resolver.require().await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn resolver_returns_signed_in_identity() {
        let auth = Arc::new(MemoryAuthService::new());
        let user = auth.sign_up("ada@example.com", "pw-123456").await.unwrap();
        let session = auth
            .sign_in_with_password("ada@example.com", "pw-123456")
            .await
            .unwrap();

        let resolver = SessionResolver::new(auth.clone(), Some(session.access_token.clone()));
        assert_eq!(resolver.require().await.unwrap(), user);

        auth.sign_out(&session.access_token).await.unwrap();
        assert!(resolver.resolve().await.is_none());
    }

    #[tokio::test]
    async fn resolver_treats_backend_failure_as_absent() {
        let auth = Arc::new(MemoryAuthService::new());
        auth.set_unavailable(true);

        let resolver = SessionResolver::new(auth, Some("anything".into()));
        assert!(resolver.resolve().await.is_none());
    }
}
