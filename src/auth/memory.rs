use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::{
    hash_password, new_access_token, verify_password, AuthError, AuthService, Identity, Session,
};

struct Account {
    identity: Identity,
    password_hash: String,
}

/// In-process auth service used by tests and local runs without Postgres.
pub struct MemoryAuthService {
    accounts: Mutex<HashMap<String, Account>>,
    sessions: Mutex<HashMap<String, Session>>,
    session_ttl: Duration,
    unavailable: AtomicBool,
}

impl MemoryAuthService {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(24))
    }

    pub fn with_ttl(session_ttl: Duration) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            session_ttl,
            unavailable: AtomicBool::new(false),
        }
    }

    /// Makes every call fail as if the provider were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::Backend("auth service unavailable".into()));
        }
        Ok(())
    }
}

impl Default for MemoryAuthService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthService for MemoryAuthService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.check_available()?;
        let key = email.trim().to_lowercase();
        let password_hash = hash_password(password)?;

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&key) {
            return Err(AuthError::AlreadyRegistered);
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: key.clone(),
        };
        accounts.insert(
            key,
            Account {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.check_available()?;
        let key = email.trim().to_lowercase();

        let identity = {
            let accounts = self.accounts.lock().unwrap();
            let account = accounts.get(&key).ok_or(AuthError::InvalidCredentials)?;
            if !verify_password(password, &account.password_hash) {
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };

        let session = Session {
            access_token: new_access_token(),
            user: identity,
            expires_at: Utc::now() + self.session_ttl,
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session.access_token.clone(), session.clone());
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.check_available()?;
        self.sessions.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        self.check_available()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(access_token)
            .filter(|s| s.expires_at > Utc::now())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = MemoryAuthService::new();
        auth.sign_up("Ada@Example.com", "pw-123456").await.unwrap();

        let err = auth.sign_up("ada@example.com", "other-pw").await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyRegistered));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let auth = MemoryAuthService::new();
        auth.sign_up("ada@example.com", "pw-123456").await.unwrap();

        let err = auth
            .sign_in_with_password("ada@example.com", "nope")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = auth
            .sign_in_with_password("nobody@example.com", "pw-123456")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn expired_sessions_are_absent() {
        let auth = MemoryAuthService::with_ttl(Duration::seconds(-1));
        auth.sign_up("ada@example.com", "pw-123456").await.unwrap();
        let session = auth
            .sign_in_with_password("ada@example.com", "pw-123456")
            .await
            .unwrap();

        assert!(auth.get_session(&session.access_token).await.unwrap().is_none());
    }
}
