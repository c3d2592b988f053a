use serde::Deserialize;

use crate::auth::{AuthService, Identity, Session, SessionResolver};
use crate::error::AppError;
use crate::models::Profile;
use crate::store::TrackerStore;

#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignInForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn credentials(email: Option<String>, password: Option<String>) -> Result<(String, String), AppError> {
    let email = email.map(|e| e.trim().to_string()).unwrap_or_default();
    let password = password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Please enter both email and password"));
    }
    Ok((email, password))
}

/// Creates the auth identity, then its profile row.
pub async fn sign_up(
    auth: &dyn AuthService,
    store: &dyn TrackerStore,
    form: SignUpForm,
) -> Result<Identity, AppError> {
    let (email, password) = credentials(form.email, form.password)?;
    let name = form.name.map(|n| n.trim().to_string()).unwrap_or_default();

    let identity = auth.sign_up(&email, &password).await?;
    store.insert_profile(identity.id, &name, &identity.email).await?;

    tracing::info!("👤 registered {}", identity.id);
    Ok(identity)
}

pub async fn sign_in(auth: &dyn AuthService, form: SignInForm) -> Result<Session, AppError> {
    let (email, password) = credentials(form.email, form.password)?;
    Ok(auth.sign_in_with_password(&email, &password).await?)
}

/// Revokes the caller's token, if any. Signing out twice is not an error.
pub async fn sign_out(auth: &dyn AuthService, session: &SessionResolver) -> Result<(), AppError> {
    if let Some(token) = session.access_token() {
        auth.sign_out(token).await?;
    }
    Ok(())
}

pub async fn get_profile(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Profile, AppError> {
    let user = session.require().await?;
    store
        .get_profile(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuthService;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn sign_up_form(email: &str, password: &str, name: &str) -> SignUpForm {
        SignUpForm {
            email: Some(email.into()),
            password: Some(password.into()),
            name: Some(name.into()),
        }
    }

    #[tokio::test]
    async fn sign_up_creates_profile() {
        let auth = Arc::new(MemoryAuthService::new());
        let store = MemoryStore::new();

        let identity = sign_up(auth.as_ref(), &store, sign_up_form("ada@example.com", "pw-123456", " Ada "))
            .await
            .unwrap();
        let session = sign_in(
            auth.as_ref(),
            SignInForm {
                email: Some("ada@example.com".into()),
                password: Some("pw-123456".into()),
            },
        )
        .await
        .unwrap();

        let resolver = SessionResolver::new(auth.clone(), Some(session.access_token));
        let profile = get_profile(&store, &resolver).await.unwrap();
        assert_eq!(profile.id, identity.id);
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "ada@example.com");
    }

    #[tokio::test]
    async fn sign_up_requires_credentials() {
        let auth = MemoryAuthService::new();
        let store = MemoryStore::new();

        let err = sign_up(&auth, &store, sign_up_form("", "pw", "Ada")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter both email and password");
    }

    #[tokio::test]
    async fn profile_failure_is_reported() {
        let auth = MemoryAuthService::new();
        let store = MemoryStore::new();
        store.fail_next_write();

        let err = sign_up(&auth, &store, sign_up_form("ada@example.com", "pw-123456", "Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn sign_out_revokes_session() {
        let auth = Arc::new(MemoryAuthService::new());
        let store = MemoryStore::new();
        sign_up(auth.as_ref(), &store, sign_up_form("ada@example.com", "pw-123456", "Ada"))
            .await
            .unwrap();
        let session = auth
            .sign_in_with_password("ada@example.com", "pw-123456")
            .await
            .unwrap();

        let resolver = SessionResolver::new(auth.clone(), Some(session.access_token));
        sign_out(auth.as_ref(), &resolver).await.unwrap();

        let err = get_profile(&store, &resolver).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }
}
