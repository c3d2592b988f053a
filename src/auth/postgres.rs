use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{
    hash_password, new_access_token, verify_password, AuthError, AuthService, Identity, Session,
};

const UNIQUE_VIOLATION: &str = "23505";

/// Password auth backed by the `auth_users` and `auth_sessions` tables.
#[derive(Clone)]
pub struct PgAuthService {
    pool: PgPool,
    session_ttl: Duration,
}

impl PgAuthService {
    pub fn new(pool: PgPool, session_ttl: Duration) -> Self {
        Self { pool, session_ttl }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim().to_lowercase();
        let password_hash = hash_password(password)?;

        let row = sqlx::query(
            "INSERT INTO auth_users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING id, email",
        )
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|d| d.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if duplicate {
                AuthError::AlreadyRegistered
            } else {
                AuthError::from(e)
            }
        })?;

        Ok(Identity {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let email = email.trim().to_lowercase();

        let Some(row) = sqlx::query("SELECT id, email, password_hash FROM auth_users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let password_hash: String = row.try_get("password_hash")?;
        if !verify_password(password, &password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let user = Identity {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        };
        let access_token = new_access_token();
        let expires_at = Utc::now() + self.session_ttl;

        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&access_token)
            .bind(user.id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        tracing::info!("🔑 session opened for {}", user.id);

        Ok(Session {
            access_token,
            user,
            expires_at,
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(access_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_session(&self, access_token: &str) -> Result<Option<Session>, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT s.token, s.expires_at, u.id, u.email
            FROM auth_sessions s
            JOIN auth_users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now()
            "#,
        )
        .bind(access_token)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
        Ok(Some(Session {
            access_token: row.try_get("token")?,
            user: Identity {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
            },
            expires_at,
        }))
    }
}
