use serde::Deserialize;
use uuid::Uuid;

use crate::auth::SessionResolver;
use crate::error::AppError;
use crate::models::{parse_date, parse_id, Deleted, Note, NoteFields};
use crate::store::TrackerStore;

#[derive(Debug, Default, Deserialize)]
pub struct NoteForm {
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
}

impl NoteForm {
    fn into_fields(self) -> Result<NoteFields, AppError> {
        let title = self.title.unwrap_or_default();
        let content = self.content.unwrap_or_default();
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(AppError::validation("Please enter both title and content"));
        }

        Ok(NoteFields {
            date: parse_date("date", self.date.as_deref())?,
            title,
            content,
        })
    }
}

pub async fn add_note(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    form: NoteForm,
) -> Result<Note, AppError> {
    let user = session.require().await?;
    store.insert_note(user.id, form.into_fields()?).await
}

/// Updates the caller's note. Another user's id matches nothing and yields `None`.
pub async fn update_note(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    note_id: &str,
    form: NoteForm,
) -> Result<Option<Note>, AppError> {
    let user = session.require().await?;
    let note_id: Uuid = parse_id("id", note_id)?;
    let fields = form.into_fields()?;

    let updated = store.update_note(user.id, note_id, fields).await?;
    if updated.is_none() {
        tracing::debug!("note {} not updated for {}: no matching row", note_id, user.id);
    }
    Ok(updated)
}

pub async fn delete_note(
    store: &dyn TrackerStore,
    session: &SessionResolver,
    note_id: &str,
) -> Result<Deleted, AppError> {
    let user = session.require().await?;
    let note_id = parse_id("id", note_id)?;
    let deleted = store.delete_note(user.id, note_id).await?;
    Ok(Deleted { deleted })
}

pub async fn list_notes(
    store: &dyn TrackerStore,
    session: &SessionResolver,
) -> Result<Vec<Note>, AppError> {
    let user = session.require().await?;
    store.list_notes(user.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, MemoryAuthService};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    async fn sign_in(auth: &Arc<MemoryAuthService>, email: &str) -> SessionResolver {
        auth.sign_up(email, "pw-123456").await.unwrap();
        let session = auth.sign_in_with_password(email, "pw-123456").await.unwrap();
        SessionResolver::new(auth.clone(), Some(session.access_token))
    }

    fn note(title: &str, content: &str) -> NoteForm {
        NoteForm {
            title: Some(title.into()),
            content: Some(content.into()),
            date: Some("2024-05-01".into()),
        }
    }

    #[tokio::test]
    async fn title_and_content_are_required() {
        let store = MemoryStore::new();
        let auth = Arc::new(MemoryAuthService::new());
        let ada = sign_in(&auth, "ada@example.com").await;

        let err = add_note(&store, &ada, note("  ", "body")).await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter both title and content");
        let err = add_note(&store, &ada, note("title", "")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_someone_elses_note_changes_nothing() {
        let store = MemoryStore::new();
        let auth = Arc::new(MemoryAuthService::new());
        let ada = sign_in(&auth, "ada@example.com").await;
        let eve = sign_in(&auth, "eve@example.com").await;

        let theirs = add_note(&store, &ada, note("day 1", "tired")).await.unwrap();
        let result = delete_note(&store, &eve, &theirs.id.to_string()).await.unwrap();

        assert_eq!(result.deleted, 0);
        assert_eq!(store.all_notes(), vec![theirs.clone()]);

        let result = delete_note(&store, &ada, &theirs.id.to_string()).await.unwrap();
        assert_eq!(result.deleted, 1);
        assert!(store.all_notes().is_empty());
    }

    #[tokio::test]
    async fn updating_someone_elses_note_changes_nothing() {
        let store = MemoryStore::new();
        let auth = Arc::new(MemoryAuthService::new());
        let ada = sign_in(&auth, "ada@example.com").await;
        let eve = sign_in(&auth, "eve@example.com").await;

        let theirs = add_note(&store, &ada, note("day 1", "tired")).await.unwrap();
        let updated = update_note(&store, &eve, &theirs.id.to_string(), note("hacked", "x"))
            .await
            .unwrap();
        assert!(updated.is_none());
        assert_eq!(store.all_notes()[0].title, "day 1");

        let updated = update_note(&store, &ada, &theirs.id.to_string(), note("day 1", "better"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "better");
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let store = MemoryStore::new();
        let auth = Arc::new(MemoryAuthService::new());
        let ada = sign_in(&auth, "ada@example.com").await;

        let err = delete_note(&store, &ada, "not-a-uuid").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
