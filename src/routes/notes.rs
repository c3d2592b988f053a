use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::models::{Deleted, Note};
use crate::tracker::notes::{self, NoteForm};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/notes", get(list_notes).post(add_note))
        .route("/notes/:id", put(update_note).delete(delete_note))
        .with_state(state)
}

async fn add_note(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<NoteForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Note>>, AppError> {
    let Json(form) = body?;
    let note = notes::add_note(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(note))
}

async fn update_note(
    State(state): State<AppState>,
    session: SessionResolver,
    Path(id): Path<String>,
    body: Result<Json<NoteForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Option<Note>>>, AppError> {
    let Json(form) = body?;
    let note = notes::update_note(state.store.as_ref(), &session, &id, form).await?;
    Ok(ActionResponse::ok(note))
}

async fn delete_note(
    State(state): State<AppState>,
    session: SessionResolver,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse<Deleted>>, AppError> {
    let deleted = notes::delete_note(state.store.as_ref(), &session, &id).await?;
    Ok(ActionResponse::ok(deleted))
}

async fn list_notes(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<Note>>>, AppError> {
    let rows = notes::list_notes(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(rows))
}
