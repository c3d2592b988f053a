use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::models::{Deleted, Reminder};
use crate::tracker::reminders::{self, ReminderForm};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/reminders", get(list_reminders).post(add_reminder))
        .route("/reminders/:id", delete(delete_reminder))
        .with_state(state)
}

async fn add_reminder(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<ReminderForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Reminder>>, AppError> {
    let Json(form) = body?;
    let reminder = reminders::add_reminder(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(reminder))
}

async fn delete_reminder(
    State(state): State<AppState>,
    session: SessionResolver,
    Path(id): Path<String>,
) -> Result<Json<ActionResponse<Deleted>>, AppError> {
    let deleted = reminders::delete_reminder(state.store.as_ref(), &session, &id).await?;
    Ok(ActionResponse::ok(deleted))
}

async fn list_reminders(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<Reminder>>>, AppError> {
    let rows = reminders::list_reminders(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(rows))
}
