use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::models::MoodEntry;
use crate::tracker::moods::{self, MoodForm};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/moods", get(list_moods).post(log_mood))
        .with_state(state)
}

async fn log_mood(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<MoodForm>, JsonRejection>,
) -> Result<Json<ActionResponse<MoodEntry>>, AppError> {
    let Json(form) = body?;
    let mood = moods::log_mood(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(mood))
}

async fn list_moods(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<MoodEntry>>>, AppError> {
    let rows = moods::list_moods(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(rows))
}
