use axum::{
    Router,
    routing::get,
    extract::{State, rejection::JsonRejection},
    Json,
};

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::models::{SymptomEntry, SymptomsByDate};
use crate::tracker::symptoms::{self, SymptomForm};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/symptoms", get(list_symptoms).post(log_symptoms))
        .route("/symptoms/by-date", get(get_symptoms_grouped))
        .with_state(state)
}

async fn log_symptoms(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<SymptomForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Vec<SymptomEntry>>>, AppError> {
    let Json(form) = body?;
    let rows = symptoms::log_symptoms(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(rows))
}

async fn list_symptoms(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<SymptomEntry>>>, AppError> {
    let rows = symptoms::list_symptoms(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(rows))
}

async fn get_symptoms_grouped(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<SymptomsByDate>>>, AppError> {
    let grouped = symptoms::symptoms_by_date(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(grouped))
}
