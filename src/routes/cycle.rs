use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::models::Cycle;
use crate::tracker::cycles::{self, CycleEndForm, CycleStartForm};

#[derive(Deserialize)]
pub struct LocateQuery {
    pub date: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cycle/start", post(start_cycle))
        .route("/cycle/end", post(end_cycle))
        .route("/cycle/locate", get(locate_cycle))
        .route("/cycles", get(list_cycles))
        .with_state(state)
}

async fn start_cycle(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<CycleStartForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Cycle>>, AppError> {
    let Json(form) = body?;
    let cycle = cycles::start_cycle(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(cycle))
}

async fn end_cycle(
    State(state): State<AppState>,
    session: SessionResolver,
    body: Result<Json<CycleEndForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Cycle>>, AppError> {
    let Json(form) = body?;
    let cycle = cycles::end_cycle(state.store.as_ref(), &session, form).await?;
    Ok(ActionResponse::ok(cycle))
}

async fn locate_cycle(
    State(state): State<AppState>,
    session: SessionResolver,
    query: Result<Query<LocateQuery>, QueryRejection>,
) -> Result<Json<ActionResponse<Option<Cycle>>>, AppError> {
    let Query(query) = query?;
    let cycle = cycles::find_cycle_for_date(state.store.as_ref(), &session, query.date.as_deref()).await?;
    Ok(ActionResponse::ok(cycle))
}

async fn list_cycles(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Vec<Cycle>>>, AppError> {
    let rows = cycles::list_cycles(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(rows))
}
