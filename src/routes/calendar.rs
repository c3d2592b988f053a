use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};

use super::AppState;
use crate::auth::SessionResolver;
use crate::error::{ActionResponse, AppError};
use crate::tracker::calendar::{self, CalendarQuery, MonthGrid};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/calendar", get(get_calendar))
        .with_state(state)
}

async fn get_calendar(
    State(state): State<AppState>,
    session: SessionResolver,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<ActionResponse<MonthGrid>>, AppError> {
    let Query(query) = query?;
    let grid = calendar::month_calendar(state.store.as_ref(), &session, query).await?;
    Ok(ActionResponse::ok(grid))
}
