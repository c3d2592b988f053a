use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::FromRef,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::auth::AuthService;
use crate::error::AppError;
use crate::store::TrackerStore;

pub mod auth;
pub mod calendar;
pub mod cycle;
pub mod moods;
pub mod notes;
pub mod reminders;
pub mod symptoms;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrackerStore>,
    pub auth: Arc<dyn AuthService>,
}

impl FromRef<AppState> for Arc<dyn AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(auth::routes(state.clone()))
        .merge(cycle::routes(state.clone()))
        .merge(symptoms::routes(state.clone()))
        .merge(moods::routes(state.clone()))
        .merge(notes::routes(state.clone()))
        .merge(reminders::routes(state.clone()))
        .merge(calendar::routes(state))
        .route("/health", get(|| async { "✅ Backend up" }))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Unexpected(anyhow::anyhow!("handler panicked: {}", detail)).into_response()
}
