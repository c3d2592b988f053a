use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};

use super::AppState;
use crate::auth::{Identity, Session, SessionResolver};
use crate::error::{ActionResponse, AppError};
use crate::models::Profile;
use crate::tracker::account::{self, SignInForm, SignUpForm};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/profile", get(get_profile))
        .with_state(state)
}

async fn sign_up(
    State(state): State<AppState>,
    body: Result<Json<SignUpForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Identity>>, AppError> {
    let Json(form) = body?;
    let identity = account::sign_up(state.auth.as_ref(), state.store.as_ref(), form).await?;
    Ok(ActionResponse::ok(identity))
}

async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<SignInForm>, JsonRejection>,
) -> Result<Json<ActionResponse<Session>>, AppError> {
    let Json(form) = body?;
    let session = account::sign_in(state.auth.as_ref(), form).await?;
    Ok(ActionResponse::ok(session))
}

async fn sign_out(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<()>>, AppError> {
    account::sign_out(state.auth.as_ref(), &session).await?;
    Ok(ActionResponse::ok(()))
}

async fn get_profile(
    State(state): State<AppState>,
    session: SessionResolver,
) -> Result<Json<ActionResponse<Profile>>, AppError> {
    let profile = account::get_profile(state.store.as_ref(), &session).await?;
    Ok(ActionResponse::ok(profile))
}
