use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub const UNAUTHENTICATED_MESSAGE: &str = "You must be logged in";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("You must be logged in")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Persistence(String),

    #[error("An unexpected error occurred")]
    Unexpected(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            tracing::error!("❌ DB call failed: {}", db_err.message());

            if let Some(code) = db_err.code() {
                tracing::info!("ℹ️ SQLSTATE code: {}", code);
            }

            if let Some(constraint) = db_err.constraint() {
                tracing::info!("🔒 Constraint violated: {}", constraint);
            }

            AppError::Persistence(db_err.message().to_string())
        } else {
            tracing::error!("❌ Unknown DB error: {}", e);
            AppError::Persistence(e.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

/// Uniform `{success, data|error}` envelope returned by every action.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ActionResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Unexpected(e) = &self {
            tracing::error!("❌ Unexpected error: {:?}", e);
        }

        let body = ActionResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
