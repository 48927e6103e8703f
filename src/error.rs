use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::affiliations::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Seaorm(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Template(#[from] minijinja::Error),

    #[error("Affiliation not found")]
    NotFound,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid affiliation: {0}")]
    Validation(ValidationErrors),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
                .into_response(),
            AppError::Seaorm(err) => {
                error!("Database error: {:?}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            AppError::Template(err) => {
                error!("Template error: {:?}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
