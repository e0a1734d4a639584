use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::{ProjectionError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Invalid request: {0}")]
    MalformedRequest(String),

    #[error("Not found")]
    NotFound,
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Projection(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Projection(ProjectionError::Validation(_)) | ApiError::MalformedRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Projection(ProjectionError::Overflow { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Projection(err) => err.kind(),
            ApiError::MalformedRequest(_) => "malformed",
            ApiError::NotFound => "not-found",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        super::json_response(
            self.status(),
            ErrorResponse {
                error: self.to_string(),
                kind: self.kind(),
            },
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
