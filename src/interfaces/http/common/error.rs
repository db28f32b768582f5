//! `DomainError` as an HTTP response

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_)
        | DomainError::NoFieldsProvided
        | DomainError::UsernameTaken(_)
        | DomainError::EmailTaken => StatusCode::BAD_REQUEST,
        DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::UserNotFound | DomainError::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::ServerConfiguration(_) | DomainError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = match &self {
            DomainError::Internal(detail) => {
                error!(detail = %detail, "Internal error while handling request");
                "An internal error occurred".to_string()
            }
            DomainError::ServerConfiguration(detail) => {
                error!(detail = %detail, "Server configuration error");
                "Server configuration error".to_string()
            }
            other => other.to_string(),
        };
        let body = ApiResponse::<()>::error(self.code(), message);
        (status, Json(body)).into_response()
    }
}
