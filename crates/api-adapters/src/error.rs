//! HTTP mapping of the domain error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domains::DomainError;
use serde::Serialize;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

pub type ApiResult<T> = Result<T, ApiError>;

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::Validation(_) | DomainError::UnknownCommand(_) => StatusCode::BAD_REQUEST,
            DomainError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::UnknownCommand(_) => "UNKNOWN_COMMAND",
            DomainError::RateLimited(_) => "RATE_LIMITED",
            DomainError::Forbidden(_) => "FORBIDDEN",
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match &self.0 {
            DomainError::Storage(detail) => {
                error!(%detail, "storage failure while handling request");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::UnknownCommand("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::storage("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).into_response().status(), status);
        }
    }
}
