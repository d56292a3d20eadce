//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed ids, bodies, queries).
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    let status = match &err {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Validation(_) | DomainError::EmptyCart => StatusCode::BAD_REQUEST,
        DomainError::Duplicate(_) | DomainError::InsufficientStock { .. } => StatusCode::CONFLICT,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::Auth => StatusCode::UNAUTHORIZED,
        DomainError::Store(store_err) => match store_err {
            StoreError::StockConflict { .. } | StoreError::UniqueViolation(_) => {
                StatusCode::CONFLICT
            }
            _ => {
                tracing::error!(error = %store_err, "store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
    };
    (status, err.to_string())
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: DomainError) -> StatusCode {
        domain_error_to_response(err).0
    }

    #[test]
    fn status_mapping_is_stable() {
        assert_eq!(
            status_of(DomainError::not_found("Order", "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DomainError::Validation("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(DomainError::Duplicate("dup".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::InsufficientStock {
                product_names: vec!["Widget".to_string()]
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(DomainError::Forbidden("no".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(DomainError::Auth), StatusCode::UNAUTHORIZED);
    }
}
