use crate::error::OrderProcessError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error returned by HTTP handlers, rendered as `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<OrderProcessError> for ApiError {
    fn from(err: OrderProcessError) -> Self {
        match err {
            OrderProcessError::AlreadyExists(_) => Self::bad_request(err.to_string()),
            OrderProcessError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            other => {
                error!(error = %other, "unexpected error handling request");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let exists: ApiError = OrderProcessError::AlreadyExists("a".to_string()).into();
        assert_eq!(exists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(exists.message(), "order process for order a exists");

        let missing: ApiError = OrderProcessError::NotFound("a".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let broken: ApiError = OrderProcessError::InvariantViolation("x".to_string()).into();
        assert_eq!(broken, ApiError::internal());
    }
}
