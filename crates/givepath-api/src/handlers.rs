//! API request handlers

use axum::http::StatusCode;
use axum::Json;
use givepath_common::Error;
use serde::Serialize;
use tracing::error;

pub mod admin_users;
pub mod campaigns;
pub mod donations;
pub mod email_campaigns;
pub mod health;
pub mod newsletter;

/// Error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Map a domain error onto an HTTP response.
///
/// Server-side errors are logged here and reported with a generic
/// message; client errors carry their description through.
pub fn error_response(err: Error) -> (StatusCode, Json<ErrorResponse>) {
    let status = StatusCode::from_u16(err.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if status.is_server_error() {
        error!("Request failed: {}", err);
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            error: err.code().to_string(),
            message,
        }),
    )
}

/// 404 with a consistent body
pub fn not_found(what: &str) -> (StatusCode, Json<ErrorResponse>) {
    error_response(Error::NotFound(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_errors_keep_their_message() {
        let (status, body) = error_response(Error::Validation("Amount must be positive".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "VALIDATION_ERROR");
        assert_eq!(body.message, "Validation error: Amount must be positive");
    }

    #[test]
    fn database_errors_are_not_leaked() {
        let (status, body) = error_response(Error::Database("connection refused".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn gateway_errors_map_to_bad_gateway() {
        let (status, _) = error_response(Error::PaymentGateway("timeout".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
