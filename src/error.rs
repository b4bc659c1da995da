// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Every failure that may reach a client goes through here so the transport
/// layer can pick the status code from the error kind.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (storage and other infrastructure failures)
    InternalServerError(String),

    // 400 Bad Request (invalid input, e.g. an empty answer map)
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found (user, topic or question)
    NotFound(String),

    // 409 Conflict (duplicate email, contended streak update)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON body `{"error": ...}` with the matching status.
/// Internal details are logged and never sent to the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Storage failures surface as 500s. Allows `?` on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::InternalServerError("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::AuthError("no".into()), StatusCode::UNAUTHORIZED),
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
