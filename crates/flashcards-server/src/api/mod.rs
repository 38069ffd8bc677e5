// ABOUTME: Request handlers for the flashcards API and the JSON response envelope they share.
// ABOUTME: Organized into account routes, the entity handler seam, and the folder/card handlers.

pub mod accounts;
pub mod cards;
pub mod folders;
pub mod handler;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flashcards_core::ValidationError;
use serde::Serialize;
use serde_json::{Value, json};

use crate::session::AuthError;

/// A finished API answer: a status code plus the `{"status", "data"|"message"}`
/// envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// 200 with `payload` under `data`.
    pub fn data(payload: impl Serialize) -> Self {
        match serde_json::to_value(payload) {
            Ok(data) => Self {
                status: StatusCode::OK,
                body: json!({ "status": "success", "data": data }),
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response payload");
                Self::internal()
            }
        }
    }

    /// 200 with `{"message": text}` under `data`.
    pub fn message(text: impl Into<String>) -> Self {
        Self::data(json!({ "message": text.into() }))
    }

    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "status": "error", "message": message.into() }),
        }
    }

    pub fn internal() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ValidationError> for ApiResponse {
    fn from(err: ValidationError) -> Self {
        Self::error(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<AuthError> for ApiResponse {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Storage => Self::internal(),
            other => Self::error(StatusCode::UNAUTHORIZED, other.to_string()),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Run store-bound work on the blocking pool. A panic or cancellation there
/// becomes a 500 instead of reaching the connection.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiResponse>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        ApiResponse::internal()
    })
}
