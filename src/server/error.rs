use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::DeckError;
use crate::render::ValidationError;

/// Client-visible message of every 5xx answer.
pub const RENDER_FAILURE: &str = "Failed to generate presentation";

/// Error type of the HTTP handlers.
///
/// Renders as `{"error": "..."}`. Server-side failures are logged with
/// their detail and answered with a fixed message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Render(#[from] DeckError),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::BadRequest(e.0)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
            ApiError::Render(DeckError::Validation(e)) => (StatusCode::BAD_REQUEST, e.0),
            ApiError::Render(DeckError::Timeout { phase }) => {
                tracing::error!(%phase, "render deadline exceeded");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{RENDER_FAILURE}: timed out while {phase}"),
                )
            },
            ApiError::Render(err) => {
                tracing::error!(error = %err, "render failed");
                (StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILURE.to_string())
            },
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, RENDER_FAILURE.to_string())
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Phase;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (status, body) = render(ValidationError::new("Title is required").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Title is required"}));

        let (status, body) = render(ApiError::Render(DeckError::Internal("disk full".into()))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": RENDER_FAILURE}));

        let (_, body) = render(ApiError::Render(DeckError::Timeout {
            phase: Phase::Publishing,
        }))
        .await;
        assert_eq!(
            body,
            json!({"error": "Failed to generate presentation: timed out while publishing"})
        );
    }
}
