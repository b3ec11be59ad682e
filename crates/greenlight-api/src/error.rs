//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Invalid upload body: {}", .0.body_text())]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Media error: {0}")]
    Media(#[from] greenlight_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] greenlight_storage::StorageError),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            // Preserves 413 from the body limit
            ApiError::Multipart(e) => e.status(),
            ApiError::Internal(_) | ApiError::Media(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = if status.is_server_error() {
            error!(error = %self, "Request failed");
            if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                "An internal error occurred".to_string()
            } else {
                self.to_string()
            }
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use greenlight_models::ModelError;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::internal("x").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let unknown = greenlight_media::MediaError::from(ModelError::unknown_class("bus"));
        assert_eq!(
            ApiError::from(unknown).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_production_hides_internal_detail() {
        std::env::set_var("ENVIRONMENT", "production");
        let response = ApiError::internal("disk layout leaked").into_response();
        std::env::remove_var("ENVIRONMENT");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("An internal error occurred"));
        assert!(!body.contains("disk layout"));
    }
}
