//! Mapping of assistant errors to HTTP responses.

use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docqa_core::IndexError;
use docqa_session::{AskError, UploadError};
use tracing::error;

use crate::protocol::ErrorResponse;

/// An error returned from a handler, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn session_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "session_not_found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let status = match &err {
            UploadError::Extraction(_)
            | UploadError::Split(_)
            | UploadError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            UploadError::Index(
                IndexError::Persist { .. } | IndexError::NotFound { .. } | IndexError::Corrupt { .. },
            )
            | UploadError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::Index(_) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!(error = %err, "upload failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<AskError> for ApiError {
    fn from(err: AskError) -> Self {
        let status = match err {
            AskError::NoDocument => StatusCode::CONFLICT,
            AskError::EmptyQuestion => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

// Extractor rejections keep axum's status and message under the JSON body.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}
