//! Mapping of runtime errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use autoloop_core::{Error, LifecycleError};

/// Runtime error rendered as `{"error": CODE, "message": ...}`.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Lifecycle(LifecycleError::NotFound(_)) | Error::UnknownProvider(_) => {
                StatusCode::NOT_FOUND
            }
            Error::Lifecycle(LifecycleError::AlreadyLoaded(_)) => StatusCode::CONFLICT,
            Error::Configuration(_)
            | Error::InvalidParameters { .. }
            | Error::UnknownAction { .. }
            | Error::UnregisteredAction(_)
            | Error::NotConfigured(_)
            | Error::NoSelectableTask
            | Error::Load { .. }
            | Error::Serialization(_) => StatusCode::BAD_REQUEST,
            Error::Provider { .. } => StatusCode::BAD_GATEWAY,
            Error::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(code = self.0.code(), error = %self.0, "Request rejected");
        }
        let body = Json(json!({
            "error": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
