use crate::domain::model::ErrorBody;
use crate::utils::error::EchoError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub const MISSING_IMAGE_MESSAGE: &str = "Missing 'image' field in request body.";

/// Failure of a classify request, rendered as `{"error": ...}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    ServiceUnavailable(String),

    #[error("An internal server error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EchoError> for ApiError {
    fn from(err: EchoError) -> Self {
        match err {
            EchoError::InvalidBase64 { message } | EchoError::PreprocessingError { message } => {
                ApiError::BadRequest(message)
            }
            EchoError::ModelNotLoaded => ApiError::ServiceUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {} {}", status.as_u16(), self);
        } else {
            tracing::warn!("⚠️ {} {}", status.as_u16(), self);
        }

        let body = Json(ErrorBody {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
