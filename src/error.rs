use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed client input.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(String),
    /// The upstream answered with a non-success status; it is passed through.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },
    /// DNS, connect, timeout and other transport failures.
    #[error("Request error: {0}")]
    Transport(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Transport(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("request failed with {status}: {self}");
        } else {
            log::warn!("request rejected with {status}: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Maps an upstream status onto our status type, falling back to 502 when
/// the code is outside the valid range.
pub fn passthrough_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}
