use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use scorecast_core::FeedError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PlayerNotFound,
    InvalidRequest,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug)]
pub(crate) struct HttpApiError {
    pub(crate) status: StatusCode,
    pub(crate) error: ApiError,
}

impl HttpApiError {
    pub(crate) fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    pub(crate) fn from_feed(err: FeedError) -> Self {
        match err {
            FeedError::PlayerNotFound(id) => Self {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    ErrorCode::PlayerNotFound,
                    "Player not found",
                    Some(format!("player_id={id}")),
                ),
            },
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
