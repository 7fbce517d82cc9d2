use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::DbError;
use crate::tmdb::TmdbError;

/// Error body returned by every `/api` route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    NotFound(String),
    #[error("upstream error {status}: {message}")]
    Upstream { status: StatusCode, message: String },
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    /// Keep the provider's status and `status_message` when there is one;
    /// anything else becomes a 500 with `fallback` as the message.
    pub fn upstream(err: TmdbError, fallback: &str) -> Self {
        let status = err
            .status()
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = err
            .provider_message()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string();
        ApiError::Upstream { status, message }
    }

    pub fn store(err: DbError, message: &str) -> Self {
        tracing::error!(error = %err, "{}", message);
        ApiError::Store(message.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Upstream { message, .. } => message,
            other => other.to_string(),
        };
        let body = ErrorBody {
            status_code: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
