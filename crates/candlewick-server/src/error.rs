use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use candlewick_core::{Envelope, EnvelopeError, EnvelopeMeta, SeriesError, ValidationError};
use candlewick_store::StoreError;
use thiserror::Error;

use crate::refresh::RefreshError;

/// Request-level failure, rendered as an error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Series(SeriesError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Series(SeriesError::MalformedData { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Series(SeriesError::NoValidData { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) | Self::Store(StoreError::Conflict { .. }) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Refresh(_) | Self::Join(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => "invalid_request",
            Self::Series(error) => error.code(),
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) | Self::Store(StoreError::Conflict { .. }) => "conflict",
            Self::Store(_) => "store_error",
            Self::Refresh(_) => "refresh_failed",
            Self::Join(_) => "internal_error",
        }
    }

    fn envelope_error(&self) -> EnvelopeError {
        match self {
            Self::Series(error) => EnvelopeError::from(error),
            other => EnvelopeError {
                code: other.code().to_owned(),
                message: other.to_string(),
                retryable: matches!(other, Self::Refresh(_)).then_some(true),
                symbol: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }

        match Envelope::failure(
            EnvelopeMeta::generate(0),
            serde_json::Value::Null,
            vec![self.envelope_error()],
        ) {
            Ok(envelope) => (status, Json(envelope)).into_response(),
            Err(error) => {
                tracing::error!(%error, "error envelope rejected");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Startup failures mapped to process exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Store(_) => 3,
            Self::Bind { .. } => 4,
            Self::Io(_) => 10,
        }
    }
}
