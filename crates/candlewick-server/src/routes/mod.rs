//! Request handlers grouped by area.

pub mod auth;
pub mod investigation;
pub mod stocks;
pub mod system;

use std::time::Instant;

use axum::Json;
use candlewick_core::{Envelope, EnvelopeMeta};

use crate::error::ApiError;
use crate::refresh::elapsed_ms;

pub(crate) type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub(crate) fn meta_since(started: Instant) -> EnvelopeMeta {
    EnvelopeMeta::generate(elapsed_ms(started))
}

pub(crate) fn ok<T>(started: Instant, message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope::success(meta_since(started), message, data))
}

/// Run file or CPU bound work off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}
