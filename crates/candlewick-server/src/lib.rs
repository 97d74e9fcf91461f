//! # Candlewick Server
//!
//! axum HTTP façade over [`candlewick_core`] and [`candlewick_store`].
//!
//! Every endpoint answers with a [`candlewick_core::Envelope`]. Batch
//! endpoints succeed when some tracked symbols fail and list those failures
//! in `errors`; single-symbol endpoints map failures to HTTP statuses:
//!
//! | Failure | Status |
//! |---------|--------|
//! | invalid symbol or body | 400 |
//! | bad credentials, no session | 401 |
//! | no data file | 404 |
//! | username taken | 409 |
//! | no complete record | 422 |
//! | file unreadable or mid-rewrite | 503 |
//! | store or refresh failure | 500 |

pub mod app;
pub mod config;
pub mod error;
pub mod refresh;
pub mod routes;

pub use app::{router, AppState};
pub use config::{Cli, ServerConfig};
pub use error::{ApiError, ServerError};
pub use refresh::{
    spawn_refresh_loop, CommandRefresh, ExclusiveRefresh, NoopRefresh, RefreshError, RefreshLoop,
    RefreshReport, RefreshTask, DEFAULT_RETRY_DELAY,
};
pub use routes::auth::SESSION_COOKIE;

use std::future::Future;

use tokio::net::TcpListener;

/// Open stores, start the refresh schedule and serve until `shutdown`
/// resolves.
pub async fn serve<F>(config: ServerConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(&config)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        state_dir = %config.state_dir.display(),
        tracked = config.tracked.len(),
        refresh = state.refresh.name(),
        "starting candlewick"
    );

    let schedule = config
        .refresh_interval
        .map(|every| spawn_refresh_loop(state.refresh.clone(), every, DEFAULT_RETRY_DELAY));

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    tracing::info!(addr = %config.bind, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    drop(schedule);
    tracing::info!("shut down");
    Ok(())
}
