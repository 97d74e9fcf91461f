//! Shared handler state and the router.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use candlewick_core::{SeriesLoader, StockService};
use candlewick_store::{
    AccountRepository, JsonAccountStore, JsonQuestionnaireStore, QuestionnaireRepository,
    SessionStore,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::refresh::{CommandRefresh, ExclusiveRefresh, NoopRefresh, RefreshTask};
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub stocks: Arc<StockService>,
    pub accounts: Arc<dyn AccountRepository>,
    pub questionnaire: Arc<dyn QuestionnaireRepository>,
    pub sessions: SessionStore,
    /// Shared by the HTTP handler and the background schedule.
    pub refresh: Arc<dyn RefreshTask>,
}

impl AppState {
    pub fn new(
        stocks: StockService,
        accounts: Arc<dyn AccountRepository>,
        questionnaire: Arc<dyn QuestionnaireRepository>,
        refresh: Arc<dyn RefreshTask>,
    ) -> Self {
        Self {
            stocks: Arc::new(stocks),
            accounts,
            questionnaire,
            sessions: SessionStore::with_default_ttl(),
            refresh: Arc::new(ExclusiveRefresh::new(refresh)),
        }
    }

    /// File-backed state for a running server. Creates the data and state
    /// directories when missing.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.state_dir)?;

        let stocks = StockService::new(
            SeriesLoader::new(config.data_dir.clone()),
            config.tracked.clone(),
        );
        let accounts = JsonAccountStore::open(config.users_path())?;
        let questionnaire = JsonQuestionnaireStore::open(config.investigation_path())?;

        let refresh: Arc<dyn RefreshTask> = match config
            .refresh_command
            .as_deref()
            .and_then(CommandRefresh::from_command_line)
        {
            Some(command) => Arc::new(command),
            None => Arc::new(NoopRefresh),
        };

        Ok(Self::new(
            stocks,
            Arc::new(accounts),
            Arc::new(questionnaire),
            refresh,
        ))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::system::index))
        .route("/api/health", get(routes::system::health))
        .route("/api/stock_data", get(routes::stocks::latest_for_tracked))
        .route("/api/daily_data/:code", get(routes::stocks::full_series))
        .route("/api/stock_daily_data", get(routes::stocks::full_series_for_tracked))
        .route("/api/stock_kline_data/:code", get(routes::stocks::kline))
        .route("/api/register", post(routes::auth::register))
        .route("/api/login", post(routes::auth::login))
        .route("/api/logout", post(routes::auth::logout))
        .route("/api/check_session", get(routes::auth::check_session))
        .route(
            "/api/investigation",
            get(routes::investigation::status).post(routes::investigation::complete),
        )
        .route("/update_stock_data", post(routes::system::update_stock_data))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(is_local_origin)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([
            HeaderName::from_static("content-range"),
            HeaderName::from_static("x-content-range"),
        ])
        .allow_credentials(true)
}

/// `http://localhost:<port>` or `http://127.0.0.1:<port>`.
fn is_local_origin(origin: &str) -> bool {
    ["http://localhost:", "http://127.0.0.1:"]
        .iter()
        .filter_map(|prefix| origin.strip_prefix(prefix))
        .any(|port| !port.is_empty() && port.len() <= 5 && port.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_origins_only() {
        assert!(is_local_origin("http://localhost:5173"));
        assert!(is_local_origin("http://127.0.0.1:8080"));

        assert!(!is_local_origin("http://localhost"));
        assert!(!is_local_origin("https://localhost:5173"));
        assert!(!is_local_origin("http://localhost:5173.evil.com"));
        assert!(!is_local_origin("http://example.com:5173"));
    }
}
