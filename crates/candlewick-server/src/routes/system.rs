use std::time::Instant;

use axum::extract::State;
use candlewick_core::Symbol;
use serde::Serialize;

use super::{blocking, ok, ApiResult};
use crate::app::AppState;
use crate::refresh::RefreshReport;

const ENDPOINTS: [(&str, &str); 13] = [
    ("GET /", "this index"),
    ("GET /api/health", "service and data directory health"),
    ("GET /api/stock_data", "latest valid record for every tracked symbol"),
    ("GET /api/daily_data/:code", "full daily history of one symbol"),
    ("GET /api/stock_daily_data", "full daily history of every tracked symbol"),
    ("GET /api/stock_kline_data/:code?period=", "day, week, month or year window"),
    ("POST /api/register", "create an account and start a session"),
    ("POST /api/login", "start a session"),
    ("POST /api/logout", "end the current session"),
    ("GET /api/check_session", "current session user"),
    ("GET /api/investigation?userId=", "questionnaire completion flag"),
    ("POST /api/investigation", "mark the questionnaire completed"),
    ("POST /update_stock_data", "run the data refresh now"),
];

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub route: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Index {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<Endpoint>,
    pub tracked_symbols: Vec<Symbol>,
}

pub async fn index(State(state): State<AppState>) -> ApiResult<Index> {
    let started = Instant::now();
    let data = Index {
        service: "candlewick",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(route, description)| Endpoint { route, description })
            .collect(),
        tracked_symbols: state.stocks.tracked().to_vec(),
    };
    Ok(ok(started, "candlewick stock data API", data))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub data_dir_readable: bool,
    pub available_symbols: usize,
    pub tracked_symbols: usize,
    pub refresh_task: String,
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    let started = Instant::now();
    let stocks = state.stocks.clone();
    let listed = blocking(move || Ok(stocks.loader().list_symbols())).await?;

    let (data_dir_readable, available_symbols) = match listed {
        Ok(symbols) => (true, symbols.len()),
        Err(error) => {
            tracing::warn!(%error, "data directory unreadable");
            (false, 0)
        }
    };

    let data = Health {
        data_dir_readable,
        available_symbols,
        tracked_symbols: state.stocks.tracked().len(),
        refresh_task: state.refresh.name().to_owned(),
    };
    let mut envelope = ok(started, "service is running", data);
    if !data_dir_readable {
        envelope.0.meta.push_warning("data directory is not readable");
    }
    Ok(envelope)
}

pub async fn update_stock_data(State(state): State<AppState>) -> ApiResult<RefreshReport> {
    let started = Instant::now();
    tracing::info!(task = state.refresh.name(), "manual refresh requested");
    let report = state.refresh.refresh().await?;
    Ok(ok(started, "stock data refreshed", report))
}
