use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use candlewick_core::{
    DailyRecord, Envelope, EnvelopeError, LatestValidRecord, Period, Series, Symbol,
    SymbolOutcome,
};
use serde::{Deserialize, Serialize};

use super::{blocking, meta_since, ok, ApiResult};
use crate::app::AppState;

/// One symbol of a batch response: either `data` or `error` is present.
#[derive(Debug, Serialize)]
pub struct BatchEntry<T> {
    pub code: Symbol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

fn into_batch<T>(
    started: Instant,
    message: &str,
    outcomes: Vec<SymbolOutcome<T>>,
) -> Json<Envelope<Vec<BatchEntry<T>>>> {
    let mut errors = Vec::new();
    let entries = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            SymbolOutcome::Ok { code, data } => BatchEntry {
                code,
                data: Some(data),
                error: None,
            },
            SymbolOutcome::Err { code, error } => {
                let error = EnvelopeError::from(&error);
                errors.push(error.clone());
                BatchEntry {
                    code,
                    data: None,
                    error: Some(error),
                }
            }
        })
        .collect();

    let mut envelope = Envelope::success(meta_since(started), message, entries);
    envelope.errors = errors;
    Json(envelope)
}

pub async fn latest_for_tracked(
    State(state): State<AppState>,
) -> ApiResult<Vec<BatchEntry<LatestValidRecord>>> {
    let started = Instant::now();
    let stocks = state.stocks.clone();
    let outcomes = blocking(move || Ok(stocks.latest_for_tracked())).await?;
    Ok(into_batch(started, "latest data for tracked symbols", outcomes))
}

pub async fn full_series_for_tracked(
    State(state): State<AppState>,
) -> ApiResult<Vec<BatchEntry<Series>>> {
    let started = Instant::now();
    let stocks = state.stocks.clone();
    let outcomes = blocking(move || Ok(stocks.full_series_for_tracked())).await?;
    Ok(into_batch(started, "daily data for tracked symbols", outcomes))
}

pub async fn full_series(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Series> {
    let started = Instant::now();
    let symbol = Symbol::parse(&code)?;
    let stocks = state.stocks.clone();
    let series = blocking(move || Ok(stocks.get_full_series(&symbol)?)).await?;
    Ok(ok(started, "daily data", series))
}

#[derive(Debug, Deserialize)]
pub struct KlineQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct KlineData {
    pub code: Symbol,
    pub period: Period,
    pub time_range: &'static str,
    pub records: Vec<DailyRecord>,
}

pub async fn kline(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<KlineQuery>,
) -> ApiResult<KlineData> {
    let started = Instant::now();
    let symbol = Symbol::parse(&code)?;
    let period = query
        .period
        .as_deref()
        .map(Period::from_tag)
        .unwrap_or_default();

    let stocks = state.stocks.clone();
    let window_period = period.clone();
    let series = blocking(move || Ok(stocks.get_window(&symbol, &window_period)?)).await?;

    let mut meta = meta_since(started);
    if !period.is_recognized() {
        meta.push_warning(format!(
            "unknown period '{period}', returning the full series"
        ));
    }

    let data = KlineData {
        code: series.symbol,
        time_range: period.time_range_label(),
        period,
        records: series.records,
    };
    Ok(Json(Envelope::success(meta, "kline data", data)))
}
