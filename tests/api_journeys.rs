//! Behavior-driven tests for the HTTP API
//!
//! These tests drive the router in-process, the way a browser front end
//! would: batch pages, K-line charts, sign-up and sign-in, and the
//! questionnaire.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::header::{CONTENT_TYPE, COOKIE, ORIGIN, SET_COOKIE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use candlewick_core::{SeriesLoader, StockService, Symbol};
use candlewick_server::{router, AppState, CommandRefresh, NoopRefresh, RefreshTask};
use candlewick_store::{MemoryAccountStore, MemoryQuestionnaireStore};
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

const HEADER: &str = "ts_code,trade_date,open,high,low,close,change,pct_change,vol,amount";

/// Ten trading days 2024-01-01..=2024-01-10; the last day has no close.
fn write_fixture(dir: &Path) {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for day in 1..=10 {
        let close = if day == 10 {
            String::new()
        } else {
            format!("{}.5", 10 + day)
        };
        csv.push_str(&format!(
            "688111,202401{day:02},10,12,9,{close},0.5,4.2,1000,10500\n"
        ));
    }
    fs::write(dir.join("688111.csv"), csv).expect("fixture");
}

fn app_with(dir: &TempDir, refresh: Arc<dyn RefreshTask>) -> Router {
    write_fixture(dir.path());
    let tracked = vec![
        Symbol::parse("000404").expect("symbol"),
        Symbol::parse("688111").expect("symbol"),
    ];
    let state = AppState::new(
        StockService::new(SeriesLoader::new(dir.path()), tracked),
        Arc::new(MemoryAccountStore::new()),
        Arc::new(MemoryQuestionnaireStore::new()),
        refresh,
    );
    router(state)
}

fn app(dir: &TempDir) -> Router {
    app_with(dir, Arc::new(NoopRefresh))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(COOKIE, cookie.parse().expect("cookie header"));
    request
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

/// `name=value` part of the `Set-Cookie` header.
fn session_pair(headers: &HeaderMap) -> String {
    headers
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .expect("set-cookie")
        .to_owned()
}

// =============================================================================
// Stock data
// =============================================================================

#[tokio::test]
async fn batch_latest_lists_missing_symbol_next_to_valid_one() {
    // Given: One tracked symbol with data and one without a file
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    // When: The overview page loads the latest records
    let (status, _, body) = send(&app, get("/api/stock_data")).await;

    // Then: The call succeeds and reports the failure in place
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"][0]["code"], "000404");
    assert_eq!(body["data"][0]["error"]["code"], "not_found");
    assert!(body["data"][0]["data"].is_null());

    // And: The latest record skips the trailing row without a close
    assert_eq!(body["data"][1]["code"], "688111");
    assert_eq!(body["data"][1]["data"]["trade_date"], "20240109");
    assert_eq!(body["data"][1]["data"]["close"], 19.5);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn batch_daily_data_is_oldest_first() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (status, _, body) = send(&app, get("/api/stock_daily_data")).await;

    assert_eq!(status, StatusCode::OK);
    let records = body["data"][1]["data"]["records"]
        .as_array()
        .expect("records");
    assert_eq!(records.len(), 10);
    assert_eq!(records[0]["trade_date"], "20240101");
    assert_eq!(records[9]["trade_date"], "20240110");
}

#[tokio::test]
async fn kline_week_returns_last_seven_days_with_label() {
    // Given: Ten days of data
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    // When: The chart asks for a week
    let (status, _, body) = send(&app, get("/api/stock_kline_data/688111?period=week")).await;

    // Then: Seven records, oldest first, labeled
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["period"], "week");
    assert_eq!(body["data"]["time_range"], "Last 7 days");
    let records = body["data"]["records"].as_array().expect("records");
    assert_eq!(records.len(), 7);
    assert_eq!(records[0]["trade_date"], "20240104");
    assert_eq!(records[6]["trade_date"], "20240110");
}

#[tokio::test]
async fn kline_defaults_to_year_and_warns_on_unknown_period() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (_, _, default_body) = send(&app, get("/api/stock_kline_data/688111")).await;
    assert_eq!(default_body["data"]["period"], "year");
    assert_eq!(default_body["data"]["time_range"], "Last 365 days");
    assert_eq!(default_body["data"]["records"].as_array().map(Vec::len), Some(10));

    let (status, _, body) = send(&app, get("/api/stock_kline_data/688111?period=decade")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["time_range"], "Unknown period");
    assert_eq!(body["data"]["records"].as_array().map(Vec::len), Some(10));
    assert_eq!(body["meta"]["warnings"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn single_symbol_failures_map_to_http_statuses() {
    // Given: A data dir with one good file and one truncated mid-write
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);
    fs::write(
        dir.path().join("600000.csv"),
        format!("{HEADER}\n600000,20240102,10,12\n"),
    )
    .expect("partial file");

    // Then: Missing file is 404
    let (status, _, body) = send(&app, get("/api/daily_data/000404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["errors"][0]["code"], "not_found");

    // And: An invalid symbol is 400
    let (status, _, _) = send(&app, get("/api/daily_data/bad!code")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // And: A partial file is 503 and flagged retryable
    let (status, _, body) = send(&app, get("/api/daily_data/600000")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errors"][0]["retryable"], true);
}

// =============================================================================
// Accounts and sessions
// =============================================================================

#[tokio::test]
async fn register_login_logout_journey() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);
    let credentials = json!({"username": " alice ", "password": "s3cret"});

    // Given: No session yet
    let (status, _, body) = send(&app, get("/api/check_session")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");

    // When: The user registers
    let (status, headers, body) = send(&app, post_json("/api/register", credentials.clone())).await;

    // Then: A session cookie is issued for the trimmed username
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    let set_cookie = headers
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("set-cookie");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = session_pair(&headers);

    let (status, _, body) = send(&app, with_cookie(get("/api/check_session"), &cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["is_logged_in"], true);

    // And: The same name cannot register twice
    let (status, _, _) = send(&app, post_json("/api/register", credentials)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // When: The user logs out
    let logout = Request::builder()
        .method(Method::POST)
        .uri("/api/logout")
        .header(COOKIE, &cookie)
        .body(Body::empty())
        .expect("request");
    let (status, headers, _) = send(&app, logout).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("Max-Age=0")));

    // Then: The old cookie no longer works
    let (status, _, _) = send(&app, with_cookie(get("/api/check_session"), &cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // And: Logging back in needs the right password
    let (status, _, _) = send(
        &app,
        post_json("/api/login", json!({"username": "alice", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, headers, _) = send(
        &app,
        post_json("/api/login", json!({"username": "alice", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let fresh = session_pair(&headers);
    assert_ne!(fresh, cookie);
}

#[tokio::test]
async fn register_rejects_blank_fields_and_bad_json() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (status, _, body) = send(
        &app,
        post_json("/api/register", json!({"username": "bob", "password": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "invalid_request");

    let broken = Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, _, body) = send(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn login_for_unknown_user_is_unauthorized() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (status, headers, _) = send(
        &app,
        post_json("/api/login", json!({"username": "ghost", "password": "pw"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(SET_COOKIE).is_none());
}

// =============================================================================
// Questionnaire
// =============================================================================

#[tokio::test]
async fn questionnaire_completion_round_trip() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (status, _, body) = send(&app, get("/api/investigation?userId=u-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], false);

    let (status, _, body) = send(&app, post_json("/api/investigation", json!({"userId": "u-1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["completed"], true);

    let (_, _, body) = send(&app, get("/api/investigation?userId=u-1")).await;
    assert_eq!(body["data"]["completed"], true);
    let (_, _, body) = send(&app, get("/api/investigation?userId=u-2")).await;
    assert_eq!(body["data"]["completed"], false);

    let (status, _, _) = send(&app, get("/api/investigation")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// System
// =============================================================================

#[tokio::test]
async fn index_and_health_describe_the_service() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let (status, _, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["tracked_symbols"], json!(["000404", "688111"]));
    assert!(body["data"]["endpoints"].as_array().is_some_and(|list| !list.is_empty()));

    let (status, _, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data_dir_readable"], true);
    assert_eq!(body["data"]["available_symbols"], 1);
    assert_eq!(body["data"]["refresh_task"], "noop");
}

#[tokio::test]
async fn manual_refresh_reports_task_outcome() {
    // Given: The default no-op refresh
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let refresh = Request::builder()
        .method(Method::POST)
        .uri("/update_stock_data")
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(&app, refresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["task"], "noop");

    // When: The configured command cannot be launched
    let failing_dir = tempdir().expect("tempdir");
    let failing = app_with(
        &failing_dir,
        Arc::new(CommandRefresh::new("candlewick-no-such-program", Vec::new())),
    );
    let refresh = Request::builder()
        .method(Method::POST)
        .uri("/update_stock_data")
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(&failing, refresh).await;

    // Then: The failure is a 500 marked retryable
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["errors"][0]["code"], "refresh_failed");
    assert_eq!(body["errors"][0]["retryable"], true);
}

#[tokio::test]
async fn cors_allows_local_front_ends_with_credentials() {
    let dir = tempdir().expect("tempdir");
    let app = app(&dir);

    let mut local = get("/api/health");
    local
        .headers_mut()
        .insert(ORIGIN, "http://localhost:5173".parse().expect("origin"));
    let (_, headers, _) = send(&app, local).await;
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        headers
            .get("access-control-allow-credentials")
            .and_then(|value| value.to_str().ok()),
        Some("true")
    );

    let mut remote = get("/api/health");
    remote
        .headers_mut()
        .insert(ORIGIN, "http://example.com".parse().expect("origin"));
    let (_, headers, _) = send(&app, remote).await;
    assert!(headers.get("access-control-allow-origin").is_none());
}
