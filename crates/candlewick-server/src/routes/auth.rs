//! Registration, login and cookie sessions.

use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName};
use axum::Json;
use candlewick_core::Envelope;
use candlewick_store::{Account, StoreError};
use serde::{Deserialize, Serialize};

use super::{blocking, ok};
use crate::app::AppState;
use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "candlewick_session";

type WithCookie<T> = ([(HeaderName, String); 1], Json<Envelope<T>>);

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Trimmed username and password, both required.
    fn into_parts(self) -> Result<(String, String), ApiError> {
        let username = self.username.trim().to_owned();
        let password = self.password.trim().to_owned();
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest(String::from(
                "username and password are required",
            )));
        }
        Ok((username, password))
    }
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub username: String,
    pub is_logged_in: bool,
}

impl SessionInfo {
    fn logged_in(username: String) -> Self {
        Self {
            username,
            is_logged_in: true,
        }
    }
}

fn parse_body(body: Result<Json<Credentials>, JsonRejection>) -> Result<Credentials, ApiError> {
    body.map(|Json(credentials)| credentials)
        .map_err(|rejection| ApiError::BadRequest(format!("invalid request body: {rejection}")))
}

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<WithCookie<SessionInfo>, ApiError> {
    let started = Instant::now();
    let (username, password) = parse_body(body)?.into_parts()?;

    let accounts = state.accounts.clone();
    let name = username.clone();
    blocking(move || {
        accounts
            .insert_new(&name, Account::new(&password)?)
            .map_err(|error| match error {
                StoreError::Conflict { .. } => {
                    ApiError::Conflict(format!("username '{name}' already exists"))
                }
                other => ApiError::Store(other),
            })
    })
    .await?;

    let cookie = start_session(&state, &username).await;
    Ok((
        [(SET_COOKIE, cookie)],
        ok(started, "registered", SessionInfo::logged_in(username)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<WithCookie<SessionInfo>, ApiError> {
    let started = Instant::now();
    let (username, password) = parse_body(body)?.into_parts()?;

    let accounts = state.accounts.clone();
    let name = username.clone();
    let verified = blocking(move || {
        Ok(accounts
            .get(&name)?
            .is_some_and(|account| account.verify(&password)))
    })
    .await?;

    if !verified {
        tracing::info!(username = %username, "login rejected");
        return Err(ApiError::Unauthorized(String::from(
            "invalid username or password",
        )));
    }

    let cookie = start_session(&state, &username).await;
    Ok((
        [(SET_COOKIE, cookie)],
        ok(started, "logged in", SessionInfo::logged_in(username)),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> WithCookie<serde_json::Value> {
    let started = Instant::now();
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(&token).await;
    }
    (
        [(SET_COOKIE, session_cookie("", Duration::ZERO))],
        ok(started, "logged out", serde_json::Value::Null),
    )
}

pub async fn check_session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Envelope<SessionInfo>>, ApiError> {
    let started = Instant::now();
    let username = current_user(&state, &headers)
        .await
        .ok_or_else(|| ApiError::Unauthorized(String::from("not logged in")))?;
    Ok(ok(started, "session active", SessionInfo::logged_in(username)))
}

/// Username of the request's live session, if any.
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = session_token(headers)?;
    state.sessions.resolve(&token).await
}

async fn start_session(state: &AppState, username: &str) -> String {
    let token = state.sessions.create(username).await;
    tracing::info!(username, "session started");
    session_cookie(&token, state.sessions.ttl().await)
}

fn session_cookie(token: &str, max_age: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        max_age.as_secs()
    )
}

/// Token from the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_session_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            COOKIE,
            HeaderValue::from_static("a=1; candlewick_session=abc123; b=2"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_cookie_value_is_no_session() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("candlewick_session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let cookie = session_cookie("tok", Duration::from_secs(60));
        assert_eq!(
            cookie,
            "candlewick_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
    }

    #[test]
    fn credentials_are_trimmed_and_required() {
        let credentials = Credentials {
            username: String::from("  alice "),
            password: String::from(" pw "),
        };
        assert_eq!(
            credentials.into_parts().expect("valid"),
            (String::from("alice"), String::from("pw"))
        );

        let blank = Credentials {
            username: String::from("bob"),
            password: String::from("   "),
        };
        assert!(matches!(blank.into_parts(), Err(ApiError::BadRequest(_))));
    }
}
