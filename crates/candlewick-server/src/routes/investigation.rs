//! One-time questionnaire completion flag.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{blocking, ok, ApiResult};
use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct UserRef {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

impl UserRef {
    fn require(self) -> Result<String, ApiError> {
        self.user_id
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest(String::from("userId is required")))
    }
}

#[derive(Debug, Serialize)]
pub struct Completion {
    pub user_id: String,
    pub completed: bool,
}

pub async fn status(
    State(state): State<AppState>,
    Query(user): Query<UserRef>,
) -> ApiResult<Completion> {
    let started = Instant::now();
    let user_id = user.require()?;

    let questionnaire = state.questionnaire.clone();
    let id = user_id.clone();
    let completed = blocking(move || Ok(questionnaire.is_completed(&id)?)).await?;

    Ok(ok(started, "questionnaire status", Completion { user_id, completed }))
}

pub async fn complete(
    State(state): State<AppState>,
    body: Result<Json<UserRef>, JsonRejection>,
) -> ApiResult<Completion> {
    let started = Instant::now();
    let Json(user) = body
        .map_err(|rejection| ApiError::BadRequest(format!("invalid request body: {rejection}")))?;
    let user_id = user.require()?;

    let questionnaire = state.questionnaire.clone();
    let id = user_id.clone();
    blocking(move || Ok(questionnaire.mark_completed(&id)?)).await?;
    tracing::info!(user_id = %user_id, "questionnaire completed");

    Ok(ok(
        started,
        "questionnaire completed",
        Completion {
            user_id,
            completed: true,
        },
    ))
}
