// src/handlers/streak.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::AppError,
    services::streak::{get_streak, record_activity},
    state::AppState,
    utils::jwt::Claims,
};

/// Records today's activity for the caller.
pub async fn update_streak(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let outcome =
        record_activity(state.store.as_ref(), user_id, Utc::now(), state.streak_offset()).await?;

    Ok(Json(json!({
        "success": true,
        "updated": outcome.updated,
        "streak": outcome.streak,
        "message": outcome.message
    })))
}

pub async fn current_streak(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let status = get_streak(state.store.as_ref(), user_id).await?;
    Ok(Json(status))
}
