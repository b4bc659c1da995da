// src/handlers/result.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::{
    error::AppError,
    models::test_result::{SubmitResultRequest, SubmitResultResponse},
    services::{
        results::{get_stats, history, submit_result},
        streak::record_activity,
    },
    state::{AppState, SharedStore},
    utils::jwt::Claims,
};

/// Submits a finished test.
///
/// * Re-scores the answers against the stored answer keys.
/// * Stores the result (with AI feedback or the fallback text).
/// * Then records the day's activity. The two writes are independent: a
///   streak failure is logged and the stored result is still returned.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // Parsed by hand so a malformed answer map is a 400, not an extractor rejection.
    let req: SubmitResultRequest = serde_json::from_value(body)?;

    let result = submit_result(
        state.store.as_ref(),
        state.feedback.as_ref(),
        state.feedback_timeout(),
        user_id,
        req,
    )
    .await?;

    let streak = match record_activity(
        state.store.as_ref(),
        user_id,
        Utc::now(),
        state.streak_offset(),
    )
    .await
    {
        Ok(update) => Some(update),
        Err(e) => {
            tracing::error!("Result {} stored but streak update failed: {:?}", result.id, e);
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitResultResponse { result, streak }),
    ))
}

/// The caller's result history, newest first.
pub async fn list_results(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(history(store.as_ref(), user_id).await?))
}

/// Aggregate statistics over the caller's results.
pub async fn stats(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    Ok(Json(get_stats(store.as_ref(), user_id).await?))
}
