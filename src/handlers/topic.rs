// src/handlers/topic.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{question::PublicQuestion, topic::TopicListParams},
    services::results::topics_with_progress,
    state::SharedStore,
    store::{QuestionStore, TopicStore},
    utils::jwt::Claims,
};

/// Lists the topics of a category with the caller's best attempt at each.
pub async fn list_topics(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<TopicListParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let topics = topics_with_progress(store.as_ref(), params.category, user_id).await?;
    Ok(Json(topics))
}

/// Returns a topic's questions for a practice test, without answers.
pub async fn list_topic_questions(
    State(store): State<SharedStore>,
    Path(topic_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_topic(topic_id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    let questions: Vec<PublicQuestion> = store
        .find_questions_by_topic(topic_id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(questions))
}
