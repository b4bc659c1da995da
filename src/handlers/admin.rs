// src/handlers/admin.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, NewQuestion},
        topic::{CreateTopicRequest, NewTopic},
    },
    state::SharedStore,
    store::{QuestionStore, TopicStore},
    utils::html::sanitize,
};

/// Creates a practice topic.
/// Admin only.
pub async fn create_topic(
    State(store): State<SharedStore>,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let topic = store
        .create_topic(NewTopic {
            name: sanitize(payload.name.trim()),
            description: sanitize(&payload.description),
            category: payload.category,
        })
        .await?;

    tracing::info!(topic_id = topic.id, category = %topic.category, "Created topic");

    Ok((StatusCode::CREATED, Json(topic)))
}

/// Creates a question under an existing topic.
/// Admin only.
pub async fn create_question(
    State(store): State<SharedStore>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    store
        .find_topic(payload.topic_id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    // Options and the answer are plain text compared verbatim at scoring time,
    // so they are stored as typed. Clients render them as text, not HTML.
    let options: Vec<String> = payload.options.iter().map(|o| o.trim().to_string()).collect();
    let correct_answer = payload.correct_answer.trim().to_string();

    if !options.iter().any(|o| *o == correct_answer) {
        return Err(AppError::BadRequest(
            "correctAnswer must be one of the options".to_string(),
        ));
    }

    let question = store
        .create_question(NewQuestion {
            topic_id: payload.topic_id,
            content: sanitize(&payload.content),
            options,
            correct_answer,
            difficulty: payload.difficulty,
            explanation: payload.explanation.as_deref().map(sanitize),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(question)))
}
