// src/models/topic.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::category::Category;

/// A practice topic, e.g. "Time and Work" under `quant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
}

/// The caller's best attempt at a topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub score: i32,
    pub total_questions: i32,
    pub accuracy: f64,
    pub completed: bool,
}

/// Topic listing entry with the caller's progress (null when never attempted).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicWithProgress {
    #[serde(flatten)]
    pub topic: Topic,
    pub progress: Option<Progress>,
}

/// Query parameters for listing topics.
#[derive(Debug, Deserialize)]
pub struct TopicListParams {
    pub category: Category,
}

/// DTO for creating a topic.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTopicRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: String,
    pub category: Category,
}

/// Fields needed to insert a topic.
#[derive(Debug, Clone)]
pub struct NewTopic {
    pub name: String,
    pub description: String,
    pub category: Category,
}
