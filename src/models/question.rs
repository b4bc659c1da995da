// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::category::Difficulty;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    pub topic_id: i64,

    /// The text content of the question.
    pub content: String,

    /// List of options (e.g., ["12", "15", "18", "20"]).
    /// Stored as a JSON array in the database.
    pub options: Vec<String>,

    /// The authoritative answer submissions are scored against.
    pub correct_answer: String,

    pub difficulty: Difficulty,

    /// Explanation of the correct answer.
    pub explanation: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Scoring view of a question: only what re-checking a submission needs.
#[derive(Debug, Clone)]
pub struct AnswerKey {
    pub id: i64,
    pub topic_id: i64,
    pub correct_answer: String,
    pub difficulty: Difficulty,
}

impl From<&Question> for AnswerKey {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            topic_id: q.topic_id,
            correct_answer: q.correct_answer.clone(),
            difficulty: q.difficulty,
        }
    }
}

/// DTO for sending question to client (excludes answer and explanation).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub topic_id: i64,
    pub content: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            topic_id: q.topic_id,
            content: q.content,
            options: q.options,
            difficulty: q.difficulty,
        }
    }
}

/// Fields needed to insert a question.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub topic_id: i64,
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub difficulty: Difficulty,
    pub explanation: Option<String>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub topic_id: i64,
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    pub difficulty: Difficulty,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
