// src/models/test_result.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{category::Category, streak::StreakUpdate};

/// Represents the 'results' table in the database.
/// One immutable record per completed test attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: i64,
    pub user_id: i64,
    pub topic_id: i64,
    pub category: Category,
    /// One point per correct answer.
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    /// Seconds.
    pub time_taken: i32,
    /// Percentage in `0..=100`.
    pub accuracy: f64,
    pub average_time_per_question: f64,
    pub ai_feedback: String,
    pub created_at: DateTime<Utc>,
}

/// A scored attempt that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewTestResult {
    pub user_id: i64,
    pub topic_id: i64,
    pub category: Category,
    pub score: i32,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub time_taken: i32,
    pub accuracy: f64,
    pub average_time_per_question: f64,
    pub ai_feedback: String,
}

/// DTO for submitting a test attempt.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultRequest {
    pub topic_id: i64,
    pub category: Category,

    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's selected option (String)
    pub answers: HashMap<i64, String>,

    /// Seconds spent on the whole attempt.
    pub time_taken: i64,
}

/// Response for a submission: the stored result plus the streak outcome.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultResponse {
    #[serde(flatten)]
    pub result: TestResult,
    pub streak: Option<StreakUpdate>,
}

/// Aggregate statistics over a user's result history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_tests: i64,
    /// Mean score, rounded to one decimal.
    pub average_score: f64,
    /// Mean accuracy, rounded to the nearest integer.
    pub average_accuracy: i64,
    /// Distinct topics with at least one result.
    pub topics_completed: i64,
}
