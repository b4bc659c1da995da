// src/store/mod.rs

//! Persistence seams.
//!
//! Handlers and services only talk to these traits. `PgStore` backs them with
//! Postgres; `MemoryStore` keeps everything in-process for tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        category::Category,
        question::{AnswerKey, NewQuestion, Question},
        test_result::{NewTestResult, TestResult},
        topic::{NewTopic, Topic},
        user::{NewUser, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Stores `streak` and `last_active_date` only if the stored
    /// `last_active_date` still equals `expected`.
    ///
    /// Returns `false` when another writer got there first (or the user is gone).
    async fn update_streak(
        &self,
        id: i64,
        streak: i32,
        last_active_date: DateTime<Utc>,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait TopicStore: Send + Sync {
    async fn create_topic(&self, topic: NewTopic) -> Result<Topic, AppError>;

    async fn find_topic(&self, id: i64) -> Result<Option<Topic>, AppError>;

    /// Topics of one category, in insertion order.
    async fn find_topics_by_category(&self, category: Category) -> Result<Vec<Topic>, AppError>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, AppError>;

    /// Answer keys for the ids that exist. Unknown ids are simply absent.
    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<AnswerKey>, AppError>;

    async fn find_questions_by_topic(&self, topic_id: i64) -> Result<Vec<Question>, AppError>;
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError>;

    /// A user's results, oldest first, optionally restricted to one category.
    async fn find_results_by_user(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<TestResult>, AppError>;
}

/// Everything the application needs from storage.
pub trait Store: UserStore + TopicStore + QuestionStore + ResultStore {}

impl<T> Store for T where T: UserStore + TopicStore + QuestionStore + ResultStore {}
