// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        category::Category,
        question::{AnswerKey, NewQuestion, Question},
        test_result::{NewTestResult, TestResult},
        topic::{NewTopic, Topic},
        user::{NewUser, User},
    },
    store::{QuestionStore, ResultStore, TopicStore, UserStore},
};

/// In-process store. Used by the test-suite and when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, User>,
    topics: Vec<Topic>,
    questions: Vec<Question>,
    results: Vec<TestResult>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a user's streak state without any checks. Lets tests start
    /// from "last active N days ago".
    pub async fn set_streak_state(
        &self,
        user_id: i64,
        streak: i32,
        last_active_date: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let mut tables = self.inner.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;
        user.streak = streak;
        user.last_active_date = last_active_date;
        Ok(())
    }

    /// Promotes a user to admin.
    pub async fn set_role(&self, user_id: i64, role: &str) -> Result<(), AppError> {
        let mut tables = self.inner.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(AppError::NotFound("User not found".to_string()))?;
        user.role = role.to_string();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.inner.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }

        let id = tables.allocate_id();
        let record = User {
            id,
            email: user.email,
            name: user.name,
            password: user.password,
            role: user.role,
            streak: 0,
            last_active_date: None,
            created_at: Utc::now(),
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_streak(
        &self,
        id: i64,
        streak: i32,
        last_active_date: DateTime<Utc>,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        let mut tables = self.inner.write().await;
        match tables.users.get_mut(&id) {
            Some(user) if user.last_active_date == expected => {
                user.streak = streak;
                user.last_active_date = Some(last_active_date);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TopicStore for MemoryStore {
    async fn create_topic(&self, topic: NewTopic) -> Result<Topic, AppError> {
        let mut tables = self.inner.write().await;
        let id = tables.allocate_id();
        let record = Topic {
            id,
            name: topic.name,
            description: topic.description,
            category: topic.category,
            created_at: Utc::now(),
        };
        tables.topics.push(record.clone());
        Ok(record)
    }

    async fn find_topic(&self, id: i64) -> Result<Option<Topic>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn find_topics_by_category(&self, category: Category) -> Result<Vec<Topic>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .topics
            .iter()
            .filter(|t| t.category == category)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        let mut tables = self.inner.write().await;
        let id = tables.allocate_id();
        let record = Question {
            id,
            topic_id: question.topic_id,
            content: question.content,
            options: question.options,
            correct_answer: question.correct_answer,
            difficulty: question.difficulty,
            explanation: question.explanation,
            created_at: Utc::now(),
        };
        tables.questions.push(record.clone());
        Ok(record)
    }

    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<AnswerKey>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .questions
            .iter()
            .filter(|q| ids.contains(&q.id))
            .map(AnswerKey::from)
            .collect())
    }

    async fn find_questions_by_topic(&self, topic_id: i64) -> Result<Vec<Question>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .questions
            .iter()
            .filter(|q| q.topic_id == topic_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError> {
        let mut tables = self.inner.write().await;
        let id = tables.allocate_id();
        let record = TestResult {
            id,
            user_id: result.user_id,
            topic_id: result.topic_id,
            category: result.category,
            score: result.score,
            total_questions: result.total_questions,
            correct_answers: result.correct_answers,
            wrong_answers: result.wrong_answers,
            time_taken: result.time_taken,
            accuracy: result.accuracy,
            average_time_per_question: result.average_time_per_question,
            ai_feedback: result.ai_feedback,
            created_at: Utc::now(),
        };
        tables.results.push(record.clone());
        Ok(record)
    }

    async fn find_results_by_user(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<TestResult>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| category.is_none_or(|c| r.category == c))
            .cloned()
            .collect())
    }
}
