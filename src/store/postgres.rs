// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

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

/// Postgres-backed store. Cloning shares the underlying pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const USER_COLUMNS: &str =
    "id, email, name, password, role, streak, last_active_date, created_at";

#[derive(FromRow)]
struct TopicRow {
    id: i64,
    name: String,
    description: String,
    category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TopicRow> for Topic {
    type Error = AppError;

    fn try_from(row: TopicRow) -> Result<Self, Self::Error> {
        Ok(Topic {
            id: row.id,
            name: row.name,
            description: row.description,
            category: parse_stored(&row.category)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    topic_id: i64,
    content: String,
    options: Json<Vec<String>>,
    correct_answer: String,
    difficulty: String,
    explanation: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            topic_id: row.topic_id,
            content: row.content,
            options: row.options.0,
            correct_answer: row.correct_answer,
            difficulty: parse_stored(&row.difficulty)?,
            explanation: row.explanation,
            created_at: row.created_at,
        })
    }
}

/// Helper struct for fetching answer keys from the database.
#[derive(FromRow)]
struct AnswerKeyRow {
    id: i64,
    topic_id: i64,
    correct_answer: String,
    difficulty: String,
}

#[derive(FromRow)]
struct ResultRow {
    id: i64,
    user_id: i64,
    topic_id: i64,
    category: String,
    score: i32,
    total_questions: i32,
    correct_answers: i32,
    wrong_answers: i32,
    time_taken: i32,
    accuracy: f64,
    average_time_per_question: f64,
    ai_feedback: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ResultRow> for TestResult {
    type Error = AppError;

    fn try_from(row: ResultRow) -> Result<Self, Self::Error> {
        Ok(TestResult {
            id: row.id,
            user_id: row.user_id,
            topic_id: row.topic_id,
            category: parse_stored(&row.category)?,
            score: row.score,
            total_questions: row.total_questions,
            correct_answers: row.correct_answers,
            wrong_answers: row.wrong_answers,
            time_taken: row.time_taken,
            accuracy: row.accuracy,
            average_time_per_question: row.average_time_per_question,
            ai_feedback: row.ai_feedback,
            created_at: row.created_at,
        })
    }
}

/// Enum columns are TEXT; an unknown value means the row is corrupt, not that
/// the client sent something wrong.
fn parse_stored<T>(raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr<Err = AppError>,
{
    raw.parse()
        .map_err(|_| AppError::InternalServerError(format!("Corrupt enum value in database: {}", raw)))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, name, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password)
            .bind(&user.role)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Email '{}' is already registered", user.email))
                } else {
                    tracing::error!("Failed to insert user: {:?}", e);
                    AppError::from(e)
                }
            })
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_streak(
        &self,
        id: i64,
        streak: i32,
        last_active_date: DateTime<Utc>,
        expected: Option<DateTime<Utc>>,
    ) -> Result<bool, AppError> {
        // Compare-and-set on the previously read timestamp.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET streak = $2, last_active_date = $3
            WHERE id = $1 AND last_active_date IS NOT DISTINCT FROM $4
            "#,
        )
        .bind(id)
        .bind(streak)
        .bind(last_active_date)
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update streak: {:?}", e);
            AppError::from(e)
        })?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl TopicStore for PgStore {
    async fn create_topic(&self, topic: NewTopic) -> Result<Topic, AppError> {
        let row = sqlx::query_as::<_, TopicRow>(
            r#"
            INSERT INTO topics (name, description, category)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, category, created_at
            "#,
        )
        .bind(&topic.name)
        .bind(&topic.description)
        .bind(topic.category.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert topic: {:?}", e);
            AppError::from(e)
        })?;

        row.try_into()
    }

    async fn find_topic(&self, id: i64) -> Result<Option<Topic>, AppError> {
        sqlx::query_as::<_, TopicRow>(
            "SELECT id, name, description, category, created_at FROM topics WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Topic::try_from)
        .transpose()
    }

    async fn find_topics_by_category(&self, category: Category) -> Result<Vec<Topic>, AppError> {
        sqlx::query_as::<_, TopicRow>(
            r#"
            SELECT id, name, description, category, created_at
            FROM topics
            WHERE category = $1
            ORDER BY id
            "#,
        )
        .bind(category.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Topic::try_from)
        .collect()
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn create_question(&self, question: NewQuestion) -> Result<Question, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions (topic_id, content, options, correct_answer, difficulty, explanation)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, topic_id, content, options, correct_answer, difficulty, explanation, created_at
            "#,
        )
        .bind(question.topic_id)
        .bind(&question.content)
        .bind(Json(&question.options))
        .bind(&question.correct_answer)
        .bind(question.difficulty.as_str())
        .bind(&question.explanation)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question: {:?}", e);
            AppError::from(e)
        })?;

        row.try_into()
    }

    async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<AnswerKey>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // One array bind, however many answers were submitted.
        let rows = sqlx::query_as::<_, AnswerKeyRow>(
            "SELECT id, topic_id, correct_answer, difficulty FROM questions WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(AnswerKey {
                    id: r.id,
                    topic_id: r.topic_id,
                    correct_answer: r.correct_answer,
                    difficulty: parse_stored(&r.difficulty)?,
                })
            })
            .collect()
    }

    async fn find_questions_by_topic(&self, topic_id: i64) -> Result<Vec<Question>, AppError> {
        sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, topic_id, content, options, correct_answer, difficulty, explanation, created_at
            FROM questions
            WHERE topic_id = $1
            ORDER BY id
            "#,
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Question::try_from)
        .collect()
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError> {
        let row = sqlx::query_as::<_, ResultRow>(
            r#"
            INSERT INTO results (
                user_id, topic_id, category, score, total_questions, correct_answers,
                wrong_answers, time_taken, accuracy, average_time_per_question, ai_feedback
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, user_id, topic_id, category, score, total_questions, correct_answers,
                wrong_answers, time_taken, accuracy, average_time_per_question, ai_feedback, created_at
            "#,
        )
        .bind(result.user_id)
        .bind(result.topic_id)
        .bind(result.category.as_str())
        .bind(result.score)
        .bind(result.total_questions)
        .bind(result.correct_answers)
        .bind(result.wrong_answers)
        .bind(result.time_taken)
        .bind(result.accuracy)
        .bind(result.average_time_per_question)
        .bind(&result.ai_feedback)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert result: {:?}", e);
            AppError::from(e)
        })?;

        row.try_into()
    }

    async fn find_results_by_user(
        &self,
        user_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<TestResult>, AppError> {
        sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, user_id, topic_id, category, score, total_questions, correct_answers,
                wrong_answers, time_taken, accuracy, average_time_per_question, ai_feedback, created_at
            FROM results
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR category = $2)
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .bind(category.map(|c| c.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TestResult::try_from)
        .collect()
    }
}
