// src/services/streak.rs

//! Daily streak tracking.
//!
//! A streak advances at most once per calendar day. Both the stored
//! `last_active_date` and "now" are reduced to a date in the configured offset
//! before they are compared, so time of day never matters.

use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::{
    config::{Config, STREAK_UPDATE_ATTEMPTS},
    error::AppError,
    models::streak::{StreakStatus, StreakUpdate},
    store::{Store, UserStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// No previous activity.
    Started,
    /// Already active today. Only the timestamp moves.
    AlreadyCounted,
    /// Last activity was yesterday.
    Increased,
    /// Two or more days without activity.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakDecision {
    pub transition: StreakTransition,
    pub streak: i32,
}

impl StreakDecision {
    pub fn updated(&self) -> bool {
        self.transition != StreakTransition::AlreadyCounted
    }

    pub fn message(&self) -> String {
        match self.transition {
            StreakTransition::Started => "Streak started! Day 1".to_string(),
            StreakTransition::AlreadyCounted => "Daily streak already counted!".to_string(),
            StreakTransition::Increased => format!("Streak increased! Day {}", self.streak),
            StreakTransition::Reset => "Streak reset! Day 1".to_string(),
        }
    }
}

impl From<StreakDecision> for StreakUpdate {
    fn from(decision: StreakDecision) -> Self {
        StreakUpdate {
            updated: decision.updated(),
            streak: decision.streak,
            message: decision.message(),
        }
    }
}

/// The offset whose midnight starts a new streak day. Falls back to UTC when
/// the configured value is out of range.
pub fn day_offset(config: &Config) -> FixedOffset {
    FixedOffset::east_opt(config.streak_utc_offset_minutes.saturating_mul(60)).unwrap_or_else(|| {
        tracing::warn!(
            "STREAK_UTC_OFFSET_MINUTES={} is out of range, using UTC",
            config.streak_utc_offset_minutes
        );
        Utc.fix()
    })
}

/// Whole calendar days from `last` to `now`, both taken at midnight in `offset`.
pub fn day_diff(last: DateTime<Utc>, now: DateTime<Utc>, offset: FixedOffset) -> i64 {
    let today = now.with_timezone(&offset).date_naive();
    let last_day = last.with_timezone(&offset).date_naive();
    (today - last_day).num_days()
}

/// Pure transition function of the streak state machine.
pub fn evaluate(
    streak: i32,
    last_active_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> StreakDecision {
    let Some(last) = last_active_date else {
        return StreakDecision {
            transition: StreakTransition::Started,
            streak: 1,
        };
    };

    match day_diff(last, now, offset) {
        // A future timestamp (clock skew) counts as today.
        d if d <= 0 => StreakDecision {
            transition: StreakTransition::AlreadyCounted,
            streak,
        },
        1 => StreakDecision {
            transition: StreakTransition::Increased,
            streak: streak.saturating_add(1),
        },
        _ => StreakDecision {
            transition: StreakTransition::Reset,
            streak: 1,
        },
    }
}

/// Records a qualifying activity for `user_id` at `now`.
///
/// The write is conditional on the `last_active_date` that was read, so two
/// concurrent first activities of the day cannot both increment. A lost race
/// re-reads and re-evaluates, which lands in the "already counted" branch.
/// A lost write in that branch is not retried: the competing writer has
/// already refreshed the timestamp for the same day.
pub async fn record_activity(
    store: &dyn Store,
    user_id: i64,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<StreakUpdate, AppError> {
    for attempt in 1..=STREAK_UPDATE_ATTEMPTS {
        let user = store
            .find_user(user_id)
            .await?
            .ok_or(AppError::NotFound("User not found".to_string()))?;

        let decision = evaluate(user.streak, user.last_active_date, now, offset);

        if store
            .update_streak(user_id, decision.streak, now, user.last_active_date)
            .await?
        {
            tracing::info!(
                user_id,
                streak = decision.streak,
                transition = ?decision.transition,
                "Recorded activity"
            );
            return Ok(decision.into());
        }

        // Losing a same-day refresh means another request already counted today.
        if decision.transition == StreakTransition::AlreadyCounted {
            return Ok(decision.into());
        }

        tracing::debug!(user_id, attempt, "Streak update lost a race, retrying");
    }

    tracing::warn!(user_id, "Streak update still contended after retries");
    Err(AppError::Conflict(
        "Streak is being updated concurrently, try again".to_string(),
    ))
}

pub async fn get_streak(store: &dyn Store, user_id: i64) -> Result<StreakStatus, AppError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(StreakStatus {
        streak: user.streak,
        last_active_date: user.last_active_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use async_trait::async_trait;

    use crate::{
        models::{
            category::Category,
            question::{AnswerKey, NewQuestion, Question},
            test_result::{NewTestResult, TestResult},
            topic::{NewTopic, Topic},
            user::{NewUser, User},
        },
        store::{MemoryStore, QuestionStore, ResultStore, TopicStore},
    };

    /// Every conditional write loses, as if another request always got in first.
    struct AlwaysLosesStore(MemoryStore);

    #[async_trait]
    impl UserStore for AlwaysLosesStore {
        async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
            self.0.create_user(user).await
        }
        async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
            self.0.find_user(id).await
        }
        async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
            self.0.find_user_by_email(email).await
        }
        async fn update_streak(
            &self,
            _id: i64,
            _streak: i32,
            _last_active_date: DateTime<Utc>,
            _expected: Option<DateTime<Utc>>,
        ) -> Result<bool, AppError> {
            Ok(false)
        }
    }

    #[async_trait]
    impl TopicStore for AlwaysLosesStore {
        async fn create_topic(&self, topic: NewTopic) -> Result<Topic, AppError> {
            self.0.create_topic(topic).await
        }
        async fn find_topic(&self, id: i64) -> Result<Option<Topic>, AppError> {
            self.0.find_topic(id).await
        }
        async fn find_topics_by_category(&self, category: Category) -> Result<Vec<Topic>, AppError> {
            self.0.find_topics_by_category(category).await
        }
    }

    #[async_trait]
    impl QuestionStore for AlwaysLosesStore {
        async fn create_question(&self, question: NewQuestion) -> Result<Question, AppError> {
            self.0.create_question(question).await
        }
        async fn find_questions_by_ids(&self, ids: &[i64]) -> Result<Vec<AnswerKey>, AppError> {
            self.0.find_questions_by_ids(ids).await
        }
        async fn find_questions_by_topic(&self, topic_id: i64) -> Result<Vec<Question>, AppError> {
            self.0.find_questions_by_topic(topic_id).await
        }
    }

    #[async_trait]
    impl ResultStore for AlwaysLosesStore {
        async fn insert_result(&self, result: NewTestResult) -> Result<TestResult, AppError> {
            self.0.insert_result(result).await
        }
        async fn find_results_by_user(
            &self,
            user_id: i64,
            category: Option<Category>,
        ) -> Result<Vec<TestResult>, AppError> {
            self.0.find_results_by_user(user_id, category).await
        }
    }

    async fn contended_user(last_active_date: Option<DateTime<Utc>>) -> (AlwaysLosesStore, i64) {
        let inner = MemoryStore::new();
        let user = inner
            .create_user(NewUser {
                email: "busy@example.com".to_string(),
                name: "Busy".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();
        inner.set_streak_state(user.id, 3, last_active_date).await.unwrap();
        (AlwaysLosesStore(inner), user.id)
    }

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let decision = evaluate(0, None, at(2024, 3, 10, 12, 0), utc());
        assert_eq!(decision.transition, StreakTransition::Started);
        assert_eq!(decision.streak, 1);
        assert!(decision.updated());
        assert_eq!(decision.message(), "Streak started! Day 1");
    }

    #[test]
    fn test_same_day_is_not_counted_twice() {
        // 20 hours apart, same calendar day.
        let last = at(2024, 3, 10, 1, 0);
        let now = at(2024, 3, 10, 21, 0);
        let decision = evaluate(4, Some(last), now, utc());
        assert_eq!(decision.transition, StreakTransition::AlreadyCounted);
        assert_eq!(decision.streak, 4);
        assert!(!decision.updated());
        assert_eq!(decision.message(), "Daily streak already counted!");
    }

    #[test]
    fn test_midnight_crossing_counts_as_next_day() {
        // Two minutes apart, different calendar days.
        let last = at(2024, 3, 10, 23, 59);
        let now = at(2024, 3, 11, 0, 1);
        let decision = evaluate(4, Some(last), now, utc());
        assert_eq!(decision.transition, StreakTransition::Increased);
        assert_eq!(decision.streak, 5);
        assert_eq!(decision.message(), "Streak increased! Day 5");
    }

    #[test]
    fn test_gap_resets_streak() {
        let last = at(2024, 3, 7, 12, 0);
        let now = at(2024, 3, 10, 8, 0);
        let decision = evaluate(9, Some(last), now, utc());
        assert_eq!(decision.transition, StreakTransition::Reset);
        assert_eq!(decision.streak, 1);
        assert_eq!(decision.message(), "Streak reset! Day 1");
    }

    #[test]
    fn test_future_last_active_is_same_day() {
        let now = at(2024, 3, 10, 8, 0);
        let decision = evaluate(3, Some(now + Duration::days(2)), now, utc());
        assert_eq!(decision.transition, StreakTransition::AlreadyCounted);
        assert_eq!(decision.streak, 3);
    }

    #[test]
    fn test_offset_moves_day_boundary() {
        // 22:00 and 02:00 UTC are the same day at UTC+05:30 (03:30 and 07:30 next day).
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        let last = at(2024, 3, 10, 22, 0);
        let now = at(2024, 3, 11, 2, 0);
        assert_eq!(day_diff(last, now, utc()), 1);
        assert_eq!(day_diff(last, now, ist), 0);
    }

    #[tokio::test]
    async fn test_record_activity_persists_state() {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "streak@example.com".to_string(),
                name: "Streak".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();

        let day1 = at(2024, 3, 10, 9, 0);
        let first = record_activity(&store, user.id, day1, utc()).await.unwrap();
        assert_eq!(first, StreakUpdate { updated: true, streak: 1, message: "Streak started! Day 1".to_string() });

        let later = day1 + Duration::hours(5);
        let again = record_activity(&store, user.id, later, utc()).await.unwrap();
        assert!(!again.updated);
        assert_eq!(again.streak, 1);

        // Timestamp refreshed even though the streak did not move.
        let status = get_streak(&store, user.id).await.unwrap();
        assert_eq!(status.last_active_date, Some(later));

        let next = record_activity(&store, user.id, day1 + Duration::days(1), utc())
            .await
            .unwrap();
        assert_eq!(next.streak, 2);
        assert!(next.updated);
    }

    #[tokio::test]
    async fn test_record_activity_unknown_user() {
        let store = MemoryStore::new();
        let err = record_activity(&store, 42, Utc::now(), utc()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = get_streak(&store, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lost_same_day_refresh_is_not_a_conflict() {
        let now = at(2024, 3, 10, 18, 0);
        let (store, user_id) = contended_user(Some(at(2024, 3, 10, 8, 0))).await;

        let update = record_activity(&store, user_id, now, utc()).await.unwrap();
        assert!(!update.updated);
        assert_eq!(update.streak, 3);
        assert_eq!(update.message, "Daily streak already counted!");
    }

    #[tokio::test]
    async fn test_lost_increment_retries_then_conflicts() {
        let now = at(2024, 3, 10, 18, 0);
        let (store, user_id) = contended_user(Some(at(2024, 3, 9, 8, 0))).await;

        let err = record_activity(&store, user_id, now, utc()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Nothing was written.
        let status = get_streak(&store, user_id).await.unwrap();
        assert_eq!(status.streak, 3);
    }
}
