// src/services/results.rs

use std::{collections::HashMap, time::Duration};

use crate::{
    error::AppError,
    models::{
        category::Category,
        question::AnswerKey,
        test_result::{NewTestResult, Stats, SubmitResultRequest, TestResult},
        topic::TopicWithProgress,
    },
    services::{
        feedback::{FeedbackContext, FeedbackProvider, build_prompt, generate_feedback},
        scoring::score_attempt,
        stats::{attach_progress, compute_stats},
    },
    store::{QuestionStore, ResultStore, Store, TopicStore, UserStore},
};

async fn ensure_user(store: &dyn Store, user_id: i64) -> Result<(), AppError> {
    store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    Ok(())
}

/// Scores a submitted attempt, asks for feedback and stores the result.
///
/// Feedback problems never fail the submission. Recording the streak is the
/// caller's job.
pub async fn submit_result(
    store: &dyn Store,
    provider: &dyn FeedbackProvider,
    feedback_timeout: Duration,
    user_id: i64,
    req: SubmitResultRequest,
) -> Result<TestResult, AppError> {
    if req.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }
    let time_taken = i32::try_from(req.time_taken)
        .ok()
        .filter(|t| *t >= 0)
        .ok_or(AppError::BadRequest(
            "timeTaken must be a non-negative number of seconds".to_string(),
        ))?;

    ensure_user(store, user_id).await?;

    let topic = store
        .find_topic(req.topic_id)
        .await?
        .ok_or(AppError::NotFound("Topic not found".to_string()))?;

    if topic.category != req.category {
        return Err(AppError::BadRequest(format!(
            "Topic '{}' belongs to category '{}', not '{}'",
            topic.name, topic.category, req.category
        )));
    }

    let question_ids: Vec<i64> = req.answers.keys().copied().collect();
    let keys: HashMap<i64, AnswerKey> = store
        .find_questions_by_ids(&question_ids)
        .await?
        .into_iter()
        .map(|k| (k.id, k))
        .collect();

    let mut foreign: Vec<i64> = keys
        .values()
        .filter(|k| k.topic_id != topic.id)
        .map(|k| k.id)
        .collect();
    if !foreign.is_empty() {
        foreign.sort_unstable();
        let ids: Vec<String> = foreign.iter().map(|id| id.to_string()).collect();
        return Err(AppError::BadRequest(format!(
            "Questions {} do not belong to topic '{}'",
            ids.join(", "),
            topic.name
        )));
    }

    let scorecard = score_attempt(&req.answers, &keys)?;

    let prompt = build_prompt(&FeedbackContext {
        topic_name: &topic.name,
        category: req.category,
        scorecard: &scorecard,
        time_taken,
    });
    let ai_feedback = generate_feedback(provider, &prompt, feedback_timeout).await;

    let result = store
        .insert_result(NewTestResult {
            user_id,
            topic_id: topic.id,
            category: req.category,
            score: scorecard.score(),
            total_questions: scorecard.total_questions,
            correct_answers: scorecard.correct_answers,
            wrong_answers: scorecard.wrong_answers,
            time_taken,
            accuracy: scorecard.accuracy(),
            average_time_per_question: scorecard.average_time_per_question(time_taken),
            ai_feedback,
        })
        .await?;

    tracing::info!(
        user_id,
        topic_id = result.topic_id,
        result_id = result.id,
        accuracy = result.accuracy,
        "Stored test result"
    );

    Ok(result)
}

pub async fn get_stats(store: &dyn Store, user_id: i64) -> Result<Stats, AppError> {
    ensure_user(store, user_id).await?;
    let results = store.find_results_by_user(user_id, None).await?;
    Ok(compute_stats(&results))
}

pub async fn topics_with_progress(
    store: &dyn Store,
    category: Category,
    user_id: i64,
) -> Result<Vec<TopicWithProgress>, AppError> {
    let topics = store.find_topics_by_category(category).await?;
    let results = store.find_results_by_user(user_id, Some(category)).await?;
    Ok(attach_progress(topics, &results))
}

/// The user's results, newest first.
pub async fn history(store: &dyn Store, user_id: i64) -> Result<Vec<TestResult>, AppError> {
    let mut results = store.find_results_by_user(user_id, None).await?;
    results.reverse();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        models::{
            category::Difficulty,
            question::NewQuestion,
            topic::NewTopic,
            user::NewUser,
        },
        services::feedback::{DisabledProvider, FALLBACK_FEEDBACK},
        store::MemoryStore,
    };

    struct Fixture {
        store: MemoryStore,
        user_id: i64,
        topic_id: i64,
        question_ids: Vec<i64>,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "r@example.com".to_string(),
                name: "R".to_string(),
                password: "hash".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();
        let topic = store
            .create_topic(NewTopic {
                name: "Ratios".to_string(),
                description: String::new(),
                category: Category::Quant,
            })
            .await
            .unwrap();

        let mut question_ids = Vec::new();
        for (i, difficulty) in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Hard]
            .into_iter()
            .enumerate()
        {
            let q = store
                .create_question(NewQuestion {
                    topic_id: topic.id,
                    content: format!("Question {}", i),
                    options: vec!["A".to_string(), "B".to_string()],
                    correct_answer: "A".to_string(),
                    difficulty,
                    explanation: None,
                })
                .await
                .unwrap();
            question_ids.push(q.id);
        }

        Fixture {
            user_id: user.id,
            topic_id: topic.id,
            store,
            question_ids,
        }
    }

    fn request(f: &Fixture, correct: usize, time_taken: i64) -> SubmitResultRequest {
        let answers = f
            .question_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, if i < correct { "A" } else { "B" }.to_string()))
            .collect();
        SubmitResultRequest {
            topic_id: f.topic_id,
            category: Category::Quant,
            answers,
            time_taken,
        }
    }

    #[tokio::test]
    async fn test_submit_scores_server_side() {
        let f = fixture().await;
        let timeout = Duration::from_secs(1);

        let result = submit_result(&f.store, &DisabledProvider, timeout, f.user_id, request(&f, 3, 100))
            .await
            .unwrap();

        assert_eq!(result.total_questions, 4);
        assert_eq!(result.correct_answers, 3);
        assert_eq!(result.wrong_answers, 1);
        assert_eq!(result.score, 3);
        assert_eq!(result.accuracy, 75.0);
        assert_eq!(result.average_time_per_question, 25.0);
        assert_eq!(result.ai_feedback, FALLBACK_FEEDBACK);
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_input() {
        let f = fixture().await;
        let timeout = Duration::from_secs(1);

        let mut empty = request(&f, 0, 10);
        empty.answers.clear();
        let err = submit_result(&f.store, &DisabledProvider, timeout, f.user_id, empty)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = submit_result(&f.store, &DisabledProvider, timeout, f.user_id, request(&f, 1, -5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut wrong_category = request(&f, 1, 10);
        wrong_category.category = Category::Verbal;
        let err = submit_result(&f.store, &DisabledProvider, timeout, f.user_id, wrong_category)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let mut missing_topic = request(&f, 1, 10);
        missing_topic.topic_id = 9999;
        let err = submit_result(&f.store, &DisabledProvider, timeout, f.user_id, missing_topic)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Nothing was stored.
        assert!(history(&f.store, f.user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_questions_from_another_topic() {
        let f = fixture().await;
        let timeout = Duration::from_secs(1);

        let easy = f
            .store
            .create_topic(NewTopic {
                name: "Synonyms".to_string(),
                description: String::new(),
                category: Category::Verbal,
            })
            .await
            .unwrap();
        let easy_q = f
            .store
            .create_question(NewQuestion {
                topic_id: easy.id,
                content: "Pick A".to_string(),
                options: vec!["A".to_string()],
                correct_answer: "A".to_string(),
                difficulty: Difficulty::Easy,
                explanation: None,
            })
            .await
            .unwrap();

        // Borrowed question alone, then mixed in with the topic's own ones.
        let mut borrowed = request(&f, 0, 10);
        borrowed.answers = HashMap::from([(easy_q.id, "A".to_string())]);
        let mut mixed = request(&f, 4, 10);
        mixed.answers.insert(easy_q.id, "A".to_string());

        for req in [borrowed, mixed] {
            match submit_result(&f.store, &DisabledProvider, timeout, f.user_id, req).await {
                Err(AppError::BadRequest(msg)) => assert!(msg.contains(&easy_q.id.to_string())),
                other => panic!("expected BadRequest, got {:?}", other.map(|r| r.id)),
            }
        }

        assert!(history(&f.store, f.user_id).await.unwrap().is_empty());
        let stats = get_stats(&f.store, f.user_id).await.unwrap();
        assert_eq!(stats.topics_completed, 0);
    }

    #[tokio::test]
    async fn test_stats_and_progress_after_submissions() {
        let f = fixture().await;
        let timeout = Duration::from_secs(1);

        for correct in [2, 4] {
            submit_result(&f.store, &DisabledProvider, timeout, f.user_id, request(&f, correct, 60))
                .await
                .unwrap();
        }

        let stats = get_stats(&f.store, f.user_id).await.unwrap();
        assert_eq!(stats.total_tests, 2);
        assert_eq!(stats.average_score, 3.0);
        assert_eq!(stats.average_accuracy, 75);
        assert_eq!(stats.topics_completed, 1);

        let topics = topics_with_progress(&f.store, Category::Quant, f.user_id).await.unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].progress.as_ref().unwrap().accuracy, 100.0);

        let other = topics_with_progress(&f.store, Category::Verbal, f.user_id).await.unwrap();
        assert!(other.is_empty());

        let listed = history(&f.store, f.user_id).await.unwrap();
        assert_eq!(listed[0].correct_answers, 4);
    }
}
