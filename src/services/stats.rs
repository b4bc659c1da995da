// src/services/stats.rs

//! Folds over a user's result history.

use std::collections::HashSet;

use crate::models::{
    test_result::{Stats, TestResult},
    topic::{Progress, Topic, TopicWithProgress},
};

fn round_to_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Summary statistics. An empty history yields all zeros.
pub fn compute_stats(results: &[TestResult]) -> Stats {
    if results.is_empty() {
        return Stats {
            total_tests: 0,
            average_score: 0.0,
            average_accuracy: 0,
            topics_completed: 0,
        };
    }

    let count = results.len() as f64;
    let score_sum: f64 = results.iter().map(|r| r.score as f64).sum();
    let accuracy_sum: f64 = results.iter().map(|r| r.accuracy).sum();
    let topics: HashSet<i64> = results.iter().map(|r| r.topic_id).collect();

    Stats {
        total_tests: results.len() as i64,
        average_score: round_to_one_decimal(score_sum / count),
        average_accuracy: (accuracy_sum / count).round() as i64,
        topics_completed: topics.len() as i64,
    }
}

/// Attaches the best (highest accuracy) result per topic.
///
/// On equal accuracy the earlier result in `results` is kept.
pub fn attach_progress(topics: Vec<Topic>, results: &[TestResult]) -> Vec<TopicWithProgress> {
    topics
        .into_iter()
        .map(|topic| {
            let best = results
                .iter()
                .filter(|r| r.topic_id == topic.id)
                .fold(None::<&TestResult>, |best, r| match best {
                    Some(b) if b.accuracy >= r.accuracy => Some(b),
                    _ => Some(r),
                });

            let progress = best.map(|r| Progress {
                score: r.score,
                total_questions: r.total_questions,
                accuracy: r.accuracy,
                completed: true,
            });

            TopicWithProgress { topic, progress }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::category::Category;

    fn result(id: i64, topic_id: i64, score: i32, total: i32) -> TestResult {
        TestResult {
            id,
            user_id: 1,
            topic_id,
            category: Category::Quant,
            score,
            total_questions: total,
            correct_answers: score,
            wrong_answers: total - score,
            time_taken: 60,
            accuracy: score as f64 / total as f64 * 100.0,
            average_time_per_question: 60.0 / total as f64,
            ai_feedback: String::new(),
            created_at: Utc::now(),
        }
    }

    fn topic(id: i64) -> Topic {
        Topic {
            id,
            name: format!("Topic {}", id),
            description: String::new(),
            category: Category::Quant,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_empty_history() {
        let stats = compute_stats(&[]);
        assert_eq!(
            stats,
            Stats {
                total_tests: 0,
                average_score: 0.0,
                average_accuracy: 0,
                topics_completed: 0
            }
        );
    }

    #[test]
    fn test_stats_rounding() {
        // Scores 2, 3, 3 -> mean 2.666.. -> 2.7
        // Accuracies 66.66.., 100, 75 -> mean 80.55.. -> 81
        let results = vec![result(1, 10, 2, 3), result(2, 10, 3, 3), result(3, 11, 3, 4)];
        let stats = compute_stats(&results);
        assert_eq!(stats.total_tests, 3);
        assert_eq!(stats.average_score, 2.7);
        assert_eq!(stats.average_accuracy, 81);
        assert_eq!(stats.topics_completed, 2);
    }

    #[test]
    fn test_progress_picks_highest_accuracy() {
        let results = vec![result(1, 10, 6, 10), result(2, 10, 9, 10)];
        let listed = attach_progress(vec![topic(10), topic(11)], &results);

        let progress = listed[0].progress.as_ref().unwrap();
        assert_eq!(progress.accuracy, 90.0);
        assert_eq!(progress.score, 9);
        assert!(progress.completed);
        assert!(listed[1].progress.is_none());
    }

    #[test]
    fn test_progress_tie_keeps_first() {
        // Same accuracy (50%), different scores.
        let results = vec![result(1, 10, 1, 2), result(2, 10, 2, 4)];
        let listed = attach_progress(vec![topic(10)], &results);
        assert_eq!(listed[0].progress.as_ref().unwrap().total_questions, 2);
    }
}
