// src/services/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    error::AppError,
    models::{category::Difficulty, question::AnswerKey},
};

/// Correct-vs-total tally for one difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierTally {
    pub correct: i32,
    pub total: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DifficultyBreakdown {
    pub easy: TierTally,
    pub medium: TierTally,
    pub hard: TierTally,
}

impl DifficultyBreakdown {
    fn tier_mut(&mut self, difficulty: Difficulty) -> &mut TierTally {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Outcome of re-checking a submission against the stored answer keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    /// Always > 0.
    pub total_questions: i32,
    pub correct_answers: i32,
    pub wrong_answers: i32,
    pub breakdown: DifficultyBreakdown,
}

impl Scorecard {
    /// One point per correct answer.
    pub fn score(&self) -> i32 {
        self.correct_answers
    }

    /// Percentage of correct answers, in `0..=100`.
    pub fn accuracy(&self) -> f64 {
        self.correct_answers as f64 / self.total_questions as f64 * 100.0
    }

    pub fn average_time_per_question(&self, time_taken: i32) -> f64 {
        time_taken as f64 / self.total_questions as f64
    }
}

/// Scores `answers` (question id -> submitted answer) against `keys`.
///
/// Client-side scores are never trusted: every answer is compared with the
/// stored correct answer after trimming surrounding whitespace.
pub fn score_attempt(
    answers: &HashMap<i64, String>,
    keys: &HashMap<i64, AnswerKey>,
) -> Result<Scorecard, AppError> {
    if answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let mut missing: Vec<i64> = answers
        .keys()
        .filter(|id| !keys.contains_key(id))
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        let ids: Vec<String> = missing.iter().map(|id| id.to_string()).collect();
        return Err(AppError::NotFound(format!(
            "Questions not found: {}",
            ids.join(", ")
        )));
    }

    let total_questions = i32::try_from(answers.len())
        .map_err(|_| AppError::BadRequest("Too many answers submitted".to_string()))?;

    let mut correct_answers = 0;
    let mut breakdown = DifficultyBreakdown::default();

    for (q_id, user_ans) in answers {
        let key = &keys[q_id];
        let tier = breakdown.tier_mut(key.difficulty);
        tier.total += 1;

        if user_ans.trim() == key.correct_answer.trim() {
            correct_answers += 1;
            tier.correct += 1;
        }
    }

    Ok(Scorecard {
        total_questions,
        correct_answers,
        wrong_answers: total_questions - correct_answers,
        breakdown,
    })
}
