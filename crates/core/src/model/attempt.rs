use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId, QuizId};

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// An option the learner picked for one question.
///
/// Correctness is unknown on the client until the whole batch has been
/// validated server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

impl Answer {
    #[must_use]
    pub fn new(question_id: QuestionId, option_id: OptionId) -> Self {
        Self {
            question_id,
            option_id,
        }
    }
}

/// One element of the validation service's verdict on a submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub question_id: QuestionId,
    pub option_id: OptionId,
    pub is_correct: bool,
}

impl AnswerResult {
    #[must_use]
    pub fn new(question_id: QuestionId, option_id: OptionId, is_correct: bool) -> Self {
        Self {
            question_id,
            option_id,
            is_correct,
        }
    }
}

//
// ─── ATTEMPT RECORD ────────────────────────────────────────────────────────────
//

/// Record of one completed quiz attempt, as persisted.
///
/// `completed_at_secs` is real elapsed time from start to completion;
/// anti-cheat penalties shorten the countdown, not this measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub quiz_id: QuizId,
    /// 1-based position of this attempt in the learner's history for the quiz.
    pub attempt_index: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at_secs: u32,
    pub score: u32,
    pub passed: bool,
}

impl Attempt {
    #[must_use]
    pub fn new(
        quiz_id: QuizId,
        attempt_index: u32,
        started_at: DateTime<Utc>,
        completed_at_secs: u32,
        score: u32,
        passed: bool,
    ) -> Self {
        Self {
            quiz_id,
            attempt_index,
            started_at,
            completed_at_secs,
            score,
            passed,
        }
    }
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Number of server-confirmed correct answers in a verdict batch.
#[must_use]
pub fn score_from_results(results: &[AnswerResult]) -> u32 {
    let correct = results.iter().filter(|r| r.is_correct).count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// Integer percentage of `score` out of `total` questions, floored.
///
/// Returns 100 exactly when every question was answered correctly, which
/// is what the pass check for final quizzes compares against.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    score.saturating_mul(100) / total
}

/// Star rating shown on the attempt summary screen.
#[must_use]
pub fn stars_for_percentage(percentage: u32) -> u8 {
    match percentage {
        p if p >= 90 => 5,
        p if p >= 80 => 4,
        p if p >= 70 => 3,
        p if p >= 50 => 2,
        p if p >= 30 => 1,
        _ => 0,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_counts_only_correct_results() {
        let results = vec![
            AnswerResult::new(QuestionId::new(1), OptionId::new(1), true),
            AnswerResult::new(QuestionId::new(2), OptionId::new(4), false),
            AnswerResult::new(QuestionId::new(3), OptionId::new(9), true),
        ];
        assert_eq!(score_from_results(&results), 2);
    }

    #[test]
    fn percentage_floors() {
        assert_eq!(percentage(5, 6), 83);
        assert_eq!(percentage(6, 6), 100);
        assert_eq!(percentage(0, 6), 0);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn star_thresholds() {
        assert_eq!(stars_for_percentage(100), 5);
        assert_eq!(stars_for_percentage(90), 5);
        assert_eq!(stars_for_percentage(89), 4);
        assert_eq!(stars_for_percentage(80), 4);
        assert_eq!(stars_for_percentage(79), 3);
        assert_eq!(stars_for_percentage(70), 3);
        assert_eq!(stars_for_percentage(69), 2);
        assert_eq!(stars_for_percentage(50), 2);
        assert_eq!(stars_for_percentage(49), 1);
        assert_eq!(stars_for_percentage(30), 1);
        assert_eq!(stars_for_percentage(29), 0);
        assert_eq!(stars_for_percentage(0), 0);
    }

    #[test]
    fn attempt_record_holds_real_elapsed_seconds() {
        let attempt = Attempt::new(
            QuizId::new(4),
            2,
            crate::time::fixed_now(),
            90,
            5,
            false,
        );
        assert_eq!(attempt.completed_at_secs, 90);
        assert_eq!(attempt.attempt_index, 2);
        assert!(!attempt.passed);
    }
}
