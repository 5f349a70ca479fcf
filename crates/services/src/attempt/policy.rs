//! Attempt limits and the post-scoring decision table.

use crate::error::AttemptError;

/// Hard cap on recorded attempts for a final quiz.
pub const MAX_FINAL_ATTEMPTS: u32 = 3;

/// What happens after an attempt finishes scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Non-final quizzes complete their lesson whatever the score was.
    CompleteLesson,
    /// A final quiz passed with a perfect score: issue a certificate and
    /// leave for the certificates view.
    IssueCertificate,
    /// A final quiz failed with attempts to spare.
    OfferRetry { used: u32, max: u32 },
    /// A final quiz failed on the last allowed attempt: the course progress
    /// is wiped and the learner starts over.
    ExhaustedReset,
}

/// Gate on starting an attempt, given how many are already recorded.
///
/// # Errors
///
/// [`AttemptError::AlreadyAttempted`] for a non-final quiz with a recorded
/// attempt; [`AttemptError::AttemptLimitReached`] for a final quiz at the
/// cap.
pub fn ensure_can_start(is_final: bool, prior_attempts: u32) -> Result<(), AttemptError> {
    if is_final {
        if prior_attempts >= MAX_FINAL_ATTEMPTS {
            return Err(AttemptError::AttemptLimitReached {
                used: prior_attempts,
                max: MAX_FINAL_ATTEMPTS,
            });
        }
    } else if prior_attempts >= 1 {
        return Err(AttemptError::AlreadyAttempted);
    }
    Ok(())
}

/// Decide what a finished attempt leads to.
///
/// `attempt_index` is 1-based; only final quizzes branch on it. Passing a
/// final quiz means a full score, nothing less.
#[must_use]
pub fn decide(is_final: bool, attempt_index: u32, percentage: u32) -> PolicyDecision {
    if !is_final {
        return PolicyDecision::CompleteLesson;
    }
    if percentage >= 100 {
        return PolicyDecision::IssueCertificate;
    }
    if attempt_index >= MAX_FINAL_ATTEMPTS {
        return PolicyDecision::ExhaustedReset;
    }
    PolicyDecision::OfferRetry {
        used: attempt_index,
        max: MAX_FINAL_ATTEMPTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_final_single_attempt_gate() {
        assert!(ensure_can_start(false, 0).is_ok());
        assert!(matches!(
            ensure_can_start(false, 1),
            Err(AttemptError::AlreadyAttempted)
        ));
    }

    #[test]
    fn test_final_three_attempt_gate() {
        assert!(ensure_can_start(true, 0).is_ok());
        assert!(ensure_can_start(true, 2).is_ok());
        assert!(matches!(
            ensure_can_start(true, 3),
            Err(AttemptError::AttemptLimitReached { used: 3, max: 3 })
        ));
    }

    #[test]
    fn test_non_final_always_completes_the_lesson() {
        assert_eq!(decide(false, 1, 0), PolicyDecision::CompleteLesson);
        assert_eq!(decide(false, 1, 40), PolicyDecision::CompleteLesson);
        assert_eq!(decide(false, 1, 100), PolicyDecision::CompleteLesson);
    }

    #[test]
    fn test_final_pass_requires_full_score() {
        assert_eq!(decide(true, 1, 100), PolicyDecision::IssueCertificate);
        assert_eq!(decide(true, 3, 100), PolicyDecision::IssueCertificate);
        assert_eq!(
            decide(true, 1, 99),
            PolicyDecision::OfferRetry { used: 1, max: 3 }
        );
    }

    #[test]
    fn test_final_failures_retry_then_reset() {
        assert_eq!(
            decide(true, 1, 60),
            PolicyDecision::OfferRetry { used: 1, max: 3 }
        );
        assert_eq!(
            decide(true, 2, 60),
            PolicyDecision::OfferRetry { used: 2, max: 3 }
        );
        assert_eq!(decide(true, 3, 60), PolicyDecision::ExhaustedReset);
    }
}
