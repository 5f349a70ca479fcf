//! State machine for one run through one quiz.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use course_core::countdown::Countdown;
use course_core::model::{
    percentage, score_from_results, stars_for_percentage, Answer, AnswerResult, Attempt, OptionId,
    Question, QuizDefinition, SessionSettings,
};

use crate::anticheat::{AntiCheatMonitor, BlockedSignal, FocusLossOutcome};
use crate::error::AttemptError;

/// Summary of a finished attempt, sized for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptReport {
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u32,
    pub stars: u8,
    /// Real seconds from start to completion. Penalties shorten the
    /// countdown, not this measurement.
    pub elapsed_secs: u32,
    pub passed: bool,
    pub attempt_index: u32,
    /// False when validation was unavailable and the attempt fell back to
    /// a zero score.
    pub scored: bool,
}

/// What one submitted answer led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// More questions remain.
    NextQuestion,
    /// That was the last question; the batch is ready for validation.
    /// Yielded exactly once per attempt.
    ReadyForScoring(Vec<Answer>),
    /// Scoring is already underway; the duplicate trigger is dropped.
    AwaitingResults,
}

enum AttemptPhase {
    NotStarted,
    Active(ActiveAttempt),
    Completed(CompletedAttempt),
}

struct ActiveAttempt {
    started_at: DateTime<Utc>,
    timer: Countdown,
    current: usize,
    answers: Vec<Answer>,
    monitor: AntiCheatMonitor,
    scoring_requested: bool,
}

struct CompletedAttempt {
    started_at: DateTime<Utc>,
    report: AttemptReport,
}

/// Drives one quiz attempt from start through scoring to its report.
///
/// The machine never talks to the network or the clock itself: callers
/// feed it `now` and the validation verdicts. Scoring happens exactly
/// once per attempt: whichever of "last answer submitted" or "time
/// expired" comes first claims it, and the loser is swallowed.
pub struct QuizAttemptMachine {
    quiz: QuizDefinition,
    attempt_index: u32,
    settings: SessionSettings,
    phase: AttemptPhase,
}

impl QuizAttemptMachine {
    /// Prepare an attempt for `quiz` at the given 1-based index.
    #[must_use]
    pub fn new(quiz: QuizDefinition, attempt_index: u32, settings: SessionSettings) -> Self {
        Self {
            quiz,
            attempt_index,
            settings,
            phase: AttemptPhase::NotStarted,
        }
    }

    /// Begin the attempt: the countdown starts and the anti-cheat monitor
    /// attaches.
    ///
    /// # Errors
    ///
    /// `AttemptError::NoQuestions` when the quiz has nothing to ask, and
    /// `AttemptError::AlreadyStarted` when the attempt left its initial
    /// state earlier. In both cases the state is unchanged.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), AttemptError> {
        if !matches!(self.phase, AttemptPhase::NotStarted) {
            return Err(AttemptError::AlreadyStarted);
        }
        if self.quiz.question_count() == 0 {
            return Err(AttemptError::NoQuestions);
        }
        self.phase = AttemptPhase::Active(ActiveAttempt {
            started_at: now,
            timer: Countdown::new(now, self.quiz.duration_secs()),
            current: 0,
            answers: Vec::new(),
            monitor: AntiCheatMonitor::new(
                self.settings.violation_limit(),
                self.settings.focus_penalty_secs(),
            ),
            scoring_requested: false,
        });
        debug!(quiz = %self.quiz.id(), attempt = self.attempt_index, "quiz attempt started");
        Ok(())
    }

    /// Record the learner's pick for the current question.
    ///
    /// # Errors
    ///
    /// `AttemptError::NotActive` outside the active state.
    pub fn submit_answer(&mut self, option: OptionId) -> Result<SubmitOutcome, AttemptError> {
        let AttemptPhase::Active(active) = &mut self.phase else {
            return Err(AttemptError::NotActive);
        };
        if active.scoring_requested {
            return Ok(SubmitOutcome::AwaitingResults);
        }
        if let Some(question) = self.quiz.question_at(active.current) {
            active.answers.push(Answer::new(question.id(), option));
            active.current += 1;
        }
        if active.current >= self.quiz.question_count() {
            active.scoring_requested = true;
            debug!(quiz = %self.quiz.id(), "all questions answered, requesting scoring");
            return Ok(SubmitOutcome::ReadyForScoring(active.answers.clone()));
        }
        Ok(SubmitOutcome::NextQuestion)
    }

    /// Claim the timeout if the countdown has elapsed and scoring was not
    /// already requested. Returns the answers given so far, exactly once.
    pub fn poll_timeout(&mut self, now: DateTime<Utc>) -> Option<Vec<Answer>> {
        let AttemptPhase::Active(active) = &mut self.phase else {
            return None;
        };
        if active.scoring_requested || !active.timer.is_elapsed(now) {
            return None;
        }
        active.scoring_requested = true;
        debug!(
            quiz = %self.quiz.id(),
            answered = active.answers.len(),
            "time expired, scoring the answers given so far"
        );
        Some(active.answers.clone())
    }

    /// Record a focus-loss violation; a triggered penalty is deducted from
    /// the countdown on the spot.
    ///
    /// # Errors
    ///
    /// `AttemptError::NotActive` outside the active state.
    pub fn on_focus_loss(&mut self) -> Result<FocusLossOutcome, AttemptError> {
        let AttemptPhase::Active(active) = &mut self.phase else {
            return Err(AttemptError::NotActive);
        };
        let outcome = active.monitor.on_focus_loss();
        if let FocusLossOutcome::Penalty { seconds } = outcome {
            active.timer.apply_penalty(seconds);
        }
        Ok(outcome)
    }

    /// Report a suppressed shortcut. Ignored outside the active state.
    pub fn on_blocked_shortcut(&self, signal: BlockedSignal) {
        if let AttemptPhase::Active(active) = &self.phase {
            active.monitor.on_blocked_shortcut(signal);
        }
    }

    /// Complete the attempt with the validation verdicts.
    ///
    /// # Errors
    ///
    /// `AttemptError::NotActive` outside the active state and
    /// `AttemptError::NotAwaitingScore` when scoring was never requested.
    pub fn finish_with_results(
        &mut self,
        results: &[AnswerResult],
        now: DateTime<Utc>,
    ) -> Result<AttemptReport, AttemptError> {
        self.complete(score_from_results(results), true, now)
    }

    /// Complete the attempt without verdicts, scoring zero. Used when the
    /// validation service is unreachable: the attempt still counts.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::finish_with_results`].
    pub fn finish_unscored(&mut self, now: DateTime<Utc>) -> Result<AttemptReport, AttemptError> {
        self.complete(0, false, now)
    }

    fn complete(
        &mut self,
        score: u32,
        scored: bool,
        now: DateTime<Utc>,
    ) -> Result<AttemptReport, AttemptError> {
        let AttemptPhase::Active(active) = &self.phase else {
            return Err(AttemptError::NotActive);
        };
        if !active.scoring_requested {
            return Err(AttemptError::NotAwaitingScore);
        }
        let total = u32::try_from(self.quiz.question_count()).unwrap_or(u32::MAX);
        let percentage = percentage(score, total);
        let report = AttemptReport {
            score,
            total_questions: total,
            percentage,
            stars: stars_for_percentage(percentage),
            elapsed_secs: whole_secs_between(active.started_at, now),
            passed: if self.quiz.is_final() {
                percentage >= 100
            } else {
                true
            },
            attempt_index: self.attempt_index,
            scored,
        };
        let started_at = active.started_at;
        self.phase = AttemptPhase::Completed(CompletedAttempt {
            started_at,
            report: report.clone(),
        });
        debug!(
            quiz = %self.quiz.id(),
            score = report.score,
            percentage = report.percentage,
            "quiz attempt completed"
        );
        Ok(report)
    }

    // Accessors
    #[must_use]
    pub fn quiz(&self) -> &QuizDefinition {
        &self.quiz
    }

    #[must_use]
    pub fn attempt_index(&self) -> u32 {
        self.attempt_index
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, AttemptPhase::Active(_))
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self.phase, AttemptPhase::Completed(_))
    }

    /// Whether scoring has been claimed but the report is not in yet.
    #[must_use]
    pub fn is_awaiting_results(&self) -> bool {
        matches!(&self.phase, AttemptPhase::Active(active) if active.scoring_requested)
    }

    /// The question currently on screen, if any.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match &self.phase {
            AttemptPhase::Active(active) if !active.scoring_requested => {
                self.quiz.question_at(active.current)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        match &self.phase {
            AttemptPhase::Active(active) => active.answers.len(),
            _ => 0,
        }
    }

    /// Seconds left on the countdown, while active.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        match &self.phase {
            AttemptPhase::Active(active) => Some(active.timer.remaining_secs(now)),
            _ => None,
        }
    }

    /// Focus-loss violations since the last penalty, while active.
    #[must_use]
    pub fn violations(&self) -> Option<u8> {
        match &self.phase {
            AttemptPhase::Active(active) => Some(active.monitor.violations()),
            _ => None,
        }
    }

    /// The report, once completed.
    #[must_use]
    pub fn report(&self) -> Option<&AttemptReport> {
        match &self.phase {
            AttemptPhase::Completed(completed) => Some(&completed.report),
            _ => None,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            AttemptPhase::NotStarted => None,
            AttemptPhase::Active(active) => Some(active.started_at),
            AttemptPhase::Completed(completed) => Some(completed.started_at),
        }
    }

    /// The persistable record, once completed.
    #[must_use]
    pub fn record(&self) -> Option<Attempt> {
        match &self.phase {
            AttemptPhase::Completed(completed) => Some(Attempt::new(
                self.quiz.id(),
                self.attempt_index,
                completed.started_at,
                completed.report.elapsed_secs,
                completed.report.score,
                completed.report.passed,
            )),
            _ => None,
        }
    }

    fn phase_name(&self) -> &'static str {
        match self.phase {
            AttemptPhase::NotStarted => "not started",
            AttemptPhase::Active(_) => "active",
            AttemptPhase::Completed(_) => "completed",
        }
    }
}

impl fmt::Debug for QuizAttemptMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizAttemptMachine")
            .field("quiz", &self.quiz.id())
            .field("attempt_index", &self.attempt_index)
            .field("phase", &self.phase_name())
            .finish_non_exhaustive()
    }
}

fn whole_secs_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    u32::try_from((end - start).num_seconds().max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use course_core::fixed_clock;
    use course_core::model::{AnswerOption, QuestionId, QuizId};

    fn quiz(question_count: u64, duration_secs: u32, is_final: bool) -> QuizDefinition {
        let questions = (1..=question_count)
            .map(|q| {
                Question::new(
                    QuestionId::new(q),
                    format!("Question {q}"),
                    vec![
                        AnswerOption::new(OptionId::new(q * 10 + 1), "A").unwrap(),
                        AnswerOption::new(OptionId::new(q * 10 + 2), "B").unwrap(),
                    ],
                )
                .unwrap()
            })
            .collect();
        QuizDefinition::new(QuizId::new(1), "Checkpoint", duration_secs, is_final, questions)
            .unwrap()
    }

    fn all_correct(answers: &[Answer]) -> Vec<AnswerResult> {
        answers
            .iter()
            .map(|a| AnswerResult::new(a.question_id, a.option_id, true))
            .collect()
    }

    #[test]
    fn test_start_refuses_a_quiz_without_questions() {
        let mut machine =
            QuizAttemptMachine::new(quiz(0, 120, false), 1, SessionSettings::standard());
        let err = machine.start(fixed_clock().now()).unwrap_err();

        assert!(matches!(err, AttemptError::NoQuestions));
        assert!(!machine.is_active());
    }

    #[test]
    fn test_start_is_one_way() {
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 120, false), 1, SessionSettings::standard());
        machine.start(fixed_clock().now()).unwrap();

        let err = machine.start(fixed_clock().now()).unwrap_err();
        assert!(matches!(err, AttemptError::AlreadyStarted));
    }

    #[test]
    fn test_submitting_before_start_is_rejected() {
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 120, false), 1, SessionSettings::standard());
        let err = machine.submit_answer(OptionId::new(11)).unwrap_err();
        assert!(matches!(err, AttemptError::NotActive));
    }

    #[test]
    fn test_answer_flow_requests_scoring_exactly_once() {
        let clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(3, 120, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();

        assert_eq!(
            machine.submit_answer(OptionId::new(11)).unwrap(),
            SubmitOutcome::NextQuestion
        );
        assert_eq!(
            machine.submit_answer(OptionId::new(22)).unwrap(),
            SubmitOutcome::NextQuestion
        );

        let outcome = machine.submit_answer(OptionId::new(31)).unwrap();
        let SubmitOutcome::ReadyForScoring(answers) = outcome else {
            panic!("expected ReadyForScoring, got {outcome:?}");
        };
        assert_eq!(answers.len(), 3);
        assert!(machine.is_awaiting_results());
        assert!(machine.current_question().is_none());

        // A duplicate trigger while scoring is in flight is swallowed.
        assert_eq!(
            machine.submit_answer(OptionId::new(32)).unwrap(),
            SubmitOutcome::AwaitingResults
        );
    }

    #[test]
    fn test_timeout_claims_partial_answers_once() {
        let mut clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(3, 60, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();
        machine.submit_answer(OptionId::new(11)).unwrap();
        machine.submit_answer(OptionId::new(21)).unwrap();

        assert!(machine.poll_timeout(clock.now()).is_none());

        clock.advance(Duration::seconds(61));
        let answers = machine.poll_timeout(clock.now()).unwrap();
        assert_eq!(answers.len(), 2);

        assert!(machine.poll_timeout(clock.now()).is_none());
        assert_eq!(
            machine.submit_answer(OptionId::new(31)).unwrap(),
            SubmitOutcome::AwaitingResults
        );
    }

    #[test]
    fn test_final_submit_beats_a_due_timeout() {
        let mut clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 60, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();

        // Time is already up, but the tick has not fired yet.
        clock.advance(Duration::seconds(61));
        let outcome = machine.submit_answer(OptionId::new(11)).unwrap();
        assert!(matches!(outcome, SubmitOutcome::ReadyForScoring(_)));

        assert!(machine.poll_timeout(clock.now()).is_none());
    }

    #[test]
    fn test_penalty_shortens_the_countdown_but_not_elapsed_time() {
        let mut clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 120, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();

        clock.advance(Duration::seconds(30));
        assert_eq!(machine.remaining_secs(clock.now()), Some(90));

        machine.on_focus_loss().unwrap();
        machine.on_focus_loss().unwrap();
        let outcome = machine.on_focus_loss().unwrap();
        assert_eq!(outcome, FocusLossOutcome::Penalty { seconds: 60 });
        assert_eq!(machine.remaining_secs(clock.now()), Some(30));
        assert_eq!(machine.violations(), Some(0));

        let SubmitOutcome::ReadyForScoring(answers) =
            machine.submit_answer(OptionId::new(11)).unwrap()
        else {
            panic!("expected scoring request");
        };

        clock.advance(Duration::seconds(60));
        let report = machine
            .finish_with_results(&all_correct(&answers), clock.now())
            .unwrap();

        // 90 real seconds passed, whatever the penalty did to the countdown.
        assert_eq!(report.elapsed_secs, 90);
        assert_eq!(report.score, 1);
        assert_eq!(report.percentage, 100);
        assert_eq!(report.stars, 5);
        assert!(report.passed);
    }

    #[test]
    fn test_finishing_without_a_scoring_request_is_rejected() {
        let clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(2, 120, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();
        machine.submit_answer(OptionId::new(11)).unwrap();

        let err = machine.finish_with_results(&[], clock.now()).unwrap_err();
        assert!(matches!(err, AttemptError::NotAwaitingScore));
    }

    #[test]
    fn test_unscored_fallback_fails_a_final_quiz() {
        let clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(2, 120, true), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();
        machine.submit_answer(OptionId::new(11)).unwrap();
        machine.submit_answer(OptionId::new(21)).unwrap();

        let report = machine.finish_unscored(clock.now()).unwrap();
        assert_eq!(report.score, 0);
        assert!(!report.scored);
        assert!(!report.passed);
        assert!(machine.is_completed());
    }

    #[test]
    fn test_non_final_passes_whatever_the_score() {
        let clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(2, 120, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();
        machine.submit_answer(OptionId::new(11)).unwrap();
        let SubmitOutcome::ReadyForScoring(answers) =
            machine.submit_answer(OptionId::new(21)).unwrap()
        else {
            panic!("expected scoring request");
        };

        let mut results = all_correct(&answers);
        results[1].is_correct = false;
        let report = machine.finish_with_results(&results, clock.now()).unwrap();

        assert_eq!(report.percentage, 50);
        assert_eq!(report.stars, 2);
        assert!(report.passed);
    }

    #[test]
    fn test_record_mirrors_the_report() {
        let mut clock = fixed_clock();
        let started = clock.now();
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 120, true), 2, SessionSettings::standard());
        machine.start(started).unwrap();
        let SubmitOutcome::ReadyForScoring(answers) =
            machine.submit_answer(OptionId::new(11)).unwrap()
        else {
            panic!("expected scoring request");
        };

        clock.advance(Duration::seconds(45));
        machine
            .finish_with_results(&all_correct(&answers), clock.now())
            .unwrap();

        let record = machine.record().unwrap();
        assert_eq!(record.quiz_id, QuizId::new(1));
        assert_eq!(record.attempt_index, 2);
        assert_eq!(record.started_at, started);
        assert_eq!(record.completed_at_secs, 45);
        assert_eq!(record.score, 1);
        assert!(record.passed);
    }

    #[test]
    fn test_blocked_shortcuts_leave_the_violation_count_alone() {
        let clock = fixed_clock();
        let mut machine =
            QuizAttemptMachine::new(quiz(1, 120, false), 1, SessionSettings::standard());
        machine.start(clock.now()).unwrap();

        machine.on_focus_loss().unwrap();
        machine.on_blocked_shortcut(BlockedSignal::Paste);
        machine.on_blocked_shortcut(BlockedSignal::ContextMenu);

        assert_eq!(machine.violations(), Some(1));
    }
}
