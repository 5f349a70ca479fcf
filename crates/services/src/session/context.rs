//! The learning session: one learner working through one course.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use course_core::countdown::CountdownScheduler;
use course_core::model::{
    Answer, CompletionSet, CourseSlug, EnrollmentId, Lesson, LessonId, OptionId, SessionSettings,
};
use course_core::Clock;
use storage::repository::{AttemptStore, CourseRepository, CourseReset, ProgressStore, Storage};

use crate::anticheat::{BlockedSignal, FocusLossOutcome};
use crate::attempt::{decide, ensure_can_start, PolicyDecision, QuizAttemptMachine, SubmitOutcome};
use crate::certificates::CertificateIssuer;
use crate::error::{AttemptError, SessionError};
use crate::progression::{LessonProgressionController, VideoProgress};
use crate::session::notice::{NavigationTarget, SessionNotice};
use crate::validator::AnswerValidator;

/// Root object a host drives to run one learner through one course.
///
/// Single-threaded by design: the host calls operations as UI events come
/// in and `tick` on a sub-second cadence for everything time-based. All
/// I/O goes through the injected trait objects; there is no global state
/// anywhere in the engine. Operations return [`SessionNotice`] batches,
/// oldest first, that tell the host what to show or where to go.
pub struct LearnSession {
    clock: Clock,
    settings: SessionSettings,
    slug: CourseSlug,
    enrollment: EnrollmentId,
    controller: LessonProgressionController,
    attempt: Option<QuizAttemptMachine>,
    redirect: CountdownScheduler<NavigationTarget>,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressStore>,
    attempts: Arc<dyn AttemptStore>,
    reset: Arc<dyn CourseReset>,
    validator: Arc<dyn AnswerValidator>,
    certificates: Arc<dyn CertificateIssuer>,
}

impl LearnSession {
    /// Load the course and the learner's progress, then resume where they
    /// left off.
    ///
    /// # Errors
    ///
    /// `SessionError::CourseUnavailable` when the course or enrollment
    /// state cannot be fetched (hosts route to their access-denied view,
    /// see [`super::navigation_for_error`]), and
    /// `SessionError::Progression` when the course has no lessons.
    pub async fn load(
        slug: CourseSlug,
        enrollment: EnrollmentId,
        clock: Clock,
        settings: SessionSettings,
        storage: &Storage,
        validator: Arc<dyn AnswerValidator>,
        certificates: Arc<dyn CertificateIssuer>,
    ) -> Result<Self, SessionError> {
        let course = storage
            .courses
            .get_course(&slug)
            .await
            .map_err(SessionError::CourseUnavailable)?;
        let progress = storage
            .progress
            .enrollment_progress(&slug)
            .await
            .map_err(SessionError::CourseUnavailable)?;

        let completed: CompletionSet = progress.completed.iter().copied().collect();
        let controller = LessonProgressionController::new(
            course,
            completed,
            progress.resume.as_ref(),
            settings,
        )?;
        info!(course = %slug, "learning session loaded");

        Ok(Self {
            clock,
            settings,
            slug,
            enrollment,
            controller,
            attempt: None,
            redirect: CountdownScheduler::new(),
            courses: Arc::clone(&storage.courses),
            progress: Arc::clone(&storage.progress),
            attempts: Arc::clone(&storage.attempts),
            reset: Arc::clone(&storage.reset),
            validator,
            certificates,
        })
    }

    /// Jump to a lesson the learner picked from the outline. A running
    /// quiz attempt is abandoned: nothing about it is persisted or counted.
    ///
    /// # Errors
    ///
    /// `ProgressionError::UnknownLesson` and `ProgressionError::LessonLocked`
    /// pass through; a locked selection leaves everything as it was.
    pub fn select_lesson(&mut self, lesson: LessonId) -> Result<Vec<SessionNotice>, SessionError> {
        self.controller.select_lesson(lesson)?;
        self.abandon_attempt();
        Ok(Vec::new())
    }

    /// Record the duration the video player reported for the active lesson.
    pub fn note_video_duration(&mut self, duration_secs: f64) {
        self.controller.note_video_duration(duration_secs);
    }

    /// Feed a playback position report from the video player.
    pub async fn note_video_progress(&mut self, played_secs: f64) -> Vec<SessionNotice> {
        let mut notices = Vec::new();
        match self.controller.note_video_progress(played_secs) {
            VideoProgress::Playing => {}
            VideoProgress::Completed { lesson } => {
                self.persist_completion(lesson, &mut notices).await;
            }
            VideoProgress::Ended {
                lesson,
                newly_completed,
            } => {
                if newly_completed {
                    self.persist_completion(lesson, &mut notices).await;
                }
                self.schedule_auto_advance(&mut notices);
            }
        }
        notices
    }

    /// Complete the active text lesson and move straight on.
    ///
    /// # Errors
    ///
    /// `ProgressionError::NotATextLesson` when something else is active.
    pub async fn complete_text_lesson(&mut self) -> Result<Vec<SessionNotice>, SessionError> {
        let completion = self.controller.complete_text_lesson()?;
        let mut notices = Vec::new();
        if completion.newly_completed {
            self.persist_completion(completion.lesson, &mut notices).await;
        }
        if let Some(lesson) = completion.advanced_to {
            notices.push(SessionNotice::AdvancedTo { lesson });
        }
        Ok(notices)
    }

    /// Start (or retry) an attempt at the active quiz lesson.
    ///
    /// # Errors
    ///
    /// `ProgressionError::NotAQuizLesson` when something else is active;
    /// `AttemptError::AlreadyAttempted` / `AttemptError::AttemptLimitReached`
    /// when the recorded history forbids another attempt;
    /// `AttemptError::NoQuestions` when the quiz has nothing to ask. The
    /// session never enters an attempt in any of these cases.
    pub async fn start_quiz(&mut self) -> Result<Vec<SessionNotice>, SessionError> {
        if self.attempt.as_ref().is_some_and(QuizAttemptMachine::is_active) {
            return Err(AttemptError::AlreadyStarted.into());
        }
        let quiz_id = self.controller.active_quiz_id()?;
        let quiz = self.courses.get_quiz(quiz_id).await?;
        let history = self.attempts.attempts_for_quiz(quiz_id).await?;
        let prior = u32::try_from(history.len()).unwrap_or(u32::MAX);
        ensure_can_start(quiz.is_final(), prior)?;

        let mut machine = QuizAttemptMachine::new(quiz, prior + 1, self.settings);
        machine.start(self.clock.now())?;
        self.attempt = Some(machine);
        Ok(Vec::new())
    }

    /// Record the learner's answer to the current quiz question. The last
    /// answer triggers scoring and everything that follows from it.
    ///
    /// # Errors
    ///
    /// `SessionError::NoActiveAttempt` when no attempt exists.
    pub async fn submit_answer(
        &mut self,
        option: OptionId,
    ) -> Result<Vec<SessionNotice>, SessionError> {
        let machine = self.attempt.as_mut().ok_or(SessionError::NoActiveAttempt)?;
        match machine.submit_answer(option)? {
            SubmitOutcome::NextQuestion | SubmitOutcome::AwaitingResults => Ok(Vec::new()),
            SubmitOutcome::ReadyForScoring(answers) => self.complete_attempt(answers).await,
        }
    }

    /// Record a focus-loss violation. Quietly ignored outside an active
    /// attempt: the monitor only exists while a quiz question is on screen.
    ///
    /// # Errors
    ///
    /// None in practice; the signature leaves room for storage-backed
    /// violation logs.
    pub fn focus_lost(&mut self) -> Result<Vec<SessionNotice>, SessionError> {
        let Some(machine) = self.attempt.as_mut() else {
            return Ok(Vec::new());
        };
        if !machine.is_active() {
            return Ok(Vec::new());
        }
        match machine.on_focus_loss()? {
            FocusLossOutcome::Warning { count, limit } => {
                Ok(vec![SessionNotice::FocusWarning { count, limit }])
            }
            FocusLossOutcome::Penalty { seconds } => {
                Ok(vec![SessionNotice::PenaltyApplied { seconds }])
            }
        }
    }

    /// Report a suppressed shortcut. Never counts toward violations.
    #[must_use]
    pub fn blocked_shortcut(&self, signal: BlockedSignal) -> Vec<SessionNotice> {
        match &self.attempt {
            Some(machine) if machine.is_active() => {
                machine.on_blocked_shortcut(signal);
                vec![SessionNotice::ShortcutBlocked { signal }]
            }
            _ => Vec::new(),
        }
    }

    /// Skip a pending auto-advance countdown and move now.
    pub fn skip_auto_advance(&mut self) -> Vec<SessionNotice> {
        match self.controller.skip_auto_advance() {
            Some(lesson) => {
                self.abandon_attempt();
                vec![SessionNotice::AdvancedTo { lesson }]
            }
            None => Vec::new(),
        }
    }

    /// Drive everything time-based: quiz timeouts, auto-advance countdowns
    /// and the post-lockout redirect. Hosts call this on a sub-second
    /// cadence; a stretch of missed ticks only delays delivery, never
    /// changes what fires.
    ///
    /// # Errors
    ///
    /// Errors from the scoring pipeline a due timeout kicked off.
    pub async fn tick(&mut self) -> Result<Vec<SessionNotice>, SessionError> {
        let mut notices = Vec::new();

        let now = self.clock.now();
        let timed_out = self
            .attempt
            .as_mut()
            .and_then(|machine| machine.poll_timeout(now));
        if let Some(answers) = timed_out {
            notices.extend(self.complete_attempt(answers).await?);
        }

        let now = self.clock.now();
        if let Some(lesson) = self.controller.poll_auto_advance(now) {
            self.abandon_attempt();
            notices.push(SessionNotice::AdvancedTo { lesson });
        }
        if let Some(target) = self.redirect.poll(now) {
            notices.push(SessionNotice::Navigate { target });
        }

        Ok(notices)
    }

    /// Score the batch and run the completion pipeline: report, persist,
    /// then the policy decision. Reached exactly once per attempt, from
    /// whichever of the final answer or the timeout got there first.
    async fn complete_attempt(
        &mut self,
        answers: Vec<Answer>,
    ) -> Result<Vec<SessionNotice>, SessionError> {
        let mut notices = Vec::new();
        let Some((quiz_id, is_final, attempt_index)) = self.attempt.as_ref().map(|machine| {
            (
                machine.quiz().id(),
                machine.quiz().is_final(),
                machine.attempt_index(),
            )
        }) else {
            return Ok(notices);
        };

        let verdicts = self.validator.validate(quiz_id, &answers).await;

        let now = self.clock.now();
        let Some(machine) = self.attempt.as_mut() else {
            return Ok(notices);
        };
        let report = match verdicts {
            Ok(results) => machine.finish_with_results(&results, now)?,
            Err(error) => {
                warn!(%error, "answer validation unavailable, completing attempt unscored");
                notices.push(SessionNotice::ValidationUnavailable);
                machine.finish_unscored(now)?
            }
        };
        let record = machine.record();

        notices.push(SessionNotice::AttemptCompleted {
            report: report.clone(),
        });

        // Local completion stands even when the write fails.
        if let Some(record) = record {
            if let Err(error) = self.attempts.submit_attempt(&self.slug, &record).await {
                warn!(%error, "attempt record persist failed, continuing with local state");
                notices.push(SessionNotice::PersistFailed {
                    what: "quiz attempt",
                });
            }
        }

        match decide(is_final, attempt_index, report.percentage) {
            PolicyDecision::CompleteLesson => {
                let (lesson, newly_completed) = self.controller.complete_active_quiz_lesson()?;
                if newly_completed {
                    self.persist_completion(lesson, &mut notices).await;
                }
                self.schedule_auto_advance(&mut notices);
            }
            PolicyDecision::IssueCertificate => {
                let (lesson, newly_completed) = self.controller.complete_active_quiz_lesson()?;
                if newly_completed {
                    self.persist_completion(lesson, &mut notices).await;
                }
                match self.certificates.issue(self.enrollment).await {
                    Ok(certificate) => {
                        info!(certificate = %certificate.id, "course passed, certificate issued");
                        notices.push(SessionNotice::CertificateIssued {
                            certificate: certificate.id,
                        });
                    }
                    Err(error) => {
                        warn!(%error, "certificate issuance failed");
                        notices.push(SessionNotice::PersistFailed {
                            what: "certificate",
                        });
                    }
                }
                notices.push(SessionNotice::Navigate {
                    target: NavigationTarget::Certificates,
                });
            }
            PolicyDecision::OfferRetry { used, max } => {
                notices.push(SessionNotice::RetryAvailable { used, max });
            }
            PolicyDecision::ExhaustedReset => {
                if let Err(error) = self.reset.reset_progress(&self.slug).await {
                    warn!(%error, "course reset failed");
                    notices.push(SessionNotice::PersistFailed {
                        what: "course reset",
                    });
                }
                let delay = self.settings.reset_redirect_secs();
                notices.push(SessionNotice::AttemptsExhausted {
                    redirect_secs: delay,
                });
                self.redirect
                    .schedule(self.clock.now(), delay, NavigationTarget::MyLearning);
            }
        }
        Ok(notices)
    }

    /// Persist a first-time completion. Failure is reported, never fatal:
    /// the in-memory completion is already in effect and is not rolled
    /// back or retried.
    async fn persist_completion(&self, lesson: LessonId, notices: &mut Vec<SessionNotice>) {
        notices.push(SessionNotice::LessonCompleted { lesson });
        if let Err(error) = self
            .progress
            .persist_lesson_progress(&self.slug, lesson, self.clock.now())
            .await
        {
            warn!(%lesson, %error, "lesson completion persist failed, continuing with local state");
            notices.push(SessionNotice::PersistFailed {
                what: "lesson completion",
            });
        }
    }

    fn schedule_auto_advance(&mut self, notices: &mut Vec<SessionNotice>) {
        if let Some(preview) = self.controller.begin_auto_advance(self.clock.now()) {
            notices.push(SessionNotice::AutoAdvanceScheduled {
                next: preview.next,
                title: preview.title,
                seconds: preview.seconds,
            });
        }
    }

    fn abandon_attempt(&mut self) {
        if let Some(machine) = self.attempt.take() {
            if machine.is_active() {
                debug!(quiz = %machine.quiz().id(), "abandoning in-progress quiz attempt");
            }
        }
    }

    // Accessors
    #[must_use]
    pub fn slug(&self) -> &CourseSlug {
        &self.slug
    }

    #[must_use]
    pub fn enrollment(&self) -> EnrollmentId {
        self.enrollment
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Progression state, for rendering the outline.
    #[must_use]
    pub fn controller(&self) -> &LessonProgressionController {
        &self.controller
    }

    #[must_use]
    pub fn active_lesson(&self) -> Option<&Lesson> {
        self.controller.active_lesson()
    }

    /// The current attempt, for rendering the quiz view.
    #[must_use]
    pub fn attempt(&self) -> Option<&QuizAttemptMachine> {
        self.attempt.as_ref()
    }

    /// Seconds left on the quiz countdown, while an attempt is active.
    #[must_use]
    pub fn quiz_remaining_secs(&self) -> Option<u32> {
        self.attempt
            .as_ref()
            .and_then(|machine| machine.remaining_secs(self.clock.now()))
    }

    /// Seconds until a pending auto-advance fires.
    #[must_use]
    pub fn auto_advance_remaining_secs(&self) -> Option<u32> {
        self.controller.auto_advance_remaining_secs(self.clock.now())
    }

    /// Whether a post-lockout redirect is waiting to fire.
    #[must_use]
    pub fn redirect_pending(&self) -> bool {
        self.redirect.is_pending()
    }

    /// The session clock. Fixed clocks can be advanced through this in
    /// tests; the system clock ignores it.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}

impl fmt::Debug for LearnSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LearnSession")
            .field("course", &self.slug)
            .field("active", &self.controller.active_position())
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}
