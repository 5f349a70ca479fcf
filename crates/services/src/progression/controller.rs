//! Lesson unlocking, activation and advancement for one course.

use chrono::{DateTime, Utc};
use tracing::debug;

use course_core::countdown::CountdownScheduler;
use course_core::model::{
    CompletionSet, CourseStructure, Lesson, LessonId, LessonPosition, Module, QuizId,
    ResumePointer, SessionSettings,
};

use crate::error::ProgressionError;
use crate::progression::resume::resume_position;

/// Display status of one lesson in the course outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Locked,
    Unlocked,
    Active,
    Completed,
}

/// What a video progress report amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoProgress {
    /// Nothing notable; keep playing.
    Playing,
    /// Playback entered the completion window for the first time.
    Completed { lesson: LessonId },
    /// Playback consumed the full reported duration.
    Ended {
        lesson: LessonId,
        newly_completed: bool,
    },
}

/// Result of completing the active text lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCompletion {
    pub lesson: LessonId,
    pub newly_completed: bool,
    /// The lesson now active, when there was one to move to.
    pub advanced_to: Option<LessonId>,
}

/// What a scheduled auto-advance will do, for the countdown overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAdvancePreview {
    pub next: LessonId,
    pub title: String,
    pub seconds: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct VideoState {
    reported_duration: Option<f64>,
}

/// Tracks which lesson is active, which are reachable and when to move on.
///
/// Completion only ever grows while the controller lives; server state the
/// session loaded at start is merged in as a union before construction.
/// The stored resume pointer is read once, here, and never written back.
#[derive(Debug, Clone)]
pub struct LessonProgressionController {
    course: CourseStructure,
    completed: CompletionSet,
    settings: SessionSettings,
    active: LessonPosition,
    video: VideoState,
    auto_advance: CountdownScheduler<LessonPosition>,
}

impl LessonProgressionController {
    /// Build a controller positioned where the learner should resume.
    ///
    /// # Errors
    ///
    /// `ProgressionError::EmptyCourse` when the course has no lessons to
    /// stand on.
    pub fn new(
        course: CourseStructure,
        completed: CompletionSet,
        pointer: Option<&ResumePointer>,
        settings: SessionSettings,
    ) -> Result<Self, ProgressionError> {
        let active = resume_position(&course, &completed, pointer)
            .ok_or(ProgressionError::EmptyCourse)?;
        Ok(Self {
            course,
            completed,
            settings,
            active,
            video: VideoState::default(),
            auto_advance: CountdownScheduler::new(),
        })
    }

    // Accessors
    #[must_use]
    pub fn course(&self) -> &CourseStructure {
        &self.course
    }

    #[must_use]
    pub fn completed(&self) -> &CompletionSet {
        &self.completed
    }

    #[must_use]
    pub fn active_position(&self) -> LessonPosition {
        self.active
    }

    #[must_use]
    pub fn active_lesson(&self) -> Option<&Lesson> {
        self.course.lesson_at(self.active)
    }

    /// The quiz behind the active lesson.
    ///
    /// # Errors
    ///
    /// `ProgressionError::NotAQuizLesson` when the active lesson is not a
    /// quiz lesson.
    pub fn active_quiz_id(&self) -> Result<QuizId, ProgressionError> {
        self.require_active_lesson()?
            .quiz_id()
            .ok_or(ProgressionError::NotAQuizLesson)
    }

    /// Outline status for one lesson.
    #[must_use]
    pub fn status_of(&self, lesson: LessonId) -> LessonStatus {
        if self.completed.contains(lesson) {
            return LessonStatus::Completed;
        }
        if self.active_lesson().is_some_and(|l| l.id() == lesson) {
            return LessonStatus::Active;
        }
        if self.is_selectable(lesson) {
            LessonStatus::Unlocked
        } else {
            LessonStatus::Locked
        }
    }

    /// Whether the learner may jump to this lesson from the outline.
    ///
    /// Reachable lessons are: anything completed, the active lesson, the
    /// very first lesson of the course, a lesson whose predecessor in its
    /// module is completed, and the first lesson of a module whose
    /// predecessor module is fully completed.
    #[must_use]
    pub fn is_selectable(&self, lesson: LessonId) -> bool {
        let Some(position) = self.course.position_of(lesson) else {
            return false;
        };
        if self.completed.contains(lesson) || position == self.active {
            return true;
        }
        if self.course.first_position() == Some(position) {
            return true;
        }
        if position.lesson > 0 {
            let previous = LessonPosition::new(position.module, position.lesson - 1);
            return self
                .lesson_id_at(previous)
                .is_some_and(|id| self.completed.contains(id));
        }
        position.module > 0
            && self
                .course
                .module_at(position.module - 1)
                .and_then(Module::last_lesson)
                .is_some_and(|last| self.completed.contains(last.id()))
    }

    /// Activate a lesson the learner picked from the outline.
    ///
    /// # Errors
    ///
    /// `ProgressionError::UnknownLesson` for ids outside this course and
    /// `ProgressionError::LessonLocked` for lessons not yet reachable.
    pub fn select_lesson(&mut self, lesson: LessonId) -> Result<&Lesson, ProgressionError> {
        let position = self
            .course
            .position_of(lesson)
            .ok_or(ProgressionError::UnknownLesson(lesson))?;
        if !self.is_selectable(lesson) {
            return Err(ProgressionError::LessonLocked(lesson));
        }
        self.activate(position);
        debug!(%lesson, "lesson activated");
        self.require_active_lesson()
    }

    /// Record the duration the player reported for the active video.
    /// Ignored while a non-video lesson is active.
    pub fn note_video_duration(&mut self, duration_secs: f64) {
        if self.active_lesson().is_some_and(|l| l.content().is_video()) {
            self.video.reported_duration = Some(duration_secs);
        }
    }

    /// Feed a playback position report from the video player.
    ///
    /// A video completes the first time playback comes within the
    /// configured tolerance of the reported duration; consuming the full
    /// duration additionally ends the lesson. Without a reported duration
    /// nothing can complete.
    pub fn note_video_progress(&mut self, played_secs: f64) -> VideoProgress {
        let Some(lesson) = self.active_lesson() else {
            return VideoProgress::Playing;
        };
        if !lesson.content().is_video() {
            return VideoProgress::Playing;
        }
        let id = lesson.id();
        let Some(duration) = self.video.reported_duration else {
            return VideoProgress::Playing;
        };
        let tolerance = f64::from(self.settings.video_end_tolerance_secs());
        if duration - played_secs > tolerance {
            return VideoProgress::Playing;
        }

        let newly_completed = self.completed.insert(id);
        if played_secs >= duration {
            VideoProgress::Ended {
                lesson: id,
                newly_completed,
            }
        } else if newly_completed {
            VideoProgress::Completed { lesson: id }
        } else {
            VideoProgress::Playing
        }
    }

    /// Complete the active text lesson and move straight to the next one.
    /// An explicit action is the only way a text lesson completes.
    ///
    /// # Errors
    ///
    /// `ProgressionError::NotATextLesson` when the active lesson is not a
    /// text lesson.
    pub fn complete_text_lesson(&mut self) -> Result<TextCompletion, ProgressionError> {
        let lesson = self.require_active_lesson()?;
        if !lesson.content().is_text() {
            return Err(ProgressionError::NotATextLesson);
        }
        let id = lesson.id();
        let newly_completed = self.completed.insert(id);
        let advanced_to = self.advance_now();
        Ok(TextCompletion {
            lesson: id,
            newly_completed,
            advanced_to,
        })
    }

    /// Mark the active quiz lesson completed; the attempt pipeline decides
    /// when. Returns the lesson id and whether that was a first completion.
    ///
    /// # Errors
    ///
    /// `ProgressionError::NotAQuizLesson` when the active lesson is not a
    /// quiz lesson.
    pub fn complete_active_quiz_lesson(&mut self) -> Result<(LessonId, bool), ProgressionError> {
        let lesson = self.require_active_lesson()?;
        if !lesson.content().is_quiz() {
            return Err(ProgressionError::NotAQuizLesson);
        }
        let id = lesson.id();
        let newly_completed = self.completed.insert(id);
        Ok((id, newly_completed))
    }

    /// Start the countdown toward the next lesson. Returns `None` at the
    /// end of the course, where there is nowhere to go.
    pub fn begin_auto_advance(&mut self, now: DateTime<Utc>) -> Option<AutoAdvancePreview> {
        let next = self.course.next_position(self.active)?;
        let lesson = self.course.lesson_at(next)?;
        let preview = AutoAdvancePreview {
            next: lesson.id(),
            title: lesson.title().to_owned(),
            seconds: self.settings.auto_advance_secs(),
        };
        self.auto_advance.schedule(now, preview.seconds, next);
        Some(preview)
    }

    /// Skip the countdown and advance immediately.
    pub fn skip_auto_advance(&mut self) -> Option<LessonId> {
        let target = self.auto_advance.take_now()?;
        self.activate(target);
        self.lesson_id_at(target)
    }

    /// Fire a due auto-advance, if one is pending and its time has come.
    pub fn poll_auto_advance(&mut self, now: DateTime<Utc>) -> Option<LessonId> {
        let target = self.auto_advance.poll(now)?;
        self.activate(target);
        self.lesson_id_at(target)
    }

    #[must_use]
    pub fn has_pending_advance(&self) -> bool {
        self.auto_advance.is_pending()
    }

    /// Seconds until a pending auto-advance fires.
    #[must_use]
    pub fn auto_advance_remaining_secs(&self, now: DateTime<Utc>) -> Option<u32> {
        self.auto_advance.remaining_secs(now)
    }

    fn require_active_lesson(&self) -> Result<&Lesson, ProgressionError> {
        self.course
            .lesson_at(self.active)
            .ok_or(ProgressionError::EmptyCourse)
    }

    fn lesson_id_at(&self, position: LessonPosition) -> Option<LessonId> {
        self.course.lesson_at(position).map(Lesson::id)
    }

    /// Make `position` the active lesson. Any pending advance belongs to
    /// the previously active lesson and dies here.
    fn activate(&mut self, position: LessonPosition) {
        self.auto_advance.cancel();
        self.active = position;
        self.video = VideoState::default();
    }

    fn advance_now(&mut self) -> Option<LessonId> {
        let next = self.course.next_position(self.active)?;
        self.activate(next);
        self.lesson_id_at(next)
    }
}
