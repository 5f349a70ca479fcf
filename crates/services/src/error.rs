//! Shared error types for the services crate.

use thiserror::Error;

use course_core::model::LessonId;
use storage::repository::StorageError;

/// Errors emitted by answer validation backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidatorError {
    #[error("answer validation is not configured")]
    Disabled,
    #[error("validator returned {got} results for {expected} answers")]
    ResultCountMismatch { expected: usize, got: usize },
    #[error("validation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by certificate issuance.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CertificateError {
    #[error("certificate service unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by the quiz attempt machinery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("attempt already started")]
    AlreadyStarted,
    #[error("attempt is not active")]
    NotActive,
    #[error("attempt is not awaiting scoring results")]
    NotAwaitingScore,
    #[error("quiz was already attempted")]
    AlreadyAttempted,
    #[error("attempt limit reached: {used} of {max} attempts used")]
    AttemptLimitReached { used: u32, max: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the lesson progression controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressionError {
    #[error("course has no lessons")]
    EmptyCourse,
    #[error("unknown lesson: {0}")]
    UnknownLesson(LessonId),
    #[error("lesson {0} is locked")]
    LessonLocked(LessonId),
    #[error("active lesson is not a text lesson")]
    NotATextLesson,
    #[error("active lesson is not a quiz lesson")]
    NotAQuizLesson,
}

/// Errors emitted by a learning session as a whole.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("course or enrollment could not be loaded")]
    CourseUnavailable(#[source] StorageError),
    #[error("no quiz attempt is in progress")]
    NoActiveAttempt,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
