use thiserror::Error;

use crate::model::{CourseError, CourseSlugError, QuizError, SettingsError};

/// Crate-level aggregate for callers that build whole course models and
/// want one error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Slug(#[from] CourseSlugError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
