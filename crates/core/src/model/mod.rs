mod attempt;
mod course;
mod ids;
mod progress;
mod quiz;
mod settings;
mod slug;

pub use attempt::{
    Answer, AnswerResult, Attempt, percentage, score_from_results, stars_for_percentage,
};
pub use course::{
    CourseError, CourseStructure, Lesson, LessonContent, LessonPosition, Module, VideoUri,
};
pub use ids::{
    CertificateId, EnrollmentId, LessonId, ModuleId, OptionId, ParseIdError, QuestionId, QuizId,
};
pub use progress::{CompletionSet, ResumePointer};
pub use quiz::{AnswerOption, Question, QuizDefinition, QuizError};
pub use settings::{SessionSettings, SettingsError};
pub use slug::{CourseSlug, CourseSlugError};
