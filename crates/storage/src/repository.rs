use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_core::model::{
    Attempt, CourseSlug, CourseStructure, LessonId, QuizDefinition, QuizId, ResumePointer,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a learner's progress in one course.
///
/// `completed` carries no ordering guarantee; `resume` is the bookmark the
/// server advanced on the last successful progress persist.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentProgress {
    pub completed: Vec<LessonId>,
    pub resume: Option<ResumePointer>,
}

impl EnrollmentProgress {
    #[must_use]
    pub fn new(completed: Vec<LessonId>, resume: Option<ResumePointer>) -> Self {
        Self { completed, resume }
    }
}

/// Read-side contract for published course content.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Fetch a course structure by slug.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, slug: &CourseSlug) -> Result<CourseStructure, StorageError>;

    /// Fetch a quiz definition by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError>;
}

/// Contract for lesson-completion persistence.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Record a lesson as completed. The backing store also advances the
    /// course's resume pointer to this lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the completion cannot be stored.
    async fn persist_lesson_progress(
        &self,
        slug: &CourseSlug,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch everything known about the learner's progress in a course.
    /// A course the learner has not touched yields an empty record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn enrollment_progress(
        &self,
        slug: &CourseSlug,
    ) -> Result<EnrollmentProgress, StorageError>;
}

/// Contract for completed quiz attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Append one completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if an attempt with the same index
    /// already exists for the quiz, or other storage errors.
    async fn submit_attempt(
        &self,
        slug: &CourseSlug,
        attempt: &Attempt,
    ) -> Result<(), StorageError>;

    /// All recorded attempts for a quiz, ordered by attempt index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn attempts_for_quiz(&self, quiz: QuizId) -> Result<Vec<Attempt>, StorageError>;
}

/// Contract for wiping a learner's progress in a course after a final-quiz
/// lockout.
#[async_trait]
pub trait CourseReset: Send + Sync {
    /// Clear completions, the resume pointer and recorded attempts for the
    /// course, so the learner starts over.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the reset cannot be applied.
    async fn reset_progress(&self, slug: &CourseSlug) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
struct ProgressState {
    completed: HashMap<LessonId, DateTime<Utc>>,
    resume: Option<ResumePointer>,
}

/// Simple in-memory store implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    courses: Arc<Mutex<HashMap<CourseSlug, CourseStructure>>>,
    quizzes: Arc<Mutex<HashMap<QuizId, QuizDefinition>>>,
    progress: Arc<Mutex<HashMap<CourseSlug, ProgressState>>>,
    attempts: Arc<Mutex<HashMap<(CourseSlug, QuizId), Vec<Attempt>>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a course available to `get_course`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing map is poisoned.
    pub fn seed_course(&self, course: CourseStructure) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course.slug().clone(), course);
        Ok(())
    }

    /// Make a quiz available to `get_quiz`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the backing map is poisoned.
    pub fn seed_quiz(&self, quiz: QuizDefinition) -> Result<(), StorageError> {
        let mut guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz.id(), quiz);
        Ok(())
    }

    /// Bundle this store behind the trait-object aggregate.
    #[must_use]
    pub fn storage(&self) -> Storage {
        Storage {
            courses: Arc::new(self.clone()),
            progress: Arc::new(self.clone()),
            attempts: Arc::new(self.clone()),
            reset: Arc::new(self.clone()),
        }
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn get_course(&self, slug: &CourseSlug) -> Result<CourseStructure, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(slug).cloned().ok_or(StorageError::NotFound)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<QuizDefinition, StorageError> {
        let guard = self
            .quizzes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressStore for InMemoryStore {
    async fn persist_lesson_progress(
        &self,
        slug: &CourseSlug,
        lesson: LessonId,
        completed_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // Pointer advance needs the module the lesson sits in.
        let pointer = {
            let courses = self
                .courses
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            courses.get(slug).and_then(|course| {
                let position = course.position_of(lesson)?;
                let module = course.module_at(position.module)?;
                Some(ResumePointer::new(module.id(), lesson))
            })
        };

        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let state = guard.entry(slug.clone()).or_default();
        state.completed.entry(lesson).or_insert(completed_at);
        if pointer.is_some() {
            state.resume = pointer;
        }
        Ok(())
    }

    async fn enrollment_progress(
        &self,
        slug: &CourseSlug,
    ) -> Result<EnrollmentProgress, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let state = guard.get(slug).cloned().unwrap_or_default();
        Ok(EnrollmentProgress::new(
            state.completed.keys().copied().collect(),
            state.resume,
        ))
    }
}

#[async_trait]
impl AttemptStore for InMemoryStore {
    async fn submit_attempt(
        &self,
        slug: &CourseSlug,
        attempt: &Attempt,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let entries = guard
            .entry((slug.clone(), attempt.quiz_id))
            .or_default();
        if entries
            .iter()
            .any(|existing| existing.attempt_index == attempt.attempt_index)
        {
            return Err(StorageError::Conflict);
        }
        entries.push(attempt.clone());
        Ok(())
    }

    async fn attempts_for_quiz(&self, quiz: QuizId) -> Result<Vec<Attempt>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Attempt> = guard
            .iter()
            .filter(|((_, q), _)| *q == quiz)
            .flat_map(|(_, entries)| entries.iter().cloned())
            .collect();
        found.sort_by_key(|a| a.attempt_index);
        Ok(found)
    }
}

#[async_trait]
impl CourseReset for InMemoryStore {
    async fn reset_progress(&self, slug: &CourseSlug) -> Result<(), StorageError> {
        {
            let mut guard = self
                .progress
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.remove(slug);
        }
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.retain(|(course, _), _| course != slug);
        Ok(())
    }
}

/// Aggregates the storage contracts behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressStore>,
    pub attempts: Arc<dyn AttemptStore>,
    pub reset: Arc<dyn CourseReset>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        InMemoryStore::new().storage()
    }
}
