use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("answer option text cannot be empty")]
    EmptyOptionText,

    #[error("question {question} needs at least two options, got {got}")]
    TooFewOptions { question: QuestionId, got: usize },

    #[error("quiz duration must be > 0")]
    InvalidDuration,
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// One selectable answer to a question.
///
/// Deliberately carries no correctness flag: which option is correct is
/// known only to the validation service, never to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    id: OptionId,
    text: String,
}

impl AnswerOption {
    /// Creates a new AnswerOption.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyOptionText` if the text is blank.
    pub fn new(id: OptionId, text: impl Into<String>) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyOptionText);
        }
        Ok(Self {
            id,
            text: text.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> OptionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A single-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<AnswerOption>,
}

impl Question {
    /// Creates a new Question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyQuestionText` for blank text, or
    /// `QuizError::TooFewOptions` when fewer than two options are given.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<AnswerOption>,
    ) -> Result<Self, QuizError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuizError::EmptyQuestionText);
        }
        if options.len() < 2 {
            return Err(QuizError::TooFewOptions {
                question: id,
                got: options.len(),
            });
        }
        Ok(Self {
            id,
            text: text.trim().to_owned(),
            options,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz as delivered by the content service.
///
/// An empty question list is representable — the server may publish one —
/// and it is the attempt machinery's job to refuse to start it, not this
/// constructor's job to reject it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDefinition {
    id: QuizId,
    title: String,
    duration_secs: u32,
    is_final: bool,
    questions: Vec<Question>,
}

impl QuizDefinition {
    /// Creates a new QuizDefinition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` for a blank title or
    /// `QuizError::InvalidDuration` for a zero time limit.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        duration_secs: u32,
        is_final: bool,
        questions: Vec<Question>,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        if duration_secs == 0 {
            return Err(QuizError::InvalidDuration);
        }
        Ok(Self {
            id,
            title: title.trim().to_owned(),
            duration_secs,
            is_final,
            questions,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Time limit for one attempt, in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    /// Whether passing this quiz at 100% ends the course with a certificate.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn option(id: u64, text: &str) -> AnswerOption {
        AnswerOption::new(OptionId::new(id), text).unwrap()
    }

    #[test]
    fn question_requires_two_options() {
        let err = Question::new(QuestionId::new(1), "What is 2+2?", vec![option(1, "4")])
            .unwrap_err();
        assert_eq!(
            err,
            QuizError::TooFewOptions {
                question: QuestionId::new(1),
                got: 1
            }
        );
    }

    #[test]
    fn question_rejects_blank_text() {
        let err = Question::new(
            QuestionId::new(1),
            "  ",
            vec![option(1, "4"), option(2, "5")],
        )
        .unwrap_err();
        assert_eq!(err, QuizError::EmptyQuestionText);
    }

    #[test]
    fn quiz_rejects_zero_duration() {
        let err = QuizDefinition::new(QuizId::new(1), "Checkpoint", 0, false, vec![]).unwrap_err();
        assert_eq!(err, QuizError::InvalidDuration);
    }

    #[test]
    fn quiz_allows_empty_question_list() {
        let quiz = QuizDefinition::new(QuizId::new(1), "Checkpoint", 120, false, vec![]).unwrap();
        assert_eq!(quiz.question_count(), 0);
        assert!(quiz.question_at(0).is_none());
    }

    #[test]
    fn quiz_happy_path() {
        let q = Question::new(
            QuestionId::new(1),
            "What is 2+2?",
            vec![option(1, "3"), option(2, "4")],
        )
        .unwrap();
        let quiz = QuizDefinition::new(QuizId::new(9), "Final Exam", 600, true, vec![q]).unwrap();

        assert_eq!(quiz.id(), QuizId::new(9));
        assert!(quiz.is_final());
        assert_eq!(quiz.duration_secs(), 600);
        assert_eq!(quiz.question_at(0).unwrap().text(), "What is 2+2?");
    }
}
