//! Server-side answer validation.
//!
//! Correct answers live on the platform backend; the client only ever sends
//! the learner's picks and receives per-answer verdicts. `AnswerValidator`
//! is the seam, `HttpAnswerValidator` the production adapter and
//! `AnswerKeyValidator` the in-memory stand-in for tests.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use course_core::model::{Answer, AnswerResult, OptionId, QuestionId, QuizId};

use crate::error::ValidatorError;

/// Scores one submitted answer batch.
///
/// Called at most once per attempt; the attempt machinery's scoring guard
/// enforces that on the calling side.
#[async_trait]
pub trait AnswerValidator: Send + Sync {
    /// Validate the batch and return one verdict per answer, in order.
    ///
    /// # Errors
    ///
    /// Returns an error when no verdicts could be obtained; the caller falls
    /// back to an unscored completion.
    async fn validate(
        &self,
        quiz: QuizId,
        answers: &[Answer],
    ) -> Result<Vec<AnswerResult>, ValidatorError>;
}

/// Connection settings for the validation endpoint.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ValidatorConfig {
    /// Read configuration from `ANSWER_VALIDATOR_URL` and the optional
    /// `ANSWER_VALIDATOR_TOKEN`. Returns `None` when no endpoint is set,
    /// leaving validation disabled.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("ANSWER_VALIDATOR_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("ANSWER_VALIDATOR_TOKEN")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Some(Self { base_url, api_key })
    }
}

/// HTTP adapter for the platform's validation endpoint.
#[derive(Clone)]
pub struct HttpAnswerValidator {
    client: Client,
    config: Option<ValidatorConfig>,
}

impl HttpAnswerValidator {
    #[must_use]
    pub fn new(config: Option<ValidatorConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ValidatorConfig::from_env())
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl AnswerValidator for HttpAnswerValidator {
    async fn validate(
        &self,
        quiz: QuizId,
        answers: &[Answer],
    ) -> Result<Vec<AnswerResult>, ValidatorError> {
        let config = self.config.as_ref().ok_or(ValidatorError::Disabled)?;
        let url = format!(
            "{}/quizzes/{}/validate",
            config.base_url.trim_end_matches('/'),
            quiz
        );
        let payload = ValidateRequest {
            answers: answers
                .iter()
                .map(|answer| AnswerPayload {
                    question_id: answer.question_id,
                    option_id: answer.option_id,
                })
                .collect(),
        };

        let mut request = self.client.post(url).json(&payload);
        if let Some(key) = &config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ValidatorError::HttpStatus(response.status()));
        }

        let body: ValidateResponse = response.json().await?;
        if body.results.len() != answers.len() {
            return Err(ValidatorError::ResultCountMismatch {
                expected: answers.len(),
                got: body.results.len(),
            });
        }
        Ok(body
            .results
            .into_iter()
            .map(|verdict| {
                AnswerResult::new(verdict.question_id, verdict.option_id, verdict.is_correct)
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct ValidateRequest {
    answers: Vec<AnswerPayload>,
}

#[derive(Debug, Serialize)]
struct AnswerPayload {
    question_id: QuestionId,
    option_id: OptionId,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    results: Vec<VerdictPayload>,
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    question_id: QuestionId,
    option_id: OptionId,
    is_correct: bool,
}

/// In-memory answer key, for tests and local prototyping.
#[derive(Debug, Clone, Default)]
pub struct AnswerKeyValidator {
    key: HashMap<(QuizId, QuestionId), OptionId>,
}

impl AnswerKeyValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the correct option for one question.
    #[must_use]
    pub fn with_correct(mut self, quiz: QuizId, question: QuestionId, option: OptionId) -> Self {
        self.key.insert((quiz, question), option);
        self
    }
}

#[async_trait]
impl AnswerValidator for AnswerKeyValidator {
    async fn validate(
        &self,
        quiz: QuizId,
        answers: &[Answer],
    ) -> Result<Vec<AnswerResult>, ValidatorError> {
        Ok(answers
            .iter()
            .map(|answer| {
                let correct = self.key.get(&(quiz, answer.question_id)) == Some(&answer.option_id);
                AnswerResult::new(answer.question_id, answer.option_id, correct)
            })
            .collect())
    }
}
