//! Turns a batch of commands into validated quiz questions.
//!
//! Wraps a `LowLevelClient` with schema-guided prompting, JSON extraction
//! from mixed model output, and a retry policy over an ordered model list.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use schemars::schema_for;
use tracing::{debug, info, instrument, warn};

use crate::core::LowLevelClient;
use crate::error::{AIError, AttemptError, AttemptFailure, GenerationError};
use crate::interceptors::Interceptor;
use crate::json_utils::extract_all;
use crate::quiz::Question;

/// Which models to try, how often, and how long to wait after a rate limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Tried in order; later entries are fallbacks.
    pub models: Vec<String>,
    pub attempts_per_model: usize,
    pub rate_limit_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gemini-2.0-flash".to_string(),
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-pro".to_string(),
            ],
            attempts_per_model: 2,
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn max_attempts(&self) -> usize {
        self.models.len() * self.attempts_per_model
    }
}

/// A configured model and whether the backend offers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub name: String,
    pub available: bool,
}

/// What the backend offers, checked against the retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReport {
    pub available: Vec<String>,
    /// In retry order.
    pub configured: Vec<ModelStatus>,
}

impl ModelReport {
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.configured
            .iter()
            .filter(|m| !m.available)
            .map(|m| m.name.as_str())
    }
}

/// Generator that asks a model for questions and validates what comes back.
#[derive(Debug, Clone)]
pub struct QuizGenerator<C: LowLevelClient> {
    client: C,
    retry: RetryConfig,
    language: String,
    interceptor: Option<Arc<dyn Interceptor>>,
}

impl<C: LowLevelClient> QuizGenerator<C> {
    pub fn new(client: C, retry: RetryConfig, language: impl Into<String>) -> Self {
        let language = language.into();
        info!(
            models = ?retry.models,
            attempts_per_model = retry.attempts_per_model,
            language = %language,
            "Creating quiz generator"
        );
        Self {
            client,
            retry,
            language,
            interceptor: None,
        }
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// List the backend's models and mark which configured ones it offers.
    #[instrument(target = "command_quiz::generator", skip(self))]
    pub async fn check_models(&self) -> Result<ModelReport, AIError> {
        let available = self.client.list_models().await?;
        let configured = self
            .retry
            .models
            .iter()
            .map(|name| {
                let wanted = name.trim_start_matches("models/");
                ModelStatus {
                    name: name.clone(),
                    available: available
                        .iter()
                        .any(|m| m.trim_start_matches("models/") == wanted),
                }
            })
            .collect();
        let report = ModelReport { available, configured };
        debug!(
            target: "command_quiz::generator",
            available = report.available.len(),
            missing = report.missing().count(),
            "Checked configured models"
        );
        Ok(report)
    }

    /// Build the prompt asking for one question per command.
    pub fn build_prompt(&self, commands: &[String]) -> String {
        let schema = schema_for!(Question);
        let schema_json = serde_json::to_string_pretty(&schema)
            .unwrap_or_else(|_| "Schema serialization failed".to_string());
        let list: String = commands
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}\n", i + 1, c))
            .collect();

        format!(
            "You are writing a quiz about shell commands.\n\
             Write exactly {count} questions, one for each command below, in {language}.\n\
             Mix multiple_choice questions (exactly 4 options, the answer copied verbatim from \
             the options) with fill_in_the_blank questions (no options, the answer is the exact \
             missing text).\n\
             Keep command names, flags and paths in their original form.\n\n\
             ## Commands\n{list}\n\
             ## Response Format\n\
             Reply with a JSON array of {count} objects, each matching this schema:\n\
             ```json\n{schema_json}\n```",
            count = commands.len(),
            language = self.language,
        )
    }

    /// Generate one question per command, trying models per the retry policy.
    ///
    /// Fails only after every attempt failed; the error lists each attempt.
    #[instrument(target = "command_quiz::generator", skip(self, commands), fields(count = commands.len()))]
    pub async fn generate(&self, commands: &[String]) -> Result<Vec<Question>, GenerationError> {
        let prompt = self.build_prompt(commands);
        let mut failures: Vec<AttemptFailure> = Vec::new();

        'models: for model in &self.retry.models {
            for attempt in 1..=self.retry.attempts_per_model {
                debug!(target: "command_quiz::generator", model = %model, attempt, "Requesting questions");
                match self.attempt(model, &prompt, commands.len()).await {
                    Ok(questions) => {
                        info!(
                            target: "command_quiz::generator",
                            model = %model,
                            attempt,
                            questions = questions.len(),
                            "Generated questions"
                        );
                        return Ok(questions);
                    }
                    Err(error) => {
                        warn!(target: "command_quiz::generator", model = %model, attempt, error = %error, "Attempt failed");
                        let rate_limited = matches!(&error, AttemptError::Ai(e) if e.is_rate_limit());
                        let fatal = matches!(&error, AttemptError::Ai(e) if e.is_fatal());
                        failures.push(AttemptFailure {
                            model: model.clone(),
                            attempt,
                            error,
                        });
                        if fatal {
                            break 'models;
                        }
                        let retries_left = failures.len() < self.retry.max_attempts();
                        if rate_limited && retries_left && !self.retry.rate_limit_backoff.is_zero() {
                            debug!(
                                target: "command_quiz::generator",
                                wait_ms = self.retry.rate_limit_backoff.as_millis() as u64,
                                "Backing off after rate limit"
                            );
                            tokio::time::sleep(self.retry.rate_limit_backoff).await;
                        }
                    }
                }
            }
        }

        Err(GenerationError { attempts: failures })
    }

    async fn attempt(
        &self,
        model: &str,
        prompt: &str,
        expected: usize,
    ) -> Result<Vec<Question>, AttemptError> {
        let raw = self.client.ask_raw(model, prompt.to_string()).await?;

        if let Some(interceptor) = &self.interceptor {
            match interceptor.save(model, prompt, &raw).await {
                Ok(path) => debug!(path = %path.display(), "Saved transcript"),
                Err(e) => warn!(error = %e, "Could not save transcript"),
            }
        }

        parse_questions(&raw, expected)
    }
}

/// Extract and validate exactly `expected` questions from raw model output.
pub fn parse_questions(raw: &str, expected: usize) -> Result<Vec<Question>, AttemptError> {
    let questions: Vec<Question> = extract_all(raw);
    if questions.is_empty() {
        return Err(AttemptError::NoQuestions {
            raw: raw.to_string(),
        });
    }
    if questions.len() != expected {
        return Err(AttemptError::WrongCount {
            expected,
            actual: questions.len(),
        });
    }
    for (index, q) in questions.iter().enumerate() {
        q.validate()
            .map_err(|reason| AttemptError::InvalidQuestion { index, reason })?;
    }
    Ok(questions)
}
