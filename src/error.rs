use std::fmt;
use thiserror::Error;

/// Top-level error for session operations.
#[derive(Error, Debug)]
pub enum QuizError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid input file: {0}")]
    Validation(#[from] ValidationError),
    #[error("Question generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("Command pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("Quiz round error: {0}")]
    Round(#[from] RoundError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set (checked environment and .env)")]
    MissingKey(&'static str),
    #[error("{name} has an invalid value '{value}': expected {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },
    #[error("no models configured for question generation")]
    NoModels,
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("required column '{expected}' not found (columns: {})", .found.join(", "))]
    MissingColumn {
        expected: &'static str,
        found: Vec<String>,
    },
    #[error("could not read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table: {0}")]
    Malformed(#[from] csv::Error),
    #[error("the table has no commands")]
    NoCommands,
}

#[derive(Error, Debug)]
pub enum AIError {
    #[error("Gemini API error: {0}")]
    Gemini(#[from] GeminiError),
    #[error("Mock error: {0}")]
    Mock(String),
}

impl AIError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AIError::Gemini(GeminiError::RateLimit))
    }

    /// Failures that would repeat on every model, so retrying is pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AIError::Gemini(GeminiError::Authentication(_)))
    }
}

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Response blocked by safety policy: {0}")]
    Safety(String),
    #[error("Empty response")]
    EmptyResponse,
}

/// Why a single attempt did not produce a usable batch of questions.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error(transparent)]
    Ai(#[from] AIError),
    #[error("no questions found in model output. Raw response: {raw}")]
    NoQuestions { raw: String },
    #[error("expected {expected} questions, model returned {actual}")]
    WrongCount { expected: usize, actual: usize },
    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

#[derive(Debug)]
pub struct AttemptFailure {
    pub model: String,
    pub attempt: usize,
    pub error: AttemptError,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (attempt {}): {}", self.model, self.attempt, self.error)
    }
}

/// Every configured attempt failed. Holds the failures in the order they happened.
#[derive(Error, Debug)]
#[error("all {} attempt(s) failed; last: {}", .attempts.len(), last_failure(&.attempts))]
pub struct GenerationError {
    pub attempts: Vec<AttemptFailure>,
}

fn last_failure(attempts: &[AttemptFailure]) -> String {
    attempts
        .last()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "none recorded".to_string())
}

impl GenerationError {
    pub fn was_rate_limited(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| matches!(&a.error, AttemptError::Ai(e) if e.is_rate_limit()))
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("cannot select {requested} command(s): {available} available")]
    InvalidSelection { requested: usize, available: usize },
    #[error("pool still has {remaining} unused command(s)")]
    NotExhausted { remaining: usize },
    #[error("no commands loaded")]
    Empty,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoundError {
    #[error("a round needs at least one question")]
    NoQuestions,
    #[error("no active round")]
    NoRound,
    #[error("round already submitted")]
    AlreadySubmitted,
    #[error("the current round has not been submitted yet")]
    InProgress,
    #[error("question {index} does not exist (round has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}
