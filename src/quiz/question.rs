use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const OPTION_COUNT: usize = 4;

/// One generated quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
#[schemars(title = "Question", description = "A single quiz question about one shell command")]
pub enum Question {
    /// Pick one of four options.
    MultipleChoice {
        /// The question text shown to the user
        #[serde(rename = "question")]
        prompt: String,
        /// Exactly four answer options
        #[schemars(length(min = 4, max = 4))]
        options: Vec<String>,
        /// The correct option, copied verbatim from `options`
        answer: String,
    },
    /// Type the missing text.
    FillInTheBlank {
        /// The question text, with the blank marked as ____
        #[serde(rename = "question")]
        prompt: String,
        /// The exact text that fills the blank
        answer: String,
    },
}

impl Question {
    pub fn prompt(&self) -> &str {
        match self {
            Question::MultipleChoice { prompt, .. } | Question::FillInTheBlank { prompt, .. } => {
                prompt
            }
        }
    }

    pub fn answer(&self) -> &str {
        match self {
            Question::MultipleChoice { answer, .. } | Question::FillInTheBlank { answer, .. } => {
                answer
            }
        }
    }

    pub fn options(&self) -> Option<&[String]> {
        match self {
            Question::MultipleChoice { options, .. } => Some(options),
            Question::FillInTheBlank { .. } => None,
        }
    }

    /// Check the shape rules the renderer and grader rely on.
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt().trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.answer().trim().is_empty() {
            return Err("correct answer is empty".to_string());
        }
        if let Question::MultipleChoice { options, answer, .. } = self {
            if options.len() != OPTION_COUNT {
                return Err(format!(
                    "expected {} options, got {}",
                    OPTION_COUNT,
                    options.len()
                ));
            }
            if options.iter().any(|o| o.trim().is_empty()) {
                return Err("an option is empty".to_string());
            }
            let key = normalize(answer);
            if !options.iter().any(|o| normalize(o) == key) {
                return Err(format!("answer '{}' is not one of the options", answer));
            }
        }
        Ok(())
    }
}

/// Trim and lower-case. The only normalization grading applies.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
