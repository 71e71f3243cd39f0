//! The batch of questions currently on screen and the answers typed so far.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use super::question::{normalize, Question};
use crate::error::RoundError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    NoRound,
    Unanswered,
    PartiallyAnswered,
    Submitted,
}

#[derive(Debug, Clone)]
struct ActiveRound {
    questions: Vec<Question>,
    source_commands: Vec<String>,
    answers: HashMap<usize, String>,
    submitted: bool,
}

/// Holds at most one round. Operations on an absent round fail with `RoundError::NoRound`.
#[derive(Debug, Clone, Default)]
pub struct QuizRound {
    current: Option<ActiveRound>,
}

/// Outcome for one question, kept next to what was compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub index: usize,
    pub given: String,
    pub expected: String,
    pub correct: bool,
}

/// Derived from a round on every submit; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingResult {
    pub outcomes: Vec<QuestionOutcome>,
}

impl GradingResult {
    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.correct).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_perfect(&self) -> bool {
        self.correct() == self.total()
    }
}

impl fmt::Display for GradingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.correct(), self.total())
    }
}

/// Exact match after trimming and lower-casing both sides.
pub fn grade(question: &Question, user_answer: &str) -> bool {
    normalize(question.answer()) == normalize(user_answer)
}

impl QuizRound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh round, dropping whatever was there.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        source_commands: Vec<String>,
    ) -> Result<(), RoundError> {
        if questions.is_empty() {
            return Err(RoundError::NoQuestions);
        }
        debug!(questions = questions.len(), "Starting quiz round");
        self.current = Some(ActiveRound {
            questions,
            source_commands,
            answers: HashMap::new(),
            submitted: false,
        });
        Ok(())
    }

    pub fn set_answer(&mut self, index: usize, value: impl Into<String>) -> Result<(), RoundError> {
        let round = self.current.as_mut().ok_or(RoundError::NoRound)?;
        if round.submitted {
            return Err(RoundError::AlreadySubmitted);
        }
        if index >= round.questions.len() {
            return Err(RoundError::IndexOutOfRange {
                index,
                len: round.questions.len(),
            });
        }
        round.answers.insert(index, value.into());
        Ok(())
    }

    /// Mark the round submitted and grade it. Calling again regrades the same answers.
    pub fn submit(&mut self) -> Result<GradingResult, RoundError> {
        let round = self.current.as_mut().ok_or(RoundError::NoRound)?;
        round.submitted = true;
        let outcomes = round
            .questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let given = round.answers.get(&index).cloned().unwrap_or_default();
                QuestionOutcome {
                    index,
                    correct: grade(question, &given),
                    expected: question.answer().to_string(),
                    given,
                }
            })
            .collect();
        let result = GradingResult { outcomes };
        debug!(score = %result, "Round graded");
        Ok(result)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn phase(&self) -> RoundPhase {
        match &self.current {
            None => RoundPhase::NoRound,
            Some(r) if r.submitted => RoundPhase::Submitted,
            Some(r) if r.answers.is_empty() => RoundPhase::Unanswered,
            Some(_) => RoundPhase::PartiallyAnswered,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_submitted(&self) -> bool {
        self.phase() == RoundPhase::Submitted
    }

    pub fn questions(&self) -> &[Question] {
        self.current
            .as_ref()
            .map(|r| r.questions.as_slice())
            .unwrap_or(&[])
    }

    pub fn source_commands(&self) -> &[String] {
        self.current
            .as_ref()
            .map(|r| r.source_commands.as_slice())
            .unwrap_or(&[])
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.current
            .as_ref()
            .and_then(|r| r.answers.get(&index))
            .map(String::as_str)
    }
}
