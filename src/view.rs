//! Plain-text rendering for the terminal front end.

use crate::error::GenerationError;
use crate::quiz::{normalize, GradingResult, Question};
use crate::session::Progress;

const BAR_WIDTH: usize = 30;
const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];

/// `[#####.....] 4/10 used, 6 left`
pub fn progress_line(progress: &Progress) -> String {
    let filled = (progress.fraction * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {}/{} used, {} left",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        progress.total - progress.remaining,
        progress.total,
        progress.remaining
    )
}

/// Question text with lettered options, numbered from 1.
pub fn render_question(index: usize, question: &Question) -> String {
    let mut out = format!("{}. {}", index + 1, question.prompt());
    match question.options() {
        Some(options) => {
            for (letter, option) in LETTERS.iter().zip(options) {
                out.push_str(&format!("\n   {letter}) {option}"));
            }
        }
        None => out.push_str("\n   (type the missing text)"),
    }
    out
}

/// Map a typed answer to what gets graded.
///
/// For multiple choice a single letter A-D picks that option, unless the
/// input already names one of the options; anything else is taken as typed.
pub fn resolve_answer(question: &Question, input: &str) -> String {
    let trimmed = input.trim();
    if let Some(options) = question.options() {
        if options.iter().any(|o| normalize(o) == normalize(trimmed)) {
            return trimmed.to_string();
        }
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let upper = c.to_ascii_uppercase();
            if let Some(pos) = LETTERS.iter().position(|&l| l == upper) {
                if let Some(option) = options.get(pos) {
                    return option.clone();
                }
            }
        }
    }
    trimmed.to_string()
}

/// One line per question plus the score.
pub fn render_result(questions: &[Question], result: &GradingResult) -> Vec<(bool, String)> {
    let mut lines: Vec<(bool, String)> = result
        .outcomes
        .iter()
        .map(|o| {
            let prompt = questions.get(o.index).map(Question::prompt).unwrap_or("");
            let given = if o.given.trim().is_empty() { "(no answer)" } else { o.given.as_str() };
            let line = if o.correct {
                format!("{}. {} -> {}", o.index + 1, prompt, given)
            } else {
                format!(
                    "{}. {} -> {} (correct: {})",
                    o.index + 1,
                    prompt,
                    given,
                    o.expected
                )
            };
            (o.correct, line)
        })
        .collect();
    lines.push((result.is_perfect(), format!("Score: {result}")));
    lines
}

pub fn render_generation_failure(err: &GenerationError) -> Vec<String> {
    let mut lines = vec![format!(
        "Could not generate questions after {} attempt(s). The pool was not changed.",
        err.attempts.len()
    )];
    lines.extend(err.attempts.iter().map(|a| format!("  - {a}")));
    if err.was_rate_limited() {
        lines.push("  The service is rate limiting requests; wait a moment or ask for fewer questions.".to_string());
    }
    lines
}
