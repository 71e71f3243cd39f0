#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use command_quiz::clients::{MockClient, MockHandle, MockResponse};
use command_quiz::generator::{QuizGenerator, RetryConfig};
use command_quiz::session::Session;

pub const SAMPLE_COMMANDS: [&str; 4] = ["ls", "cd", "grep", "chmod"];

pub fn init_tracing() {
    static START: Once = Once::new();
    START.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::EnvFilter::from_default_env()
        } else {
            tracing_subscriber::EnvFilter::new("command_quiz=debug")
        };
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .without_time()
            .with_env_filter(filter)
            .try_init();
    });
}

pub fn sample_commands() -> Vec<String> {
    SAMPLE_COMMANDS.iter().map(|c| c.to_string()).collect()
}

/// Two models, two attempts each, no waiting.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        models: vec!["model-a".to_string(), "model-b".to_string()],
        attempts_per_model: 2,
        rate_limit_backoff: Duration::ZERO,
    }
}

pub fn mock_generator(responses: Vec<MockResponse>) -> (QuizGenerator<MockClient>, Arc<MockHandle>) {
    let (client, handle) = MockClient::with_responses(responses);
    (QuizGenerator::new(client, fast_retry(), "English"), handle)
}

/// A seeded session over `SAMPLE_COMMANDS` backed by a scripted mock.
pub fn mock_session(responses: Vec<MockResponse>) -> (Session<MockClient>, Arc<MockHandle>) {
    init_tracing();
    let (generator, handle) = mock_generator(responses);
    let mut session = Session::with_seed(generator, 42);
    session.load_commands(sample_commands());
    (session, handle)
}

pub fn fill_in(prompt: &str, answer: &str) -> serde_json::Value {
    serde_json::json!({"type": "fill_in_the_blank", "question": prompt, "answer": answer})
}

pub fn multiple_choice(prompt: &str, options: [&str; 4], answer: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "multiple_choice",
        "question": prompt,
        "options": options,
        "answer": answer,
    })
}

/// A model reply wrapping the questions in prose and a code fence.
pub fn fenced_reply(questions: &[serde_json::Value]) -> MockResponse {
    let body = serde_json::to_string_pretty(questions).unwrap();
    MockResponse::Text(format!("Here is your quiz:\n```json\n{body}\n```\nGood luck!"))
}

/// A valid two-question reply: "ls -la" (blank) and "cd" (multiple choice).
pub fn two_question_reply() -> MockResponse {
    fenced_reply(&[
        fill_in("____ lists all files in long format", "ls -la"),
        multiple_choice(
            "Which command changes the current directory?",
            ["pwd", "cd", "mv", "rm"],
            "cd",
        ),
    ])
}
