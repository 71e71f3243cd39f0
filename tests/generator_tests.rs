mod test_utils;

use std::sync::Arc;
use std::time::{Duration, Instant};

use command_quiz::clients::{MockClient, MockResponse};
use command_quiz::error::{AIError, AttemptError, GeminiError};
use command_quiz::generator::{parse_questions, QuizGenerator, RetryConfig};
use command_quiz::interceptors::TranscriptInterceptor;
use command_quiz::quiz::Question;

use crate::test_utils::*;

fn commands(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn first_good_reply_is_returned() {
    init_tracing();
    let (generator, handle) = mock_generator(vec![two_question_reply()]);
    let questions = generator.generate(&commands(&["ls", "cd"])).await.unwrap();

    assert_eq!(questions.len(), 2);
    assert!(matches!(questions[0], Question::FillInTheBlank { .. }));
    assert_eq!(questions[1].options().unwrap().len(), 4);
    assert_eq!(handle.call_count(), 1);
    assert_eq!(handle.calls()[0].model, "model-a");
}

#[tokio::test]
async fn prompt_names_commands_language_and_count() {
    let (generator, handle) = mock_generator(vec![two_question_reply()]);
    generator.generate(&commands(&["tar -xzf", "ssh"])).await.unwrap();

    let prompt = &handle.calls()[0].prompt;
    assert!(prompt.contains("1. tar -xzf"));
    assert!(prompt.contains("2. ssh"));
    assert!(prompt.contains("exactly 2 questions"));
    assert!(prompt.contains("in English"));
    assert!(prompt.contains("fill_in_the_blank"));
}

#[tokio::test]
async fn malformed_output_falls_through_to_next_attempt() {
    let (generator, handle) = mock_generator(vec![
        MockResponse::Text("Sorry, I cannot produce JSON today.".to_string()),
        MockResponse::Text(r#"[{"type":"fill_in_the_blank","question":"only one","answer":"ls"}]"#.to_string()),
        two_question_reply(),
    ]);
    let questions = generator.generate(&commands(&["ls", "cd"])).await.unwrap();
    assert_eq!(questions.len(), 2);

    let models: Vec<String> = handle.calls().into_iter().map(|c| c.model).collect();
    assert_eq!(models, vec!["model-a", "model-a", "model-b"]);
}

#[tokio::test]
async fn all_attempts_failing_aggregates_every_failure() {
    let (generator, handle) = mock_generator(vec![
        MockResponse::RateLimit,
        MockResponse::Blocked,
        MockResponse::Text("not json".to_string()),
        MockResponse::Failure("connection reset".to_string()),
    ]);
    let err = generator.generate(&commands(&["ls", "cd"])).await.unwrap_err();

    assert_eq!(err.attempts.len(), 4);
    assert_eq!(handle.call_count(), 4);
    assert!(err.was_rate_limited());
    assert_eq!(err.attempts[0].model, "model-a");
    assert_eq!(err.attempts[0].attempt, 1);
    assert_eq!(err.attempts[3].model, "model-b");
    assert_eq!(err.attempts[3].attempt, 2);
    assert!(matches!(
        err.attempts[1].error,
        AttemptError::Ai(AIError::Gemini(GeminiError::Safety(_)))
    ));
    assert!(matches!(err.attempts[2].error, AttemptError::NoQuestions { .. }));
}

#[tokio::test]
async fn authentication_failure_stops_retrying() {
    let (generator, handle) = mock_generator(vec![MockResponse::Unauthorized, two_question_reply()]);
    let err = generator.generate(&commands(&["ls", "cd"])).await.unwrap_err();

    assert_eq!(err.attempts.len(), 1);
    assert_eq!(handle.call_count(), 1);
    assert_eq!(handle.pending(), 1);
}

#[tokio::test]
async fn rate_limit_then_success_on_same_model() {
    let (generator, handle) = mock_generator(vec![MockResponse::RateLimit, two_question_reply()]);
    generator.generate(&commands(&["ls", "cd"])).await.unwrap();
    let models: Vec<String> = handle.calls().into_iter().map(|c| c.model).collect();
    assert_eq!(models, vec!["model-a", "model-a"]);
}

fn single_attempt_with_backoff(backoff: Duration, attempts_per_model: usize) -> RetryConfig {
    RetryConfig {
        models: vec!["model-a".to_string()],
        attempts_per_model,
        rate_limit_backoff: backoff,
    }
}

#[tokio::test]
async fn rate_limit_on_last_attempt_fails_without_waiting() {
    let (client, _handle) = MockClient::with_responses(vec![MockResponse::RateLimit]);
    let generator = QuizGenerator::new(
        client,
        single_attempt_with_backoff(Duration::from_secs(2), 1),
        "English",
    );

    let started = Instant::now();
    let err = generator.generate(&commands(&["ls"])).await.unwrap_err();
    assert_eq!(err.attempts.len(), 1);
    assert!(err.was_rate_limited());
    assert!(started.elapsed() < Duration::from_secs(1), "waited {:?}", started.elapsed());
}

#[tokio::test]
async fn rate_limit_waits_before_the_retry() {
    let reply = fenced_reply(&[fill_in("____ -la", "ls")]);
    let (client, handle) = MockClient::with_responses(vec![MockResponse::RateLimit, reply]);
    let generator = QuizGenerator::new(
        client,
        single_attempt_with_backoff(Duration::from_millis(50), 2),
        "English",
    );

    let started = Instant::now();
    generator.generate(&commands(&["ls"])).await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(handle.call_count(), 2);
}

#[tokio::test]
async fn transcripts_are_written_when_configured() {
    let dir = std::env::temp_dir().join(format!("command-quiz-transcripts-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let (client, _handle) = MockClient::with_responses(vec![two_question_reply()]);
    let generator = QuizGenerator::new(client, fast_retry(), "English")
        .with_interceptor(Arc::new(TranscriptInterceptor::new(dir.clone())));
    generator.generate(&commands(&["ls", "cd"])).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let path = entries.into_iter().next().unwrap().unwrap().path();
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("# Prompt"));
    assert!(text.contains("ls -la"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn wrapper_object_is_accepted() {
    let raw = r#"{"questions":[{"type":"fill_in_the_blank","question":"____ -r dir","answer":"rm"}]}"#;
    let questions = parse_questions(raw, 1).unwrap();
    assert_eq!(questions[0].answer(), "rm");
}

#[test]
fn invalid_multiple_choice_is_rejected() {
    let raw = r#"[{"type":"multiple_choice","question":"?","options":["a","b","c","d"],"answer":"e"}]"#;
    let err = parse_questions(raw, 1).unwrap_err();
    assert!(matches!(err, AttemptError::InvalidQuestion { index: 0, .. }));
}

#[test]
fn wrong_count_is_rejected() {
    let raw = r#"[{"type":"fill_in_the_blank","question":"____","answer":"ls"}]"#;
    let err = parse_questions(raw, 3).unwrap_err();
    assert!(matches!(err, AttemptError::WrongCount { expected: 3, actual: 1 }));
}

#[tokio::test]
async fn model_check_marks_configured_models() {
    let (generator, handle) = mock_generator(vec![]);
    handle.set_models(vec!["model-b".to_string(), "model-z".to_string()]);

    let report = generator.check_models().await.unwrap();
    assert_eq!(report.available, vec!["model-b", "model-z"]);
    let statuses: Vec<(&str, bool)> = report
        .configured
        .iter()
        .map(|m| (m.name.as_str(), m.available))
        .collect();
    assert_eq!(statuses, vec![("model-a", false), ("model-b", true)]);
    assert_eq!(report.missing().collect::<Vec<_>>(), vec!["model-a"]);
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn model_check_ignores_resource_prefix() {
    let (generator, handle) = mock_generator(vec![]);
    handle.set_models(vec!["models/model-a".to_string(), "model-b".to_string()]);

    let report = generator.check_models().await.unwrap();
    assert_eq!(report.missing().count(), 0);
}
