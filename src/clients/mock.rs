use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::LowLevelClient;
use crate::error::{AIError, GeminiError};

/// A scripted reply for `MockClient`.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    RateLimit,
    Unauthorized,
    Blocked,
    Failure(String),
}

impl MockResponse {
    fn into_result(self) -> Result<String, AIError> {
        match self {
            MockResponse::Text(text) => Ok(text),
            MockResponse::RateLimit => Err(GeminiError::RateLimit.into()),
            MockResponse::Unauthorized => {
                Err(GeminiError::Authentication("API key not valid".to_string()).into())
            }
            MockResponse::Blocked => Err(GeminiError::Safety("SAFETY".to_string()).into()),
            MockResponse::Failure(message) => Err(AIError::Mock(message)),
        }
    }
}

/// One recorded call to `ask_raw`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub model: String,
    pub prompt: String,
}

/// Shared view into a `MockClient` for queueing replies and inspecting calls.
#[derive(Debug, Default)]
pub struct MockHandle {
    responses: Mutex<VecDeque<MockResponse>>,
    calls: Mutex<Vec<MockCall>>,
    models: Mutex<Vec<String>>,
}

impl MockHandle {
    pub fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(MockResponse::Text(text.into()));
    }

    pub fn set_models(&self, models: Vec<String>) {
        *self.models.lock().unwrap() = models;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn pending(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

/// Mock client that replays queued responses in order.
///
/// When the queue runs dry every call fails with `AIError::Mock`.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for r in responses {
            handle.push(r);
        }
        (client, handle)
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn ask_raw(&self, model: &str, prompt: String) -> Result<String, AIError> {
        self.handle.calls.lock().unwrap().push(MockCall {
            model: model.to_string(),
            prompt,
        });
        let next = self.handle.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => response.into_result(),
            None => Err(AIError::Mock("no scripted response left".to_string())),
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, AIError> {
        Ok(self.handle.models.lock().unwrap().clone())
    }
}
