//! Backend abstraction for the question generator.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::AIError;

/// Low-level model client.
///
/// Implementors send a prompt to a named model and return its raw text. Turning
/// that text into questions is the generator's job.
#[async_trait]
pub trait LowLevelClient: Send + Sync + Debug {
    async fn ask_raw(&self, model: &str, prompt: String) -> Result<String, AIError>;

    /// Model identifiers the backend reports as usable.
    async fn list_models(&self) -> Result<Vec<String>, AIError>;
}
