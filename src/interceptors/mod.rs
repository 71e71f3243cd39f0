use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;

/// Observer for raw model exchanges.
#[async_trait]
pub trait Interceptor: Send + Sync + Debug {
    async fn save(&self, model: &str, prompt: &str, response: &str) -> Result<PathBuf, std::io::Error>;
}

pub mod file;
pub use file::TranscriptInterceptor;
