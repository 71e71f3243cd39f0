use super::Interceptor;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Writes each prompt/response pair to its own markdown file.
#[derive(Debug)]
pub struct TranscriptInterceptor {
    base_path: PathBuf,
}

impl TranscriptInterceptor {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }
}

#[async_trait]
impl Interceptor for TranscriptInterceptor {
    async fn save(&self, model: &str, prompt: &str, response: &str) -> Result<PathBuf, std::io::Error> {
        let timestamp = Utc::now();
        let safe_model: String = model
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        let filename = format!(
            "round_{}_{}.md",
            timestamp.format("%Y%m%d_%H%M%S_%3f"),
            safe_model
        );
        let file_path = self.base_path.join(filename);

        fs::create_dir_all(&self.base_path).await?;

        let content = format!(
            "# Model\n\n{}\n\n# Prompt\n\n{}\n\n# Response\n\n{}\n",
            model, prompt, response
        );

        let mut file = fs::File::create(&file_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(file_path)
    }
}
