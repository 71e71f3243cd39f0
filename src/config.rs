use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::generator::RetryConfig;

/// Trait for clients that read their credential from the environment.
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Look the key up in the environment, loading `.env` first if present.
    fn find_key() -> Option<String> {
        let _ = dotenvy::dotenv();
        env::var(Self::KEY_NAME)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Like `find_key`, but a missing key is a configuration error.
    fn require_key() -> Result<String, ConfigError> {
        Self::find_key().ok_or(ConfigError::MissingKey(Self::KEY_NAME))
    }
}

pub const DEFAULT_LANGUAGE: &str = "Turkish";

/// Settings for one quiz session, independent of the backend.
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Language the questions are written in.
    pub language: String,
    pub retry: RetryConfig,
    /// Where prompt/response transcripts go, if anywhere.
    pub transcript_dir: Option<PathBuf>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            retry: RetryConfig::default(),
            transcript_dir: None,
        }
    }
}

impl QuizConfig {
    /// Defaults overlaid with `QUIZ_*` variables from the environment and `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(language) = lookup("QUIZ_LANGUAGE").filter(|v| !v.trim().is_empty()) {
            config.language = language.trim().to_string();
        }
        if let Some(models) = lookup("QUIZ_MODELS") {
            config.retry.models = parse_model_list(&models)?;
        }
        if let Some(raw) = lookup("QUIZ_ATTEMPTS_PER_MODEL") {
            config.retry.attempts_per_model = parse_positive("QUIZ_ATTEMPTS_PER_MODEL", &raw)?;
        }
        if let Some(raw) = lookup("QUIZ_RATE_LIMIT_BACKOFF_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "QUIZ_RATE_LIMIT_BACKOFF_SECS".to_string(),
                value: raw.clone(),
                expected: "a whole number of seconds",
            })?;
            config.retry.rate_limit_backoff = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("QUIZ_TRANSCRIPT_DIR").filter(|v| !v.trim().is_empty()) {
            config.transcript_dir = Some(PathBuf::from(dir.trim()));
        }

        Ok(config)
    }
}

/// Parse a comma-separated model list, dropping blanks.
pub fn parse_model_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let models: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    if models.is_empty() {
        return Err(ConfigError::NoModels);
    }
    Ok(models)
}

fn parse_positive(name: &str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
            expected: "a positive integer",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = QuizConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.language, DEFAULT_LANGUAGE);
        assert_eq!(config.retry.models, RetryConfig::default().models);
        assert!(config.transcript_dir.is_none());
    }

    #[test]
    fn environment_overrides_retry_policy() {
        let config = QuizConfig::from_lookup(lookup_from(&[
            ("QUIZ_LANGUAGE", "German"),
            ("QUIZ_MODELS", "gemini-a, ,gemini-b"),
            ("QUIZ_ATTEMPTS_PER_MODEL", "3"),
            ("QUIZ_RATE_LIMIT_BACKOFF_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.language, "German");
        assert_eq!(config.retry.models, vec!["gemini-a", "gemini-b"]);
        assert_eq!(config.retry.attempts_per_model, 3);
        assert_eq!(config.retry.rate_limit_backoff, Duration::ZERO);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let err = QuizConfig::from_lookup(lookup_from(&[("QUIZ_ATTEMPTS_PER_MODEL", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn blank_model_list_is_rejected() {
        assert!(matches!(parse_model_list(" , "), Err(ConfigError::NoModels)));
    }
}
