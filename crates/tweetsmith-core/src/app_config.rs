use std::path::PathBuf;

use crate::types::{ContentKind, ScheduleTable};
use crate::ConfigError;

/// Generative text backend selected by `AI_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    OpenAi,
    Gemini,
}

impl AiProvider {
    /// Default chat model for the provider when `TWEETSMITH_TEXT_MODEL` is unset.
    #[must_use]
    pub fn default_text_model(self) -> &'static str {
        match self {
            AiProvider::OpenAi => "gpt-4o-mini",
            AiProvider::Gemini => "gemini-1.5-flash",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiProvider::OpenAi => write!(f, "openai"),
            AiProvider::Gemini => write!(f, "gemini"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub ai_provider: AiProvider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub twitter_access_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub auto_post: bool,
    pub content_kind: ContentKind,
    pub post_times: ScheduleTable,
    pub poll_interval_secs: u64,
    pub max_post_length: usize,
    pub history_path: PathBuf,
    pub image_dir: PathBuf,
    pub profile_path: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl AppConfig {
    /// API key for the configured text provider.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the provider's key variable
    /// when it is not set.
    pub fn require_text_provider(&self) -> Result<&str, ConfigError> {
        let (key, var) = match self.ai_provider {
            AiProvider::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            AiProvider::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
        };
        key.as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    }

    /// User-context token used to publish. Only required when `AUTO_POST` is on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for `TWITTER_ACCESS_TOKEN` when
    /// auto-posting is enabled without it.
    pub fn require_publisher(&self) -> Result<Option<&str>, ConfigError> {
        if !self.auto_post {
            return Ok(None);
        }
        self.twitter_access_token
            .as_deref()
            .map(Some)
            .ok_or_else(|| ConfigError::MissingEnvVar("TWITTER_ACCESS_TOKEN".to_string()))
    }

    /// Token for read-only endpoints: the bearer token, else the access token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when neither token is set.
    pub fn require_reader(&self) -> Result<&str, ConfigError> {
        self.twitter_bearer_token
            .as_deref()
            .or(self.twitter_access_token.as_deref())
            .ok_or_else(|| ConfigError::MissingEnvVar("TWITTER_BEARER_TOKEN".to_string()))
    }
}

fn redact(value: Option<&String>) -> Option<&'static str> {
    value.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("ai_provider", &self.ai_provider)
            .field("openai_api_key", &redact(self.openai_api_key.as_ref()))
            .field("gemini_api_key", &redact(self.gemini_api_key.as_ref()))
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("image_size", &self.image_size)
            .field(
                "twitter_access_token",
                &redact(self.twitter_access_token.as_ref()),
            )
            .field(
                "twitter_bearer_token",
                &redact(self.twitter_bearer_token.as_ref()),
            )
            .field("auto_post", &self.auto_post)
            .field("content_kind", &self.content_kind)
            .field("post_times", &self.post_times)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("max_post_length", &self.max_post_length)
            .field("history_path", &self.history_path)
            .field("image_dir", &self.image_dir)
            .field("profile_path", &self.profile_path)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}
