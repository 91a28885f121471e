use std::path::PathBuf;

use crate::app_config::{AiProvider, AppConfig};
use crate::types::{ContentKind, ScheduleTable};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Credentials are optional at this stage; each CLI mode checks the ones it
/// needs through the `require_*` methods on [`AppConfig`].
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let ai_provider = parse_ai_provider(&or_default("AI_PROVIDER", "openai"))?;
    let text_model = or_default("TWEETSMITH_TEXT_MODEL", ai_provider.default_text_model());
    let auto_post = parse_bool("AUTO_POST", &or_default("AUTO_POST", "false"))?;

    let content_kind = or_default("TWEETSMITH_CONTENT_KIND", "story")
        .parse::<ContentKind>()
        .map_err(|e| invalid("TWEETSMITH_CONTENT_KIND", e))?;

    let post_times = ScheduleTable::parse(&or_default("TWEETSMITH_POST_TIMES", "09:00,14:00,19:00"))
        .map_err(|e| invalid("TWEETSMITH_POST_TIMES", e))?;

    let poll_interval_secs = parse_u64("TWEETSMITH_POLL_INTERVAL_SECS", "60")?;
    if poll_interval_secs == 0 {
        return Err(invalid(
            "TWEETSMITH_POLL_INTERVAL_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let max_post_length = parse_usize("TWEETSMITH_MAX_POST_LENGTH", "280")?;

    Ok(AppConfig {
        ai_provider,
        openai_api_key: optional("OPENAI_API_KEY"),
        gemini_api_key: optional("GEMINI_API_KEY"),
        text_model,
        image_model: or_default("TWEETSMITH_IMAGE_MODEL", "dall-e-3"),
        image_size: or_default("TWEETSMITH_IMAGE_SIZE", "1024x1024"),
        twitter_access_token: optional("TWITTER_ACCESS_TOKEN"),
        twitter_bearer_token: optional("TWITTER_BEARER_TOKEN"),
        auto_post,
        content_kind,
        post_times,
        poll_interval_secs,
        max_post_length,
        history_path: PathBuf::from(or_default("TWEETSMITH_HISTORY_PATH", "post_history.json")),
        image_dir: PathBuf::from(or_default("TWEETSMITH_IMAGE_DIR", "generated_images")),
        profile_path: PathBuf::from(or_default("TWEETSMITH_PROFILE_PATH", "./config/profile.yaml")),
        log_level: or_default("TWEETSMITH_LOG_LEVEL", "info"),
        request_timeout_secs: parse_u64("TWEETSMITH_REQUEST_TIMEOUT_SECS", "30")?,
        max_retries: parse_u32("TWEETSMITH_MAX_RETRIES", "2")?,
        retry_backoff_base_ms: parse_u64("TWEETSMITH_RETRY_BACKOFF_BASE_MS", "1000")?,
    })
}

fn parse_ai_provider(s: &str) -> Result<AiProvider, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "openai" => Ok(AiProvider::OpenAi),
        "gemini" => Ok(AiProvider::Gemini),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AI_PROVIDER".to_string(),
            reason: format!("unsupported provider '{other}'; expected openai or gemini"),
        }),
    }
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected true or false, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
