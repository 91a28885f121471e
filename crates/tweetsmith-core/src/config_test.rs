use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn empty_env_uses_defaults() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.ai_provider, AiProvider::OpenAi);
    assert_eq!(cfg.text_model, "gpt-4o-mini");
    assert_eq!(cfg.image_model, "dall-e-3");
    assert!(!cfg.auto_post);
    assert_eq!(cfg.content_kind, ContentKind::Story);
    assert_eq!(cfg.post_times.to_string(), "09:00,14:00,19:00");
    assert_eq!(cfg.poll_interval_secs, 60);
    assert_eq!(cfg.max_post_length, 280);
    assert_eq!(cfg.history_path, PathBuf::from("post_history.json"));
    assert_eq!(cfg.image_dir, PathBuf::from("generated_images"));
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.max_retries, 2);
    assert_eq!(cfg.retry_backoff_base_ms, 1000);
}

#[test]
fn gemini_provider_switches_default_model() {
    let mut map = HashMap::new();
    map.insert("AI_PROVIDER", "Gemini");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.ai_provider, AiProvider::Gemini);
    assert_eq!(cfg.text_model, "gemini-1.5-flash");
}

#[test]
fn unknown_provider_is_rejected() {
    let mut map = HashMap::new();
    map.insert("AI_PROVIDER", "llama");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AI_PROVIDER"),
        "expected InvalidEnvVar(AI_PROVIDER), got: {result:?}"
    );
}

#[test]
fn invalid_post_times_are_rejected() {
    let mut map = HashMap::new();
    map.insert("TWEETSMITH_POST_TIMES", "09:00,noon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TWEETSMITH_POST_TIMES"),
        "expected InvalidEnvVar(TWEETSMITH_POST_TIMES), got: {result:?}"
    );
}

#[test]
fn zero_poll_interval_is_rejected() {
    let mut map = HashMap::new();
    map.insert("TWEETSMITH_POLL_INTERVAL_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TWEETSMITH_POLL_INTERVAL_SECS"));
}

#[test]
fn invalid_auto_post_is_rejected() {
    let mut map = HashMap::new();
    map.insert("AUTO_POST", "sometimes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "AUTO_POST"));
}

#[test]
fn max_post_length_override() {
    let mut map = HashMap::new();
    map.insert("TWEETSMITH_MAX_POST_LENGTH", "500");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.max_post_length, 500);
}

#[test]
fn require_text_provider_names_missing_key() {
    let mut map = HashMap::new();
    map.insert("AI_PROVIDER", "gemini");
    map.insert("OPENAI_API_KEY", "sk-unused");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let err = cfg.require_text_provider().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "GEMINI_API_KEY"));
}

#[test]
fn require_publisher_only_when_auto_posting() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.require_publisher().unwrap(), None);

    let mut map = HashMap::new();
    map.insert("AUTO_POST", "true");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let err = cfg.require_publisher().unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "TWITTER_ACCESS_TOKEN"));

    map.insert("TWITTER_ACCESS_TOKEN", "user-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.require_publisher().unwrap(), Some("user-token"));
}

#[test]
fn require_reader_falls_back_to_access_token() {
    let mut map = HashMap::new();
    map.insert("TWITTER_ACCESS_TOKEN", "user-token");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.require_reader().unwrap(), "user-token");
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-very-secret");
    map.insert("TWITTER_ACCESS_TOKEN", "tw-very-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("very-secret"), "secrets leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}
