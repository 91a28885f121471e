use std::path::Path;

use serde::Deserialize;

use crate::types::ContentKind;
use crate::ConfigError;

/// The account voice: what the generated posts are about and how they look.
///
/// Every field has a built-in default, so a partial YAML file only needs to
/// name what it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentProfile {
    pub theme: String,
    pub description: String,
    pub image_style: String,
    pub temperature: f32,
    pub limits: KindLimits,
    pub story_topics: Vec<String>,
    pub fallbacks: FallbackOverrides,
}

/// Maximum generated length per content kind, in characters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KindLimits {
    pub quote: usize,
    pub story: usize,
    pub prediction: usize,
    pub meme: usize,
}

/// Replacement fallback texts. An empty list keeps the built-in set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FallbackOverrides {
    pub quotes: Vec<String>,
    pub stories: Vec<String>,
    pub predictions: Vec<String>,
}

impl Default for ContentProfile {
    fn default() -> Self {
        Self {
            theme: "ignorant strength".to_string(),
            description: "Finding power in not knowing everything: embracing uncertainty, \
                          learning from failure, and drawing strength from humility."
                .to_string(),
            image_style: "minimalist, inspirational".to_string(),
            temperature: 0.8,
            limits: KindLimits::default(),
            story_topics: [
                "an unexpected friendship",
                "a small act of courage",
                "a machine that learns to dream",
                "a door that was never there before",
                "the last day of summer",
                "a letter delivered fifty years late",
                "a city where nobody sleeps",
                "a misunderstood monster",
            ]
            .iter()
            .map(|t| (*t).to_string())
            .collect(),
            fallbacks: FallbackOverrides::default(),
        }
    }
}

impl Default for KindLimits {
    fn default() -> Self {
        Self {
            quote: 200,
            story: 280,
            prediction: 280,
            meme: 280,
        }
    }
}

impl ContentProfile {
    #[must_use]
    pub fn max_length(&self, kind: ContentKind) -> usize {
        match kind {
            ContentKind::Quote => self.limits.quote,
            ContentKind::Story => self.limits.story,
            ContentKind::Prediction => self.limits.prediction,
            ContentKind::Meme => self.limits.meme,
        }
    }
}

/// Load the content profile from `path`.
///
/// A missing file is not an error: the built-in profile is returned.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file exists but cannot be read, is not
/// valid YAML, or fails validation.
pub fn load_profile(path: &Path) -> Result<ContentProfile, ConfigError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "profile file not found; using built-in profile");
        return Ok(ContentProfile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfileFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let profile: ContentProfile = serde_yaml::from_str(&content)?;

    validate_profile(&profile)?;

    Ok(profile)
}

fn validate_profile(profile: &ContentProfile) -> Result<(), ConfigError> {
    if profile.theme.trim().is_empty() {
        return Err(ConfigError::Validation(
            "theme must be non-empty".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&profile.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature {} is out of range; must be between 0.0 and 2.0",
            profile.temperature
        )));
    }

    for kind in ContentKind::ALL {
        if profile.max_length(kind) < 20 {
            return Err(ConfigError::Validation(format!(
                "max length for {kind} must be at least 20 characters"
            )));
        }
    }

    let overrides = [
        ("quotes", &profile.fallbacks.quotes),
        ("stories", &profile.fallbacks.stories),
        ("predictions", &profile.fallbacks.predictions),
    ];
    for (name, texts) in overrides {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "fallback {name} must not contain empty entries"
            )));
        }
    }

    Ok(())
}
