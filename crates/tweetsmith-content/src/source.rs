//! Turns a [`ContentKind`] into finished post text: prompt, provider call,
//! post-processing and fallback.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use tweetsmith_core::{truncate_preserving_hashtags, ContentKind, ContentProfile};

use crate::crypto::{manual_prediction, CryptoPredictor};
use crate::error::ContentError;
use crate::meme::{fallback_memes, meme_prompt, parse_meme_concept, MemeConcept, TweetContext};
use crate::provider::{Prompt, TextProvider};

const FALLBACK_QUOTES: &[&str] = &[
    "Strength isn't knowing everything; it's knowing when you don't know enough. #IgnorantStrength #Wisdom #Growth",
    "The wisest person admits their ignorance and grows from it. #Humility #Learning #Strength",
    "True power comes from embracing what you don't understand. #IgnorantStrength #Mindset #Growth",
    "In uncertainty, we find our greatest opportunities for growth. #Uncertainty #Strength #Learning",
    "The courage to say 'I don't know' is the beginning of wisdom. #Courage #Wisdom #IgnorantStrength",
];

const FALLBACK_STORIES: &[&str] = &[
    "She opened the old music box. Instead of a ballerina, a tiny dragon emerged, yawned, and asked for coffee. 'Mondays,' it muttered. #TinyTales #Fantasy #MondayMood",
    "The last library on Earth had one visitor daily: a robot learning to read bedtime stories to mechanical children. #SciFi #Hope #Books",
    "He found a vending machine selling 'Lost Memories' for $1.50. His childhood summers cost extra. #Memory #Mystery #Life",
    "The time traveler's biggest problem wasn't paradoxes. It was remembering which century required which social media platform. #TimeTravel #Comedy #SocialMedia",
    "Every night at 3 AM, the houseplants gossiped about their owners. Tonight, they planned an intervention. #Plants #Humor #Mystery",
];

/// Smallest body kept when truncation preserves hashtags.
fn min_body_chars(kind: ContentKind) -> usize {
    match kind {
        ContentKind::Story => 100,
        ContentKind::Quote | ContentKind::Prediction | ContentKind::Meme => 50,
    }
}

/// Content generator for every [`ContentKind`].
///
/// Generation never fails outright: provider errors are logged and answered
/// with a fallback text for the kind.
pub struct ContentSource {
    provider: Arc<dyn TextProvider>,
    profile: ContentProfile,
    crypto: Option<CryptoPredictor>,
}

impl ContentSource {
    #[must_use]
    pub fn new(provider: Arc<dyn TextProvider>, profile: ContentProfile) -> Self {
        Self {
            provider,
            profile,
            crypto: None,
        }
    }

    /// Use live market data for predictions instead of the manual coin list.
    #[must_use]
    pub fn with_crypto(mut self, crypto: CryptoPredictor) -> Self {
        self.crypto = Some(crypto);
        self
    }

    #[must_use]
    pub fn profile(&self) -> &ContentProfile {
        &self.profile
    }

    /// Generate one post of `kind`, falling back on any failure.
    pub async fn generate(&self, kind: ContentKind) -> String {
        match self.try_generate(kind).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    kind = %kind,
                    provider = self.provider.name(),
                    error = %e,
                    "content: generation failed; using fallback"
                );
                self.fallback(kind)
            }
        }
    }

    /// Generate one post of `kind` without falling back.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the provider (or market API) call fails or
    /// yields nothing usable.
    pub async fn try_generate(&self, kind: ContentKind) -> Result<String, ContentError> {
        let raw = match kind {
            ContentKind::Prediction => match &self.crypto {
                Some(crypto) => crypto.market_prediction().await?,
                None => manual_prediction(),
            },
            ContentKind::Meme => self.try_meme_concept(None).await?.reply_text,
            ContentKind::Quote | ContentKind::Story => {
                let prompt = self.prompt_for(kind);
                self.provider.generate(&prompt).await?
            }
        };

        let text = self.post_process(kind, &raw);
        if text.is_empty() {
            return Err(ContentError::EmptyResponse(self.provider.name().to_string()));
        }
        tracing::info!(kind = %kind, chars = text.chars().count(), "content: generated");
        Ok(text)
    }

    /// Generate `count` posts; each item falls back independently.
    pub async fn generate_batch(&self, kind: ContentKind, count: usize) -> Vec<String> {
        let mut posts = Vec::with_capacity(count);
        for i in 0..count {
            posts.push(self.generate(kind).await);
            tracing::info!(kind = %kind, item = i + 1, count, "content: batch item ready");
        }
        posts
    }

    /// A meme concept for `tweet` (or the profile theme), falling back to a
    /// built-in concept if generation or parsing fails.
    pub async fn meme_concept(&self, tweet: Option<&TweetContext>) -> MemeConcept {
        match self.try_meme_concept(tweet).await {
            Ok(concept) => concept,
            Err(e) => {
                tracing::warn!(error = %e, "content: meme concept failed; using fallback");
                random_fallback_meme()
            }
        }
    }

    async fn try_meme_concept(
        &self,
        tweet: Option<&TweetContext>,
    ) -> Result<MemeConcept, ContentError> {
        let prompt = meme_prompt(tweet, &self.profile);
        let raw = self.provider.generate(&prompt).await?;
        let mut concept = parse_meme_concept(&raw)?;
        concept.reply_text = self.post_process(ContentKind::Meme, &concept.reply_text);
        Ok(concept)
    }

    /// A fallback text for `kind`: profile overrides first, then the
    /// built-in set. Predictions without an override use the manual coin list.
    #[must_use]
    pub fn fallback(&self, kind: ContentKind) -> String {
        let overrides = match kind {
            ContentKind::Quote => &self.profile.fallbacks.quotes,
            ContentKind::Story => &self.profile.fallbacks.stories,
            ContentKind::Prediction => &self.profile.fallbacks.predictions,
            ContentKind::Meme => return random_fallback_meme().reply_text,
        };

        let mut rng = rand::rng();
        if let Some(text) = overrides.choose(&mut rng) {
            return text.clone();
        }
        let built_in = match kind {
            ContentKind::Quote => FALLBACK_QUOTES,
            ContentKind::Story => FALLBACK_STORIES,
            ContentKind::Prediction | ContentKind::Meme => return manual_prediction(),
        };
        built_in
            .choose(&mut rng)
            .map(|s| (*s).to_string())
            .unwrap_or_default()
    }

    /// Prompt for a text kind. Story topics are drawn at random from the profile.
    #[must_use]
    pub fn prompt_for(&self, kind: ContentKind) -> Prompt {
        let p = &self.profile;
        let max = p.max_length(kind);
        let (system, user, max_tokens) = match kind {
            ContentKind::Story => {
                let topic = p
                    .story_topics
                    .choose(&mut rand::rng())
                    .map_or("anything at all", String::as_str)
                    .to_string();
                (
                    "You are a creative storyteller who writes engaging, concise stories that \
                     capture readers' imagination in just a few sentences."
                        .to_string(),
                    format!(
                        "Write a very short, original story about {topic}.\n\n\
                         Requirements:\n\
                         - Maximum {max} characters including hashtags\n\
                         - A complete arc with a satisfying or surprising ending\n\
                         - Include two or three relevant hashtags at the end\n\n\
                         Return only the story text with hashtags, nothing else."
                    ),
                    250,
                )
            }
            ContentKind::Quote | ContentKind::Prediction | ContentKind::Meme => (
                format!(
                    "You are a wise philosopher who creates inspiring quotes about {}.",
                    p.theme
                ),
                format!(
                    "Generate an inspirational quote that embodies the concept of \"{}\".\n\n\
                     Theme description: {}\n\n\
                     Requirements:\n\
                     - Maximum {max} characters\n\
                     - Thought-provoking and inspiring\n\
                     - Original, or inspired by existing wisdom\n\
                     - Include relevant hashtags at the end\n\n\
                     Return only the quote text with hashtags, nothing else.",
                    p.theme,
                    p.description.trim()
                ),
                100,
            ),
        };
        Prompt {
            system,
            user,
            temperature: p.temperature,
            max_tokens,
        }
    }

    /// Trim, strip wrapping quotes, and bound to the kind's max length.
    #[must_use]
    pub fn post_process(&self, kind: ContentKind, raw: &str) -> String {
        let trimmed = strip_wrapping_quotes(raw.trim()).trim();
        truncate_preserving_hashtags(trimmed, self.profile.max_length(kind), min_body_chars(kind))
    }
}

fn random_fallback_meme() -> MemeConcept {
    let mut memes = fallback_memes();
    let index = {
        use rand::Rng;
        rand::rng().random_range(0..memes.len())
    };
    memes.swap_remove(index)
}

fn strip_wrapping_quotes(s: &str) -> &str {
    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\'')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
            return inner;
        }
    }
    s
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
