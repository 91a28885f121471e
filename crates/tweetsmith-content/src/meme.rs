//! Meme concepts: the strict JSON schema the model is asked for, extraction
//! from fenced replies, and the built-in fallbacks.

use serde::{Deserialize, Serialize};
use tweetsmith_core::ContentProfile;

use crate::error::ContentError;
use crate::provider::Prompt;

/// Visual family of a meme; selects the card colour and marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemeType {
    Reaction,
    Agreement,
    Irony,
    Observation,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeConcept {
    pub meme_type: MemeType,
    pub text_top: String,
    pub text_bottom: String,
    #[serde(default)]
    pub description: String,
    pub reply_text: String,
}

/// The tweet a meme is replying to.
#[derive(Debug, Clone)]
pub struct TweetContext {
    pub text: String,
    pub author: String,
}

/// Parse a model reply into a [`MemeConcept`].
///
/// Accepts bare JSON, JSON inside a ```` ```json ```` (or plain ```` ``` ````)
/// fence, or JSON surrounded by prose.
///
/// # Errors
///
/// Returns [`ContentError::Deserialize`] if no candidate parses, or
/// [`ContentError::EmptyResponse`] if the concept has no reply text.
pub fn parse_meme_concept(raw: &str) -> Result<MemeConcept, ContentError> {
    let raw = raw.trim();
    let mut parsed = serde_json::from_str::<MemeConcept>(raw);
    if parsed.is_err() {
        for candidate in embedded_json(raw) {
            parsed = serde_json::from_str(candidate);
            if parsed.is_ok() {
                break;
            }
        }
    }

    let concept = parsed.map_err(|e| ContentError::Deserialize {
        context: "meme concept".to_string(),
        source: e,
    })?;
    if concept.reply_text.trim().is_empty() {
        return Err(ContentError::EmptyResponse("meme reply_text".to_string()));
    }
    Ok(concept)
}

fn embedded_json(raw: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    if let Some(fenced) = fenced_block(raw, "```json").or_else(|| fenced_block(raw, "```")) {
        candidates.push(fenced);
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            candidates.push(&raw[start..=end]);
        }
    }
    candidates
}

fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Prompt asking for a meme concept, either in reply to `tweet` or as a
/// standalone post on the profile theme.
#[must_use]
pub fn meme_prompt(tweet: Option<&TweetContext>, profile: &ContentProfile) -> Prompt {
    let subject = match tweet {
        Some(t) => format!(
            "Analyze this tweet and create a funny, ironic, or witty meme response concept:\n\n\
             Tweet: \"{}\"\nAuthor: @{}\n\n\
             The meme should relate to the tweet's meaning and either support or playfully \
             contrast it.",
            t.text, t.author
        ),
        None => format!(
            "Create a funny, ironic, or witty meme concept about \"{}\".\n\nContext: {}",
            profile.theme,
            profile.description.trim()
        ),
    };

    let user = format!(
        "{subject}\n\n\
         Keep it humorous, relatable and appropriate for social media (nothing offensive).\n\n\
         Return only JSON of this shape:\n\
         {{\n\
           \"meme_type\": \"reaction|agreement|irony|observation\",\n\
           \"text_top\": \"short, punchy top text\",\n\
           \"text_bottom\": \"punchline\",\n\
           \"description\": \"visual concept\",\n\
           \"reply_text\": \"accompanying post text with hashtags, max {} chars\"\n\
         }}",
        profile.limits.meme.min(240)
    );

    Prompt {
        system: "You are a witty meme creator who writes clever, funny responses. \
                 Always respond with valid JSON."
            .to_string(),
        user,
        temperature: profile.temperature,
        max_tokens: 300,
    }
}

/// Built-in concepts used when generation or parsing fails.
#[must_use]
pub fn fallback_memes() -> Vec<MemeConcept> {
    vec![
        MemeConcept {
            meme_type: MemeType::Reaction,
            text_top: "ME READING THIS TWEET".to_string(),
            text_bottom: "INTERESTING...".to_string(),
            description: "Thoughtful reaction face".to_string(),
            reply_text: "This tweet hits different 🤔 #Thoughts #Twitter".to_string(),
        },
        MemeConcept {
            meme_type: MemeType::Agreement,
            text_top: "EVERYONE NEEDS TO SEE".to_string(),
            text_bottom: "THIS TWEET".to_string(),
            description: "Pointing gesture".to_string(),
            reply_text: "Facts! 💯 Everyone needs to see this #Truth".to_string(),
        },
        MemeConcept {
            meme_type: MemeType::Observation,
            text_top: "WHEN SOMEONE DROPS".to_string(),
            text_bottom: "PURE WISDOM ON TWITTER".to_string(),
            description: "Mind blown reaction".to_string(),
            reply_text: "Mind = blown 🤯 This is pure wisdom right here #Wisdom".to_string(),
        },
    ]
}
