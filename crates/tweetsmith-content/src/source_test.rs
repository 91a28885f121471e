use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;

/// Provider replaying a fixed script; `None` entries fail.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedProvider {
    fn new(replies: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, ContentError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        match self.replies.lock().unwrap().pop_front().flatten() {
            Some(reply) => Ok(reply),
            None => Err(ContentError::EmptyResponse("scripted".to_string())),
        }
    }
}

fn source(provider: Arc<ScriptedProvider>) -> ContentSource {
    ContentSource::new(provider, ContentProfile::default())
}

#[tokio::test]
async fn quote_is_trimmed_and_unquoted() {
    let provider = ScriptedProvider::new(&[Some("  \"Doubt is the seed of wisdom. #Wisdom\"\n")]);
    let text = source(provider).generate(ContentKind::Quote).await;
    assert_eq!(text, "Doubt is the seed of wisdom. #Wisdom");
}

#[tokio::test]
async fn long_story_is_truncated_keeping_hashtags() {
    let body = "Once upon a time a lighthouse keeper taught the fog to sing. ".repeat(8);
    let reply = format!("{body}#TinyTales #Fantasy");
    let provider = ScriptedProvider::new(&[Some(reply.as_str())]);
    let text = source(provider).generate(ContentKind::Story).await;
    assert!(text.chars().count() <= 280, "{text}");
    assert!(text.ends_with(" #TinyTales #Fantasy"), "{text}");
}

#[tokio::test]
async fn provider_failure_falls_back_to_built_in_quote() {
    let provider = ScriptedProvider::new(&[None]);
    let text = source(provider).generate(ContentKind::Quote).await;
    assert!(FALLBACK_QUOTES.contains(&text.as_str()), "{text}");
}

#[tokio::test]
async fn empty_reply_falls_back() {
    let provider = ScriptedProvider::new(&[Some("\"\"")]);
    let text = source(provider).generate(ContentKind::Story).await;
    assert!(FALLBACK_STORIES.contains(&text.as_str()), "{text}");
}

#[tokio::test]
async fn profile_override_replaces_built_in_fallbacks() {
    let mut profile = ContentProfile::default();
    profile.fallbacks.quotes = vec!["Only this one. #Custom".to_string()];
    let content = ContentSource::new(ScriptedProvider::new(&[None]), profile);
    assert_eq!(content.generate(ContentKind::Quote).await, "Only this one. #Custom");
}

#[tokio::test]
async fn batch_isolates_failures() {
    let provider = ScriptedProvider::new(&[Some("First quote. #One"), None, Some("Third quote. #Three")]);
    let posts = source(provider).generate_batch(ContentKind::Quote, 3).await;
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0], "First quote. #One");
    assert!(FALLBACK_QUOTES.contains(&posts[1].as_str()), "{}", posts[1]);
    assert_eq!(posts[2], "Third quote. #Three");
}

#[tokio::test]
async fn prediction_without_market_uses_manual_list() {
    let provider = ScriptedProvider::new(&[]);
    let text = source(Arc::clone(&provider)).generate(ContentKind::Prediction).await;
    assert!(text.ends_with("#Crypto #Prediction"), "{text}");
    assert!(provider.prompts().is_empty(), "predictions must not call the text provider");
}

#[tokio::test]
async fn meme_kind_posts_reply_text() {
    let reply = "```json\n{\"meme_type\":\"irony\",\"text_top\":\"A\",\"text_bottom\":\"B\",\
                 \"description\":\"\",\"reply_text\":\"Plot twist #Irony\"}\n```";
    let provider = ScriptedProvider::new(&[Some(reply)]);
    assert_eq!(source(provider).generate(ContentKind::Meme).await, "Plot twist #Irony");
}

#[tokio::test]
async fn unparseable_meme_falls_back_to_built_in_concept() {
    let provider = ScriptedProvider::new(&[Some("no json here")]);
    let concept = source(provider).meme_concept(None).await;
    assert!(fallback_memes().contains(&concept));
}

#[tokio::test]
async fn story_prompt_uses_profile_topic() {
    let mut profile = ContentProfile::default();
    profile.story_topics = vec!["a lighthouse that hums".to_string()];
    let provider = ScriptedProvider::new(&[Some("Short tale. #Story")]);
    let content = ContentSource::new(Arc::clone(&provider) as Arc<dyn TextProvider>, profile);
    content.generate(ContentKind::Story).await;
    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("a lighthouse that hums"));
    assert!(prompts[0].user.contains("Maximum 280 characters"));
}

#[test]
fn strips_only_matching_wrapping_quotes() {
    assert_eq!(strip_wrapping_quotes("\"quoted\""), "quoted");
    assert_eq!(strip_wrapping_quotes("“curly”"), "curly");
    assert_eq!(strip_wrapping_quotes("\"unbalanced"), "\"unbalanced");
}
