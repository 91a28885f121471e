//! Generate, illustrate, split, publish and record one post.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDateTime;
use tweetsmith_content::{ContentSource, ImageProvider, MemeConcept, MemeRenderer, TweetContext};
use tweetsmith_core::{split_into_thread, ContentKind};
use tweetsmith_publish::{PostId, Publisher};
use tweetsmith_store::{PostRecord, PostStore};

/// Text and image ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub kind: ContentKind,
    pub text: String,
    pub image: Option<PathBuf>,
}

/// A draft and the ids of the fragments that went out.
#[derive(Debug)]
pub struct Published {
    pub draft: Draft,
    pub fragments: usize,
    pub ids: Vec<PostId>,
}

pub struct Pipeline {
    content: ContentSource,
    /// Tried in order; the first image that renders wins.
    images: Vec<Arc<dyn ImageProvider>>,
    memes: MemeRenderer,
    publisher: Arc<dyn Publisher>,
    store: Arc<PostStore>,
    max_post_length: usize,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        content: ContentSource,
        images: Vec<Arc<dyn ImageProvider>>,
        memes: MemeRenderer,
        publisher: Arc<dyn Publisher>,
        store: Arc<PostStore>,
        max_post_length: usize,
    ) -> Self {
        Self {
            content,
            images,
            memes,
            publisher,
            store,
            max_post_length,
        }
    }

    #[must_use]
    pub fn store(&self) -> &PostStore {
        &self.store
    }

    /// Generate text and an image for `kind`. Never fails: text falls back
    /// and a post without an image is still a valid draft.
    pub async fn prepare(&self, kind: ContentKind) -> Draft {
        if kind == ContentKind::Meme {
            let concept = self.content.meme_concept(None).await;
            let image = self.render_meme(&concept, "meme");
            return Draft {
                kind,
                text: concept.reply_text,
                image,
            };
        }

        let text = self.content.generate(kind).await;
        self.illustrate(kind, text).await
    }

    /// Generate `count` drafts up front, the way a daily batch is prepared
    /// before anything is posted.
    pub async fn prepare_batch(&self, kind: ContentKind, count: usize) -> Vec<Draft> {
        let mut drafts = Vec::with_capacity(count);
        if kind == ContentKind::Meme {
            for _ in 0..count {
                drafts.push(self.prepare(kind).await);
            }
            return drafts;
        }
        for text in self.content.generate_batch(kind, count).await {
            drafts.push(self.illustrate(kind, text).await);
        }
        drafts
    }

    async fn illustrate(&self, kind: ContentKind, text: String) -> Draft {
        let image = self.render_image(&text, kind.as_str()).await;
        Draft { kind, text, image }
    }

    /// A meme reply to `tweet`, illustrated as `meme_reply_<tweet_id>_*.png`.
    pub async fn prepare_meme_reply(&self, tweet_id: &str, tweet: &TweetContext) -> (MemeConcept, Draft) {
        let concept = self.content.meme_concept(Some(tweet)).await;
        let image = self.render_meme(&concept, &format!("meme_reply_{tweet_id}"));
        let draft = Draft {
            kind: ContentKind::Meme,
            text: concept.reply_text.clone(),
            image,
        };
        (concept, draft)
    }

    /// Publish `draft` and record it in the history as posted at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if no fragment could be published. A failure to
    /// write the history is logged, not returned: the post is already out.
    pub async fn publish(&self, draft: Draft, now: NaiveDateTime) -> anyhow::Result<Published> {
        let published = self.send(draft, None).await?;

        let record = PostRecord::new(&published.draft.text, published.draft.image.as_deref(), now);
        if let Err(e) = self.store.record_at(record, now) {
            tracing::error!(
                path = %self.store.path().display(),
                error = %e,
                "pipeline: post published but history write failed"
            );
        }
        Ok(published)
    }

    /// Publish `draft` as a reply to `tweet_id` without touching the history.
    ///
    /// # Errors
    ///
    /// Returns an error if no fragment could be published.
    pub async fn reply(&self, draft: Draft, tweet_id: &str) -> anyhow::Result<Published> {
        self.send(draft, Some(tweet_id)).await
    }

    async fn send(&self, draft: Draft, reply_to: Option<&str>) -> anyhow::Result<Published> {
        let fragments = split_into_thread(&draft.text, self.max_post_length);
        let ids = self
            .publisher
            .publish_thread(&fragments, draft.image.as_deref(), reply_to)
            .await;

        if ids.is_empty() {
            anyhow::bail!(
                "{} publisher failed every fragment of the {} post",
                self.publisher.name(),
                draft.kind
            );
        }
        if ids.len() < fragments.len() {
            tracing::warn!(
                published = ids.len(),
                total = fragments.len(),
                "pipeline: thread partially published"
            );
        }
        tracing::info!(
            kind = %draft.kind,
            publisher = self.publisher.name(),
            fragments = fragments.len(),
            first_id = %ids[0],
            "pipeline: published"
        );

        Ok(Published {
            fragments: fragments.len(),
            draft,
            ids,
        })
    }

    async fn render_image(&self, text: &str, prefix: &str) -> Option<PathBuf> {
        for provider in &self.images {
            match provider.render(text, prefix).await {
                Ok(path) => return Some(path),
                Err(e) => tracing::warn!(
                    provider = provider.name(),
                    error = %e,
                    "pipeline: image failed; trying next provider"
                ),
            }
        }
        tracing::warn!("pipeline: no image rendered; posting text only");
        None
    }

    fn render_meme(&self, concept: &MemeConcept, prefix: &str) -> Option<PathBuf> {
        self.memes
            .render(concept, prefix)
            .map_err(|e| tracing::warn!(error = %e, "pipeline: meme card failed; posting text only"))
            .ok()
    }
}

/// Print a draft's fragments as they would be posted.
pub fn print_preview(draft: &Draft, limit: usize) {
    let fragments = split_into_thread(&draft.text, limit);
    println!("--- {} ({} fragment(s)) ---", draft.kind, fragments.len());
    for fragment in &fragments {
        println!("[{} chars] {fragment}", fragment.chars().count());
    }
    if let Some(image) = draft.image.as_deref().map(Path::display) {
        println!("image: {image}");
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
