//! Fakes shared by the pipeline and scheduler tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tweetsmith_content::{
    ContentError, ContentSource, ImageError, ImageProvider, MemeRenderer, Prompt, TextProvider,
};
use tweetsmith_core::ContentProfile;
use tweetsmith_publish::{PostId, PostUnit, PublishError, Publisher};
use tweetsmith_store::PostStore;

use crate::pipeline::Pipeline;

/// Answers every prompt with the same reply, or fails when `reply` is `None`.
pub struct FixedProvider {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(reply: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TextProvider for FixedProvider {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, ContentError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.reply
            .clone()
            .ok_or_else(|| ContentError::EmptyResponse("fixed".to_string()))
    }
}

pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn publish_single(&self, _unit: &PostUnit) -> Result<PostId, PublishError> {
        Err(PublishError::Api {
            status: 503,
            body: "over capacity".to_string(),
        })
    }
}

pub struct FailingImage;

#[async_trait]
impl ImageProvider for FailingImage {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn render(&self, _text: &str, _prefix: &str) -> Result<PathBuf, ImageError> {
        Err(ImageError::MissingUrl)
    }
}

pub fn pipeline(
    dir: &Path,
    provider: Arc<FixedProvider>,
    publisher: Arc<dyn Publisher>,
    images: Vec<Arc<dyn ImageProvider>>,
    max_post_length: usize,
) -> (Pipeline, Arc<PostStore>) {
    let store = Arc::new(PostStore::new(dir.join("history.json")));
    let content = ContentSource::new(provider, ContentProfile::default());
    let pipeline = Pipeline::new(
        content,
        images,
        MemeRenderer::new(dir.join("images")),
        publisher,
        Arc::clone(&store),
        max_post_length,
    );
    (pipeline, store)
}
