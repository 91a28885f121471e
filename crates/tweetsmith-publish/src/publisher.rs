use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::PublishError;

/// Identifier assigned to a published post.
pub type PostId = String;

/// One post to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostUnit {
    pub text: String,
    pub image: Option<PathBuf>,
    pub in_reply_to: Option<PostId>,
}

impl PostUnit {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
            in_reply_to: None,
        }
    }
}

/// A destination for finished posts.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Publish one post.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the post was not published.
    async fn publish_single(&self, unit: &PostUnit) -> Result<PostId, PublishError>;

    /// Publish `fragments` as a reply chain, best-effort.
    ///
    /// Only the first fragment carries `image`. Each fragment replies to the
    /// most recent one that succeeded (the first replies to `reply_to`).
    /// Failed fragments are logged and skipped; the ids of the fragments that
    /// were published are returned in order.
    async fn publish_thread(
        &self,
        fragments: &[String],
        image: Option<&Path>,
        reply_to: Option<&str>,
    ) -> Vec<PostId> {
        let total = fragments.len();
        let mut ids = Vec::with_capacity(total);
        let mut parent = reply_to.map(str::to_string);

        for (i, text) in fragments.iter().enumerate() {
            let unit = PostUnit {
                text: text.clone(),
                image: if i == 0 { image.map(Path::to_path_buf) } else { None },
                in_reply_to: parent.clone(),
            };
            match self.publish_single(&unit).await {
                Ok(id) => {
                    tracing::info!(
                        publisher = self.name(),
                        fragment = i + 1,
                        total,
                        id = %id,
                        "publish: fragment posted"
                    );
                    parent = Some(id.clone());
                    ids.push(id);
                }
                Err(e) => {
                    tracing::error!(
                        publisher = self.name(),
                        fragment = i + 1,
                        total,
                        error = %e,
                        "publish: fragment failed; continuing with the rest"
                    );
                }
            }
        }
        ids
    }
}
