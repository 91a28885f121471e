use async_trait::async_trait;

use crate::error::ContentError;

/// One generation request: a system persona plus the user instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A generative text backend.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Generate a completion for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] when the call fails or yields no text.
    async fn generate(&self, prompt: &Prompt) -> Result<String, ContentError>;
}
