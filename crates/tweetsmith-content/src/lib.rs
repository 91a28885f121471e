//! Content generation for tweetsmith: text providers, the per-kind content
//! source, crypto predictions, meme concepts and image providers.

pub mod crypto;
pub mod error;
pub mod gemini;
pub mod image;
pub mod meme;
pub mod openai;
pub mod provider;
pub mod retry;
pub mod source;

pub use crypto::{CoinGeckoClient, CryptoPredictor};
pub use error::{ContentError, ImageError};
pub use gemini::GeminiClient;
pub use image::{image_prompt, CardRenderer, DalleProvider, DalleSettings, ImageProvider, MemeRenderer};
pub use meme::{parse_meme_concept, MemeConcept, MemeType, TweetContext};
pub use openai::OpenAiClient;
pub use provider::{Prompt, TextProvider};
pub use retry::RetryPolicy;
pub use source::ContentSource;
