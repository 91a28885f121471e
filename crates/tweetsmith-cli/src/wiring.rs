//! Builds providers, publishers and the pipeline from [`AppConfig`].

use std::sync::Arc;

use tweetsmith_content::{
    CardRenderer, CoinGeckoClient, ContentSource, CryptoPredictor, DalleProvider, DalleSettings,
    GeminiClient, ImageProvider, MemeRenderer, OpenAiClient, RetryPolicy, TextProvider,
};
use tweetsmith_core::{load_profile, AiProvider, AppConfig, ConfigError};
use tweetsmith_publish::{DryRunPublisher, Publisher, XClient};
use tweetsmith_store::PostStore;

use crate::pipeline::Pipeline;

fn retry_policy(config: &AppConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: config.max_retries,
        backoff_base_ms: config.retry_backoff_base_ms,
    }
}

pub fn text_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn TextProvider>> {
    let key = config.require_text_provider()?;
    let retry = retry_policy(config);
    let timeout = config.request_timeout_secs;
    let provider: Arc<dyn TextProvider> = match config.ai_provider {
        AiProvider::OpenAi => Arc::new(OpenAiClient::new(key, &config.text_model, timeout, retry)?),
        AiProvider::Gemini => Arc::new(GeminiClient::new(key, &config.text_model, timeout, retry)?),
    };
    tracing::info!(provider = %config.ai_provider, model = %config.text_model, "text provider ready");
    Ok(provider)
}

/// Content source with the configured provider, the profile and live
/// market data for predictions.
pub fn content_source(config: &AppConfig) -> anyhow::Result<ContentSource> {
    let profile = load_profile(&config.profile_path)?;
    let market = CoinGeckoClient::new(config.request_timeout_secs, retry_policy(config))?;
    Ok(ContentSource::new(text_provider(config)?, profile).with_crypto(CryptoPredictor::new(market)))
}

/// OpenAI image generation when an OpenAI key is present, then the local card.
pub fn image_providers(config: &AppConfig, style: &str) -> anyhow::Result<Vec<Arc<dyn ImageProvider>>> {
    let mut providers: Vec<Arc<dyn ImageProvider>> = Vec::new();
    if let Some(key) = config.openai_api_key.as_deref() {
        let settings = DalleSettings {
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            style: style.to_string(),
            output_dir: config.image_dir.clone(),
            timeout_secs: config.request_timeout_secs,
            retry: retry_policy(config),
        };
        providers.push(Arc::new(DalleProvider::new(key, settings)?));
    } else {
        tracing::info!("OPENAI_API_KEY not set; images use the local card renderer");
    }
    providers.push(Arc::new(CardRenderer::new(config.image_dir.clone())));
    Ok(providers)
}

/// The X client when `AUTO_POST` is on (credentials verified), else dry-run.
///
/// # Errors
///
/// Fails when auto-posting is enabled without a token or the token is rejected.
pub async fn publisher(config: &AppConfig) -> anyhow::Result<Arc<dyn Publisher>> {
    match config.require_publisher()? {
        Some(token) => {
            let client = XClient::new(token, config.request_timeout_secs)?;
            client.verify_credentials().await?;
            Ok(Arc::new(client))
        }
        None => {
            tracing::info!("AUTO_POST is off; posts are logged, not published");
            Ok(Arc::new(DryRunPublisher::new()))
        }
    }
}

/// Client for read-only X endpoints.
pub fn reader(config: &AppConfig) -> anyhow::Result<XClient> {
    Ok(XClient::new(config.require_reader()?, config.request_timeout_secs)?)
}

/// Client for account-changing X endpoints, regardless of `AUTO_POST`.
pub fn writer(config: &AppConfig) -> anyhow::Result<XClient> {
    let token = config
        .twitter_access_token
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("TWITTER_ACCESS_TOKEN".to_string()))?;
    Ok(XClient::new(token, config.request_timeout_secs)?)
}

pub fn store(config: &AppConfig) -> Arc<PostStore> {
    Arc::new(PostStore::new(config.history_path.clone()))
}

pub async fn pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let content = content_source(config)?;
    let images = image_providers(config, &content.profile().image_style)?;
    Ok(Pipeline::new(
        content,
        images,
        MemeRenderer::new(config.image_dir.clone()),
        publisher(config).await?,
        store(config),
        config.max_post_length,
    ))
}
