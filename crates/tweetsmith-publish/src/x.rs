//! X (Twitter) API v2 client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::publisher::{PostId, PostUnit, Publisher};

const DEFAULT_X_BASE_URL: &str = "https://api.x.com";

/// Images above this size are still attempted but usually rejected.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<MediaIds<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTo<'a>>,
}

#[derive(Serialize)]
struct MediaIds<'a> {
    media_ids: &'a [String],
}

#[derive(Serialize)]
struct ReplyTo<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    includes: Option<Includes>,
}

#[derive(Deserialize, Default)]
struct Includes {
    #[serde(default)]
    users: Vec<IncludedUser>,
}

#[derive(Deserialize)]
struct IncludedUser {
    id: String,
    username: String,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
    text: String,
    #[serde(default)]
    author_id: Option<String>,
}

#[derive(Deserialize)]
struct Deleted {
    deleted: bool,
}

#[derive(Deserialize)]
struct UserData {
    id: String,
    name: String,
    username: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    public_metrics: PublicMetrics,
}

#[derive(Deserialize, Default)]
struct PublicMetrics {
    #[serde(default)]
    followers_count: u64,
    #[serde(default)]
    following_count: u64,
    #[serde(default)]
    tweet_count: u64,
}

/// A fetched tweet with its author's handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetInfo {
    pub id: String,
    pub text: String,
    /// `"unknown"` when the API did not expand the author.
    pub author_username: String,
}

/// Profile summary of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: String,
    pub name: String,
    pub username: String,
    pub description: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub tweet_count: u64,
}

/// HTTP client for the X API v2, authenticated with a user-context bearer token.
pub struct XClient {
    client: Client,
    token: String,
    base_url: String,
}

impl XClient {
    /// Creates a client pointed at the production X API.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, PublishError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_X_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Creates a post and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on transport failure, a non-2xx status, or
    /// an unexpected response body.
    pub async fn create_tweet(
        &self,
        text: &str,
        media_ids: &[String],
        in_reply_to: Option<&str>,
    ) -> Result<PostId, PublishError> {
        let body = CreateTweet {
            text,
            media: (!media_ids.is_empty()).then_some(MediaIds { media_ids }),
            reply: in_reply_to.map(|id| ReplyTo {
                in_reply_to_tweet_id: id,
            }),
        };
        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        let created: Envelope<IdOnly> = parse(check(response).await?, "create tweet").await?;
        Ok(created.data.id)
    }

    /// Uploads an image and returns its media id.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Io`] if the file cannot be read, or any
    /// transport/API error from the upload.
    pub async fn upload_media(&self, path: &Path) -> Result<String, PublishError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| PublishError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let size = bytes.len() as u64;
        if size > MAX_IMAGE_BYTES {
            tracing::warn!(
                path = %path.display(),
                size,
                limit = MAX_IMAGE_BYTES,
                "x: image exceeds the upload size limit"
            );
        }

        let file_name = path
            .file_name()
            .map_or_else(|| "image.png".to_string(), |n| n.to_string_lossy().into_owned());
        let form = Form::new()
            .text("media_category", "tweet_image")
            .part("media", Part::bytes(bytes).file_name(file_name).mime_str("image/png")?);

        let response = self
            .client
            .post(format!("{}/2/media/upload", self.base_url))
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;
        let uploaded: Envelope<IdOnly> = parse(check(response).await?, "media upload").await?;
        tracing::debug!(media_id = %uploaded.data.id, size, "x: media uploaded");
        Ok(uploaded.data.id)
    }

    /// Fetches a post with its author's username.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on transport failure, a non-2xx status, or
    /// an unexpected response body.
    pub async fn get_tweet(&self, id: &str) -> Result<TweetInfo, PublishError> {
        let response = self
            .client
            .get(format!("{}/2/tweets/{id}", self.base_url))
            .query(&[("expansions", "author_id"), ("user.fields", "username")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let fetched: Envelope<TweetData> = parse(check(response).await?, "get tweet").await?;

        let users = fetched.includes.unwrap_or_default().users;
        let author_username = fetched
            .data
            .author_id
            .as_deref()
            .and_then(|author| users.iter().find(|u| u.id == author))
            .map_or_else(|| "unknown".to_string(), |u| u.username.clone());

        Ok(TweetInfo {
            id: fetched.data.id,
            text: fetched.data.text,
            author_username,
        })
    }

    /// Deletes a post. Returns whether the API reported it deleted.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on transport failure, a non-2xx status, or
    /// an unexpected response body.
    pub async fn delete_tweet(&self, id: &str) -> Result<bool, PublishError> {
        let response = self
            .client
            .delete(format!("{}/2/tweets/{id}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let deleted: Envelope<Deleted> = parse(check(response).await?, "delete tweet").await?;
        Ok(deleted.data.deleted)
    }

    /// Fetches the authenticated account's profile and counters.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] on transport failure, a non-2xx status, or
    /// an unexpected response body.
    pub async fn account_info(&self) -> Result<AccountInfo, PublishError> {
        let response = self
            .client
            .get(format!("{}/2/users/me", self.base_url))
            .query(&[("user.fields", "public_metrics,description")])
            .bearer_auth(&self.token)
            .send()
            .await?;
        let me: Envelope<UserData> = parse(check(response).await?, "users/me").await?;
        let user = me.data;

        Ok(AccountInfo {
            id: user.id,
            name: user.name,
            username: user.username,
            description: user.description,
            followers_count: user.public_metrics.followers_count,
            following_count: user.public_metrics.following_count,
            tweet_count: user.public_metrics.tweet_count,
        })
    }

    /// Confirms the token is accepted and returns the account's username.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the token is rejected or the request fails.
    pub async fn verify_credentials(&self) -> Result<String, PublishError> {
        let account = self.account_info().await?;
        tracing::info!(username = %account.username, "x: credentials verified");
        Ok(account.username)
    }
}

#[async_trait]
impl Publisher for XClient {
    fn name(&self) -> &'static str {
        "x"
    }

    /// Uploads the image first; if the upload fails the post goes out text-only.
    async fn publish_single(&self, unit: &PostUnit) -> Result<PostId, PublishError> {
        let mut media_ids = Vec::new();
        if let Some(image) = unit.image.as_deref() {
            match self.upload_media(image).await {
                Ok(id) => media_ids.push(id),
                Err(e) => tracing::warn!(
                    path = %image.display(),
                    error = %e,
                    "x: media upload failed; posting without image"
                ),
            }
        }
        self.create_tweet(&unit.text, &media_ids, unit.in_reply_to.as_deref())
            .await
    }
}

async fn check(response: Response) -> Result<Response, PublishError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PublishError::Api {
        status: status.as_u16(),
        body,
    })
}

async fn parse<T: DeserializeOwned>(response: Response, context: &str) -> Result<T, PublishError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| PublishError::Deserialize {
        context: context.to_string(),
        source,
    })
}
