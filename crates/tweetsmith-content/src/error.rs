use thiserror::Error;

/// Errors returned by the text providers and the market-data client.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Network or TLS failure, or a non-2xx status from the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider answered but produced no usable text.
    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    /// The client was constructed with an unusable setting.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Errors returned by image generation and rendering.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("image API returned no image URL")]
    MissingUrl,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image encoding error: {0}")]
    Encode(#[from] image::ImageError),

    #[error("embedded font could not be loaded: {0}")]
    Font(#[from] ab_glyph::InvalidFont),
}
