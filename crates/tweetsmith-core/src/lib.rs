//! Shared configuration, domain types and text utilities for tweetsmith.
//!
//! Everything here is synchronous and free of network access: environment
//! parsing, the YAML content profile, schedule/slot types, and the thread
//! splitter that breaks long posts into numbered fragments.

pub mod app_config;
pub mod config;
pub mod hashtags;
pub mod profile;
pub mod thread;
pub mod types;

use thiserror::Error;

pub use app_config::{AiProvider, AppConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use hashtags::{split_trailing_hashtags, strip_hashtags, truncate_preserving_hashtags};
pub use profile::{load_profile, ContentProfile};
pub use thread::{split_into_thread, NUMBERING_RESERVE};
pub use types::{ContentKind, ScheduleTable, TimeOfDay, TimeSlot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read profile file {path}: {source}")]
    ProfileFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse profile file: {0}")]
    ProfileFileParse(#[from] serde_yaml::Error),

    #[error("profile validation failed: {0}")]
    Validation(String),
}
