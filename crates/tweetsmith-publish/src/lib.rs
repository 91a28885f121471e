//! Publishing for tweetsmith: the [`Publisher`] seam, the X API client and a
//! dry-run publisher.

pub mod dry_run;
pub mod error;
pub mod publisher;
pub mod x;

pub use dry_run::DryRunPublisher;
pub use error::PublishError;
pub use publisher::{PostId, PostUnit, Publisher};
pub use x::{AccountInfo, TweetInfo, XClient, MAX_IMAGE_BYTES};
