use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::PublishError;
use crate::publisher::{PostId, PostUnit, Publisher};

/// Publisher that logs posts instead of sending them.
///
/// Ids are synthetic (`dry-run-1`, `dry-run-2`, ...). Every unit is kept so
/// callers can inspect what would have been posted.
#[derive(Default)]
pub struct DryRunPublisher {
    next_id: AtomicU64,
    published: Mutex<Vec<PostUnit>>,
}

impl DryRunPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Units "published" so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<PostUnit> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn publish_single(&self, unit: &PostUnit) -> Result<PostId, PublishError> {
        let id = format!("dry-run-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        tracing::info!(
            id = %id,
            chars = unit.text.chars().count(),
            image = ?unit.image,
            in_reply_to = ?unit.in_reply_to,
            text = %unit.text,
            "dry-run: would post"
        );
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(unit.clone());
        Ok(id)
    }
}
