use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tweetsmith_core::TimeSlot;

use crate::{PostRecord, StoreError};

/// Records older than this are dropped on every write.
pub const RETENTION_DAYS: u32 = 30;

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    posts: Vec<PostRecord>,
}

/// JSON-file post history.
///
/// Reads fail open: a missing, unreadable or corrupt file is treated as empty
/// history. Access within the process is serialized through an internal lock.
#[derive(Debug)]
pub struct PostStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl PostStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, pruning against the current local time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the updated history cannot be written.
    pub fn record(&self, record: PostRecord) -> Result<(), StoreError> {
        self.record_at(record, Local::now().naive_local())
    }

    /// Append `record`, dropping entries posted more than
    /// [`RETENTION_DAYS`] before `now`, and persist atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the updated history cannot be written.
    pub fn record_at(&self, record: PostRecord, now: NaiveDateTime) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut posts = match self.read() {
            Ok(posts) => posts,
            Err(StoreError::Parse { path, source }) => {
                tracing::warn!(path = %path, error = %source, "store: history is corrupt; starting fresh");
                self.quarantine();
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "store: history unreadable; starting fresh");
                Vec::new()
            }
        };

        let cutoff = cutoff(now, RETENTION_DAYS);
        let before = posts.len();
        posts.retain(|p| within(p, cutoff));
        let pruned = before - posts.len();

        tracing::info!(
            date = %record.date,
            slot = %record.slot(),
            pruned,
            "store: recording post"
        );
        posts.push(record);
        self.write(&HistoryFile { posts })
    }

    /// Whether a post already exists for the date and slot containing `now`.
    #[must_use]
    pub fn already_posted_in_current_slot(&self, now: NaiveDateTime) -> bool {
        let date = now.date();
        let slot = TimeSlot::of(&now);
        self.load()
            .iter()
            .any(|p| p.date == date && p.slot() == slot)
    }

    /// Records posted within the last `days` days, newest first.
    #[must_use]
    pub fn history(&self, days: u32) -> Vec<PostRecord> {
        self.history_at(days, Local::now().naive_local())
    }

    /// A window reaching past the earliest representable date covers every record.
    #[must_use]
    pub fn history_at(&self, days: u32, now: NaiveDateTime) -> Vec<PostRecord> {
        let cutoff = cutoff(now, days);
        let mut posts: Vec<PostRecord> = self
            .load()
            .into_iter()
            .filter(|p| within(p, cutoff))
            .collect();
        posts.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        posts
    }

    fn load(&self) -> Vec<PostRecord> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "store: treating history as empty");
            Vec::new()
        })
    }

    fn read(&self) -> Result<Vec<PostRecord>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };
        let file: HistoryFile =
            serde_json::from_str(&content).map_err(|e| StoreError::Parse {
                path: self.path.display().to_string(),
                source: e,
            })?;
        Ok(file.posts)
    }

    fn write(&self, file: &HistoryFile) -> Result<(), StoreError> {
        let io_err = |path: &Path, source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let json = serde_json::to_string_pretty(file).map_err(StoreError::Serialize)?;
        let tmp = sibling(&self.path, "tmp");
        std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))
    }

    /// Move a corrupt history file to `<file>.corrupt` so it is not overwritten.
    fn quarantine(&self) {
        let target = sibling(&self.path, "corrupt");
        match std::fs::rename(&self.path, &target) {
            Ok(()) => tracing::warn!(path = %target.display(), "store: corrupt history moved aside"),
            Err(e) => tracing::warn!(error = %e, "store: failed to move corrupt history aside"),
        }
    }
}

/// `days` before `now`, or `None` when that predates chrono's range.
fn cutoff(now: NaiveDateTime, days: u32) -> Option<NaiveDateTime> {
    TimeDelta::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window))
}

/// Strictly after the cutoff; no cutoff keeps everything.
fn within(record: &PostRecord, cutoff: Option<NaiveDateTime>) -> bool {
    cutoff.is_none_or(|cutoff| record.posted_at > cutoff)
}

/// `<path>.<suffix>`, keeping the original extension.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
