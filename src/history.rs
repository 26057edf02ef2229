//! Generation history: a capped, newest-first JSON log of terminal outcomes.

use crate::error::{ErrorKind, ForgeError};
use crate::progress::{GenerationFailure, GenerationObserver, GenerationSuccess};
use crate::provider::ProviderId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    pub duration_secs: u64,
    pub status: HistoryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    /// Preview image for gallery views
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn from_success(success: &GenerationSuccess) -> Self {
        Self {
            prompt: success.request.prompt().to_string(),
            provider: Some(success.request.provider()),
            duration_secs: success.elapsed.as_secs(),
            status: HistoryStatus::Success,
            asset_url: Some(success.result.asset_url().to_string()),
            thumbnail_url: success.result.thumbnail_url().map(String::from),
            error: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn from_failure(failure: &GenerationFailure) -> Self {
        Self {
            prompt: failure.prompt.clone(),
            provider: failure.provider,
            duration_secs: failure.elapsed.as_secs(),
            status: HistoryStatus::Failed,
            asset_url: None,
            thumbnail_url: None,
            error: Some(failure.message.clone()),
            recorded_at: Utc::now(),
        }
    }
}

/// JSON file of [`HistoryEntry`] values, newest first.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
}

impl HistoryStore {
    pub const DEFAULT_CAPACITY: usize = 50;
    const FILE_NAME: &'static str = "history.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<HistoryEntry>, ForgeError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&raw).map_err(|e| {
            ForgeError::Storage(format!(
                "Failed to parse history {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Prepend `entry`, dropping the oldest entries beyond capacity.
    pub fn record(&self, entry: HistoryEntry) -> Result<(), ForgeError> {
        let mut entries = self.load()?;
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        self.write(&entries)
    }

    pub fn clear(&self) -> Result<(), ForgeError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn write(&self, entries: &[HistoryEntry]) -> Result<(), ForgeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| ForgeError::Storage(format!("Failed to encode history: {}", e)))?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Observer that appends every terminal notification to a [`HistoryStore`].
pub struct HistoryRecorder {
    store: HistoryStore,
    // Serializes the read-modify-write of the file.
    lock: Mutex<()>,
}

impl HistoryRecorder {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    fn append(&self, entry: HistoryEntry) {
        let _held = self.lock.lock();
        if let Err(err) = self.store.record(entry) {
            warn!(path = %self.store.path().display(), "Failed to record history: {}", err);
        }
    }
}

impl GenerationObserver for HistoryRecorder {
    fn on_success(&self, success: &GenerationSuccess) {
        self.append(HistoryEntry::from_success(success));
    }

    fn on_failure(&self, failure: &GenerationFailure) {
        // A rejected duplicate never ran.
        if failure.kind == ErrorKind::AlreadyGenerating {
            debug!(prompt = %failure.prompt, "Not recording rejected duplicate generation");
            return;
        }
        self.append(HistoryEntry::from_failure(failure));
    }
}
