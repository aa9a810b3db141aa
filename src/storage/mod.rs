//! Storage abstractions for the notification history.
//!
//! ## State File
//!
//! ```text
//! {dir}/
//! ├── notified.json                          # Every announced chapter
//! └── notified.json.corrupt-20250101T120000  # Unparsable copies, one per incident
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Candidate, NotifiedRecord, SeenSet};

// Re-export for convenience
pub use local::LocalStorage;

/// On-disk layout of the state file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// ISO 8601 timestamp of last write
    pub updated_at: DateTime<Utc>,
    /// Record count, for people reading the file
    pub count: usize,
    /// Records in the order they were announced
    pub records: Vec<NotifiedRecord>,
}

impl StateFile {
    pub fn new(seen: &SeenSet) -> Self {
        Self {
            updated_at: Utc::now(),
            count: seen.len(),
            records: seen.records().to_vec(),
        }
    }
}

/// Trait for notification history backends.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Read the history. A store that has never been written is empty.
    ///
    /// Unparsable content is `CorruptState`; failing to read at all is
    /// `Persistence`.
    async fn load(&self) -> Result<SeenSet>;

    /// Replace the stored history with `seen`.
    async fn save(&self, seen: &SeenSet) -> Result<()>;

    /// Move unreadable state aside so it is not lost on the next save.
    async fn quarantine(&self) -> Result<()> {
        Ok(())
    }

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Add one record per new item to the history, stamped with `now`.
pub fn merge(seen: &SeenSet, items: &[Candidate], now: DateTime<Utc>) -> SeenSet {
    seen.merge(items, now)
}
