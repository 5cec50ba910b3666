use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{get_or, put, KeyValueStore};
use crate::study::Mode;

pub const HISTORY_KEY: &str = "studyHistory";
pub const MAX_HISTORY: usize = 10;

/// A remembered successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub topic: String,
    pub mode: Mode,
    pub timestamp: DateTime<Utc>,
}

/// Most-recent-first log of past topics, unique by topic and capped at
/// [`MAX_HISTORY`] entries.
#[derive(Debug)]
pub struct HistoryStore<S: KeyValueStore> {
    store: S,
    entries: Vec<HistoryEntry>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    /// Read the persisted log; absent or malformed data yields an empty log.
    pub fn load(store: S) -> Self {
        let entries: Vec<HistoryEntry> = get_or(&store, HISTORY_KEY, Vec::new());
        Self { store, entries }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record(&mut self, topic: &str, mode: Mode) {
        self.record_at(topic, mode, Utc::now());
    }

    pub(crate) fn record_at(&mut self, topic: &str, mode: Mode, timestamp: DateTime<Utc>) {
        self.entries.retain(|e| e.topic != topic);
        self.entries.insert(
            0,
            HistoryEntry {
                topic: topic.to_string(),
                mode,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HISTORY);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = put(&self.store, HISTORY_KEY, &self.entries) {
            tracing::warn!(error = %e, "failed to persist study history");
        }
    }
}
