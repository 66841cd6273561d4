//! Recently read documents with their last reading position.
//!
//! The list is stored as one JSON array under [`HISTORY_STORAGE_KEY`] in a
//! key-value store. History is best-effort: storage failures are logged and
//! reported as empty lists or `false`, never propagated into playback.

use crate::document::{ReaderError, ReaderResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use ts_rs::TS;

pub const HISTORY_STORAGE_KEY: &str = "pdf_reader_history";
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReadingProgress {
    pub last_index: usize,
    pub total_sentences: usize,
    pub percent_complete: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryEntry {
    /// Millisecond timestamp of the write that created this entry.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub size_bytes: u64,
    /// Unix milliseconds.
    pub last_played_timestamp: u64,
    pub progress: ReadingProgress,
}

impl HistoryEntry {
    pub fn new(name: impl Into<String>, size_bytes: u64, progress: ReadingProgress) -> Self {
        let now = now_unix_millis();
        Self {
            id: now,
            name: name.into(),
            size_bytes,
            last_played_timestamp: now,
            progress,
        }
    }

    pub fn formatted_size(&self) -> String {
        format_file_size(self.size_bytes)
    }
}

pub(crate) fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Human-readable size in 1024-based units with at most two decimals.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

/// Minimal string key-value storage, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> ReaderResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> ReaderResult<()>;
    fn remove(&mut self, key: &str) -> ReaderResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ReaderResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> ReaderResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> ReaderResult<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One file per key under `root`, named by the SHA-256 of the key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.root.join(format!("{:x}.json", hasher.finalize()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ReaderResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> ReaderResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> ReaderResult<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Newest-first history list, unique by document name.
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), DEFAULT_HISTORY_CAPACITY)
    }

    fn read(&self) -> ReaderResult<Vec<HistoryEntry>> {
        match self.store.get(HISTORY_STORAGE_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&mut self, entries: &[HistoryEntry]) -> ReaderResult<()> {
        let raw = serde_json::to_string(entries)?;
        self.store.set(HISTORY_STORAGE_KEY, &raw)
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        match self.read() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Failed to read reading history: {err}");
                Vec::new()
            }
        }
    }

    /// Insert at the front, replacing any entry with the same name.
    pub fn upsert(&mut self, entry: HistoryEntry) -> bool {
        let mut entries = self.list();
        entries.retain(|existing| existing.name != entry.name);
        debug!(
            name = %entry.name,
            last_index = entry.progress.last_index,
            "Recording reading history"
        );
        entries.insert(0, entry);
        entries.truncate(self.capacity);
        match self.write(&entries) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to save reading history: {err}");
                false
            }
        }
    }

    pub fn delete_at(&mut self, index: usize) -> ReaderResult<HistoryEntry> {
        let mut entries = self.list();
        if index >= entries.len() {
            return Err(ReaderError::InvalidHistoryIndex {
                index,
                len: entries.len(),
            });
        }
        let removed = entries.remove(index);
        if let Err(err) = self.write(&entries) {
            warn!(index, "Failed to delete history entry: {err}");
            return Err(err);
        }
        info!(name = %removed.name, "Deleted history entry");
        Ok(removed)
    }

    pub fn clear(&mut self) -> bool {
        match self.store.remove(HISTORY_STORAGE_KEY) {
            Ok(()) => {
                info!("Cleared reading history");
                true
            }
            Err(err) => {
                warn!("Failed to clear reading history: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> ReaderResult<Option<String>> {
            Err(ReaderError::Storage("storage disabled".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> ReaderResult<()> {
            Err(ReaderError::Storage("quota exceeded".to_string()))
        }

        fn remove(&mut self, _key: &str) -> ReaderResult<()> {
            Err(ReaderError::Storage("storage disabled".to_string()))
        }
    }

    fn entry(name: &str, last_index: usize) -> HistoryEntry {
        HistoryEntry::new(
            name,
            1024,
            ReadingProgress {
                last_index,
                total_sentences: 10,
                percent_complete: (last_index + 1) as f64 * 10.0,
            },
        )
    }

    #[test]
    fn upsert_replaces_existing_name_at_front() {
        let mut history = HistoryStore::in_memory();
        assert!(history.upsert(entry("a.pdf", 0)));
        assert!(history.upsert(entry("b.pdf", 0)));
        assert!(history.upsert(entry("a.pdf", 7)));
        let entries = history.list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.pdf");
        assert_eq!(entries[0].progress.last_index, 7);
        assert_eq!(entries[1].name, "b.pdf");
    }

    #[test]
    fn list_is_capped() {
        let mut history = HistoryStore::in_memory();
        for idx in 0..30 {
            history.upsert(entry(&format!("doc-{idx}.pdf"), idx));
            assert!(history.list().len() <= DEFAULT_HISTORY_CAPACITY);
        }
        let entries = history.list();
        assert_eq!(entries.len(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(entries[0].name, "doc-29.pdf");
    }

    #[test]
    fn delete_and_clear() {
        let mut history = HistoryStore::in_memory();
        history.upsert(entry("a.pdf", 0));
        history.upsert(entry("b.pdf", 0));
        let removed = history.delete_at(1).expect("delete");
        assert_eq!(removed.name, "a.pdf");
        assert!(matches!(
            history.delete_at(5),
            Err(ReaderError::InvalidHistoryIndex { index: 5, len: 1 })
        ));
        assert!(history.clear());
        assert!(history.list().is_empty());
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut history = HistoryStore::new(Box::new(BrokenStore), DEFAULT_HISTORY_CAPACITY);
        assert!(history.list().is_empty());
        assert!(!history.upsert(entry("a.pdf", 0)));
        assert!(!history.clear());
    }

    #[test]
    fn corrupt_history_reads_as_empty() {
        let mut store = MemoryStore::new();
        store
            .set(HISTORY_STORAGE_KEY, "{not json")
            .expect("memory store accepts writes");
        let history = HistoryStore::new(Box::new(store), DEFAULT_HISTORY_CAPACITY);
        assert!(history.list().is_empty());
    }

    #[test]
    fn file_store_round_trips_history() {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!("pdf-narrator-history-{nonce}"));

        let mut history = HistoryStore::new(Box::new(FileStore::new(&root)), 5);
        assert!(history.list().is_empty());
        assert!(history.upsert(entry("report.pdf", 3)));

        let reopened = HistoryStore::new(Box::new(FileStore::new(&root)), 5);
        assert_eq!(reopened.list()[0].name, "report.pdf");
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn formats_sizes_like_a_file_browser() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(2_621_440), "2.5 MB");
    }
}
