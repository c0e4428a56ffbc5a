//! Recent payload history.
//!
//! [`HistoryStore`] keeps the last [`HISTORY_CAPACITY`] generated payloads,
//! newest first, and mirrors them into a single named slot of a
//! [`HistoryRepository`]. Storage problems never reach the caller: a slot
//! that cannot be read or parsed starts the store empty, and a failed write
//! still updates the in-memory list.
//!
//! The slot holds a JSON array:
//!
//! ```json
//! [{ "id": "3f2a9c1e", "url": "https://example.com", "timestamp": 1760774400000 }]
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::content::Payload;
use crate::error::StorageError;

/// Maximum number of entries kept.
pub const HISTORY_CAPACITY: usize = 10;

/// Name of the persisted slot.
pub const HISTORY_SLOT: &str = "qrHistory";

/// Characters of payload shown in listings.
const LABEL_CHARS: usize = 30;

// ============================================================================
// HistoryEntry
// ============================================================================

/// A past generation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    id: String,
    #[serde(rename = "url")]
    payload: Payload,
    #[serde(rename = "timestamp", with = "chrono::serde::ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(payload: Payload, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            payload,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The payload cut to 30 characters, with `...` when truncated.
    pub fn label(&self) -> String {
        let text = self.payload.as_str();
        match text.char_indices().nth(LABEL_CHARS) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        }
    }
}

/// Current time truncated to the millisecond precision the slot stores.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

// ============================================================================
// HistoryRepository
// ============================================================================

/// Storage for the serialized history slot.
pub trait HistoryRepository {
    /// Returns the slot contents, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replaces the slot contents.
    fn save(&mut self, data: &str) -> Result<(), StorageError>;
}

/// Keeps the slot in memory. Can be told to reject writes.
#[derive(Debug, Default, Clone)]
pub struct MemoryRepository {
    slot: Option<String>,
    reject_writes: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `data` already in the slot.
    pub fn with_slot(data: impl Into<String>) -> Self {
        Self {
            slot: Some(data.into()),
            reject_writes: false,
        }
    }

    /// Makes every following save fail with [`StorageError::QuotaExceeded`].
    pub fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn slot(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl HistoryRepository for MemoryRepository {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.clone())
    }

    fn save(&mut self, data: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::QuotaExceeded);
        }
        self.slot = Some(data.to_string());
        Ok(())
    }
}

/// Keeps the slot as `<dir>/qrHistory.json`.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{HISTORY_SLOT}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryRepository for FileRepository {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&mut self, data: &str) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, data).map_err(io_err)
    }
}

// ============================================================================
// HistoryStore
// ============================================================================

/// Bounded, persisted list of past payloads, newest first.
#[derive(Debug)]
pub struct HistoryStore<R: HistoryRepository> {
    repository: R,
    entries: Vec<HistoryEntry>,
}

impl<R: HistoryRepository> HistoryStore<R> {
    /// Opens the store, loading whatever the repository holds.
    ///
    /// Unreadable or malformed data is logged and ignored.
    pub fn open(repository: R) -> Self {
        let entries = match repository.load() {
            Ok(Some(data)) => match serde_json::from_str::<Vec<HistoryEntry>>(&data) {
                Ok(mut entries) => {
                    entries.truncate(HISTORY_CAPACITY);
                    debug!(count = entries.len(), "loaded history");
                    entries
                }
                Err(err) => {
                    error!(error = %err, "failed to parse history, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to load history, starting empty");
                Vec::new()
            }
        };

        Self { repository, entries }
    }

    /// Records `payload` as the newest entry and persists the list.
    ///
    /// The oldest entry is evicted when the store is full. A failed write is
    /// logged; the entry is kept in memory regardless.
    pub fn append(&mut self, payload: Payload) -> HistoryEntry {
        let entry = HistoryEntry::new(payload, now_millis());
        self.entries.insert(0, entry.clone());
        self.entries.truncate(HISTORY_CAPACITY);

        if let Err(err) = self.persist() {
            warn!(error = %err, "failed to persist history");
        }
        entry
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let data = serde_json::to_string(&self.entries)?;
        self.repository.save(&data)
    }

    /// Entries, newest first.
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns the entry's payload for reuse. Style is not part of history.
    pub fn restore(&self, entry: &HistoryEntry) -> Payload {
        entry.payload.clone()
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repository
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_returns_newest_first() {
        let mut store = HistoryStore::open(MemoryRepository::new());
        let first = store.append("a".into());
        let second = store.append("b".into());

        assert_eq!(store.list(), &[second.clone(), first.clone()]);
        assert_ne!(first.id(), second.id());
        assert!(second.created_at() >= first.created_at());
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut store = HistoryStore::open(MemoryRepository::new());
        for i in 0..15 {
            store.append(Payload::new(format!("payload-{i}")));
        }

        assert_eq!(store.len(), HISTORY_CAPACITY);
        let payloads: Vec<_> = store.list().iter().map(|e| e.payload().as_str()).collect();
        let expected: Vec<String> = (5..15).rev().map(|i| format!("payload-{i}")).collect();
        assert_eq!(payloads, expected);
    }

    #[test]
    fn persisted_sequence_round_trips() {
        let mut store = HistoryStore::open(MemoryRepository::new());
        for i in 0..12 {
            store.append(Payload::new(format!("https://example.com/{i}")));
        }
        let saved = store.list().to_vec();

        let reopened = HistoryStore::open(store.repository().clone());
        assert_eq!(reopened.list(), saved.as_slice());
    }

    #[test]
    fn slot_uses_original_field_names() {
        let mut store = HistoryStore::open(MemoryRepository::new());
        let entry = store.append("https://example.com".into());

        let json: serde_json::Value = serde_json::from_str(store.repository().slot().unwrap()).unwrap();
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["id"], entry.id());
        assert_eq!(first["url"], "https://example.com");
        assert_eq!(first["timestamp"], entry.created_at().timestamp_millis());
    }

    #[test]
    fn loads_existing_slot() {
        let repo = MemoryRepository::with_slot(
            r#"[{"id":"abc1234","url":"https://a.example","timestamp":1700000000000}]"#,
        );
        let store = HistoryStore::open(repo);

        assert_eq!(store.len(), 1);
        let entry = store.get("abc1234").unwrap();
        assert_eq!(entry.payload().as_str(), "https://a.example");
        assert_eq!(entry.created_at().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(store.restore(entry).as_str(), "https://a.example");
    }

    #[test]
    fn malformed_slot_starts_empty() {
        let store = HistoryStore::open(MemoryRepository::with_slot("{not json"));
        assert!(store.is_empty());
    }

    #[test]
    fn failed_write_keeps_memory_updated() {
        let mut repo = MemoryRepository::new();
        repo.reject_writes(true);
        let mut store = HistoryStore::open(repo);

        let entry = store.append("kept".into());
        assert_eq!(store.list(), &[entry]);
        assert!(store.repository().slot().is_none());

        // Later writes succeed again and carry everything
        store.repository_mut().reject_writes(false);
        store.append("next".into());
        let reopened = HistoryStore::open(store.repository().clone());
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn file_repository_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRepository::new(dir.path().join("nested"));
        assert!(repo.load().unwrap().is_none());

        let mut store = HistoryStore::open(repo);
        store.append("https://example.com".into());
        assert!(store.repository().path().ends_with("qrHistory.json"));

        let reopened = HistoryStore::open(FileRepository::new(dir.path().join("nested")));
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn file_repository_with_garbage_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("qrHistory.json"), "[{]").unwrap();
        assert!(HistoryStore::open(FileRepository::new(dir.path())).is_empty());
    }

    #[test]
    fn file_repository_reports_unreadable_slot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("qrHistory.json")).unwrap();

        let repo = FileRepository::new(dir.path());
        assert!(matches!(repo.load(), Err(StorageError::Io { .. })));
        assert!(HistoryStore::open(repo).is_empty());
    }

    #[test]
    fn label_truncates_long_payloads() {
        let short = HistoryEntry::new("https://example.com".into(), now_millis());
        assert_eq!(short.label(), "https://example.com");

        let long = HistoryEntry::new(Payload::new("x".repeat(40)), now_millis());
        assert_eq!(long.label(), format!("{}...", "x".repeat(30)));
    }
}
