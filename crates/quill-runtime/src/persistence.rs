#![forbid(unsafe_code)]

//! Durable key-value storage for autosave and recovery.
//!
//! The editor persists exactly one thing: the latest document snapshot,
//! under a fixed key. [`StorageBackend`] is the seam; two backends ship:
//!
//! - [`MemoryStorage`]: a map in memory, with an optional byte quota so
//!   hosts and tests can model a full store.
//! - [`FileStorage`]: a versioned JSON file holding a key → value map.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "last_saved": "2026-02-24T02:30:00Z",
//!   "entries": {
//!     "autosavedContent": "<p>Hello</p>"
//!   }
//! }
//! ```
//!
//! # Atomic Writes
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a crash mid-write leaves the previous file intact.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use quill_core::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current file format version.
pub const FORMAT_VERSION: u64 = 1;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage quota exceeded: {needed} bytes needed, {quota} available")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("unsupported storage format version: {found} (expected {})", FORMAT_VERSION)]
    UnsupportedVersion { found: u64 },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Why a persisted document could not be recovered.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("no saved document under `{key}`")]
    Missing { key: String },
    #[error("saved document under `{key}` is empty")]
    Empty { key: String },
    #[error("saved document under `{key}` could not be read: {source}")]
    Unreadable {
        key: String,
        #[source]
        source: StorageError,
    },
}

/// Key-value storage used for autosave.
///
/// Methods take `&self`; backends synchronize internally so one store can
/// be shared between the editor session and the host.
pub trait StorageBackend: Send + Sync {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    /// Value stored under `key`, or `None` if absent.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn clear(&self, key: &str) -> StorageResult<()>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key)
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).save(key, value)
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        (**self).clear(key)
    }
}

/// Load the document saved under `key`.
///
/// Absent, blank, and unreadable values are all reported as
/// [`RestoreError`]; callers fall back to a placeholder document.
pub fn recover(storage: &dyn StorageBackend, key: &str) -> Result<Snapshot, RestoreError> {
    match storage.load(key) {
        Ok(Some(content)) if content.trim().is_empty() => Err(RestoreError::Empty {
            key: key.to_string(),
        }),
        Ok(Some(content)) => Ok(Snapshot::from(content)),
        Ok(None) => Err(RestoreError::Missing {
            key: key.to_string(),
        }),
        Err(source) => Err(RestoreError::Unreadable {
            key: key.to_string(),
            source,
        }),
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory storage with an optional total byte quota.
///
/// The quota counts the bytes of every key and value held. A save that
/// would push the total over the quota fails with
/// [`StorageError::QuotaExceeded`] and leaves the store unchanged.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once `bytes` are in use.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::default(),
            quota: Some(bytes),
        }
    }

    /// Pre-populate an entry, bypassing the quota.
    #[must_use]
    pub fn with_entry(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    /// Total bytes of keys and values held.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.lock();
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u64,
    last_saved: String,
    entries: BTreeMap<String, String>,
}

/// JSON-file storage.
///
/// Every operation reads the file fresh, so several handles on the same
/// path see each other's writes. A missing file behaves as an empty store.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles from this handle.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Storage backed by `path`. The parent directory must exist before
    /// the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let file: StorageFile = serde_json::from_str(&contents)?;
        if file.version != FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: file.version,
            });
        }
        Ok(file.entries)
    }

    fn write_entries(&self, entries: BTreeMap<String, String>) -> StorageResult<()> {
        let file = StorageFile {
            version: FORMAT_VERSION,
            last_saved: now_iso8601(),
            entries,
        };
        let json = serde_json::to_string_pretty(&file)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(entries)?;
        tracing::trace!(
            target: "quill.storage",
            path = %self.path.display(),
            key,
            bytes = value.len(),
            "saved entry"
        );
        Ok(())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(entries)
    }
}

/// Current UTC time as `YYYY-MM-DDTHH:MM:SSZ`.
fn now_iso8601() -> String {
    let since_epoch = web_time::SystemTime::now()
        .duration_since(web_time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = since_epoch.as_secs();
    let (year, month, day) = civil_from_days(secs / 86_400);
    let rem = secs % 86_400;
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

/// Days since the Unix epoch to a (year, month, day) civil date.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
