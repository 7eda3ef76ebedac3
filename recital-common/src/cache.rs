//! Local cache: the persisted fallback for shared client state
//!
//! A small string key/value store kept in memory and mirrored to a JSON file.
//! Every client process reads and writes the same file, so it doubles as the
//! cross-process change channel:
//! - writes made in this process are broadcast to subscribers immediately;
//! - writes made by another process are picked up by `refresh_from_disk`,
//!   which compares the file modification time and broadcasts changed keys.
//!
//! Persistence is best-effort. A failed write keeps the in-memory value and
//! returns the error so the caller can log it.

use crate::error::Result;
use crate::index::ProgramIndex;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use tempfile::NamedTempFile;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Key holding the current program index
pub const CURRENT_PROGRAM_KEY: &str = "currentProgramIndex";

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A key whose value changed (`None` = removed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheChange {
    pub key: String,
    pub value: Option<String>,
}

pub struct LocalCache {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
    modified: Mutex<Option<SystemTime>>,
    tx: broadcast::Sender<CacheChange>,
}

impl LocalCache {
    /// Open (or start) the cache backed by `path`
    ///
    /// A missing file is an empty cache. An unreadable or corrupt file is
    /// logged and treated as empty rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (entries, modified) = match read_entries(&path) {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                (BTreeMap::new(), None)
            }
        };

        Self::build(Some(path), entries, modified)
    }

    /// Cache that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::build(None, BTreeMap::new(), None)
    }

    fn build(
        path: Option<PathBuf>,
        entries: BTreeMap<String, String>,
        modified: Option<SystemTime>,
    ) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path,
            entries: Mutex::new(entries),
            modified: Mutex::new(modified),
            tx,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let changed = {
            let mut entries = lock(&self.entries);
            entries.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        };
        self.after_write(key, Some(value.to_string()), changed)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let changed = lock(&self.entries).remove(key).is_some();
        self.after_write(key, None, changed)
    }

    /// Subscribe to changes (local writes and detected external writes)
    pub fn subscribe(&self) -> broadcast::Receiver<CacheChange> {
        self.tx.subscribe()
    }

    /// Stored current index (absent = sentinel)
    pub fn current_index(&self) -> ProgramIndex {
        ProgramIndex::from_stored(self.get(CURRENT_PROGRAM_KEY))
    }

    /// Store the current index; the sentinel removes the key
    pub fn store_current_index(&self, index: &ProgramIndex) -> Result<()> {
        if index.is_none() {
            self.remove(CURRENT_PROGRAM_KEY)
        } else {
            self.set(CURRENT_PROGRAM_KEY, index.as_str())
        }
    }

    /// Pick up writes made by another process
    ///
    /// Returns the keys whose values changed; each is also broadcast.
    pub fn refresh_from_disk(&self) -> Result<Vec<CacheChange>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };

        let on_disk = modified_time(path);
        if on_disk == *lock(&self.modified) {
            return Ok(Vec::new());
        }

        let (fresh, modified) = read_entries(path)?;
        *lock(&self.modified) = modified;

        let changes = {
            let mut entries = lock(&self.entries);
            let changes = diff(&entries, &fresh);
            *entries = fresh;
            changes
        };

        for change in &changes {
            debug!(key = %change.key, "Cache key changed on disk");
            let _ = self.tx.send(change.clone());
        }
        Ok(changes)
    }

    fn after_write(&self, key: &str, value: Option<String>, changed: bool) -> Result<()> {
        if changed {
            let _ = self.tx.send(CacheChange {
                key: key.to_string(),
                value,
            });
        }
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let body = serde_json::to_vec_pretty(&*lock(&self.entries))?;
        write_atomic(path, &body)?;
        *lock(&self.modified) = modified_time(path);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read_entries(path: &Path) -> Result<(BTreeMap<String, String>, Option<SystemTime>)> {
    if !path.exists() {
        return Ok((BTreeMap::new(), None));
    }
    let modified = modified_time(path);
    let content = fs::read(path)?;
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok((BTreeMap::new(), modified));
    }
    Ok((serde_json::from_slice(&content)?, modified))
}

fn diff(old: &BTreeMap<String, String>, new: &BTreeMap<String, String>) -> Vec<CacheChange> {
    let mut changes: Vec<CacheChange> = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, value)| CacheChange {
            key: key.clone(),
            value: Some(value.clone()),
        })
        .collect();

    changes.extend(
        old.keys()
            .filter(|key| !new.contains_key(*key))
            .map(|key| CacheChange {
                key: key.clone(),
                value: None,
            }),
    );
    changes
}

/// Write a file atomically: temp file in the same directory, then rename
///
/// Readers in other processes see either the old or the new content, never a
/// partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Unique temp name per writer, so concurrent clients never share one.
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_round_trip() {
        let cache = LocalCache::in_memory();
        assert!(cache.current_index().is_none());

        cache.store_current_index(&ProgramIndex::new("4")).unwrap();
        assert_eq!(cache.current_index().as_str(), "4");
        assert_eq!(cache.get(CURRENT_PROGRAM_KEY).as_deref(), Some("4"));

        cache.store_current_index(&ProgramIndex::none()).unwrap();
        assert_eq!(cache.get(CURRENT_PROGRAM_KEY), None);
        assert!(cache.current_index().is_none());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let first = LocalCache::open(&path);
        first.store_current_index(&ProgramIndex::new("2")).unwrap();
        assert!(path.exists());
        let leftovers = fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);

        let second = LocalCache::open(&path);
        assert_eq!(second.current_index().as_str(), "2");
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{not json").unwrap();

        let cache = LocalCache::open(&path);
        assert!(cache.current_index().is_none());
    }

    #[test]
    fn test_local_writes_are_broadcast_once() {
        let cache = LocalCache::in_memory();
        let mut rx = cache.subscribe();

        cache.set(CURRENT_PROGRAM_KEY, "1").unwrap();
        cache.set(CURRENT_PROGRAM_KEY, "1").unwrap();
        cache.remove(CURRENT_PROGRAM_KEY).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            CacheChange {
                key: CURRENT_PROGRAM_KEY.into(),
                value: Some("1".into())
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            CacheChange {
                key: CURRENT_PROGRAM_KEY.into(),
                value: None
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_refresh_detects_external_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let display = LocalCache::open(&path);
        let mut rx = display.subscribe();
        assert!(display.refresh_from_disk().unwrap().is_empty());

        // Another process writes the file.
        write_atomic(&path, br#"{"currentProgramIndex": "5"}"#).unwrap();

        let changes = display.refresh_from_disk().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(display.current_index().as_str(), "5");
        assert_eq!(rx.try_recv().unwrap().value.as_deref(), Some("5"));

        // Unchanged file: nothing to report.
        assert!(display.refresh_from_disk().unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_writers_never_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let writers: Vec<_> = (0..4)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let write = |i: usize| {
                        let body = json!({ CURRENT_PROGRAM_KEY: format!("{}-{}", writer, i) });
                        write_atomic(&path, body.to_string().as_bytes())
                    };
                    (0..200).filter(|i| write(*i).is_err()).count()
                })
            })
            .collect();

        let failures: usize = writers.into_iter().map(|w| w.join().unwrap()).sum();
        assert_eq!(failures, 0);

        // Last writer wins with a complete document; no temp files remain.
        let cache = LocalCache::open(&path);
        assert!(!cache.current_index().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_diff_reports_removed_keys() {
        let mut old = BTreeMap::new();
        old.insert("a".to_string(), "1".to_string());
        old.insert("b".to_string(), "2".to_string());
        let mut new = BTreeMap::new();
        new.insert("a".to_string(), "1".to_string());

        let changes = diff(&old, &new);
        assert_eq!(
            changes,
            vec![CacheChange {
                key: "b".into(),
                value: None
            }]
        );
    }
}
