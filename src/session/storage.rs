//! Persistent key/value storage.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

/// Browser-style local storage: string keys to string values.
///
/// Implementations never fail from the caller's point of view; persistence
/// problems are logged and the in-memory view stays authoritative.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str);
    fn remove_item(&self, key: &str);
}

/// Volatile store, cleared when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove_item(&self, key: &str) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Store backed by a JSON object on disk, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or malformed file also
    /// starts empty, with a warning; it is overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(
                    name: "storage.load.failed",
                    path = %path.display(),
                    error = %e,
                    "Ignoring malformed storage file"
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(
                    name: "storage.load.failed",
                    path = %path.display(),
                    error = %e,
                    "Could not read storage file"
                );
                BTreeMap::new()
            }
        };

        debug!(name: "storage.opened", path = %path.display(), keys = items.len());

        Self {
            path,
            items: RwLock::new(items),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, items: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(items)
            .map_err(std::io::Error::other)
            .and_then(|raw| std::fs::write(&self.path, raw));

        if let Err(e) = result {
            warn!(
                name: "storage.write.failed",
                path = %self.path.display(),
                error = %e,
                "Could not persist storage file"
            );
        }
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) {
        let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        self.persist(&guard);
    }

    fn remove_item(&self, key: &str) {
        let mut guard = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if guard.remove(key).is_some() {
            self.persist(&guard);
        }
    }
}
