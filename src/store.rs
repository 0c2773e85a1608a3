//! Local key→bytes store with synchronous snapshot persistence.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::Result;

#[derive(Debug, Clone)]
/// Concurrent key→bytes map, rewritten wholesale to a JSON snapshot file on
/// every mutation.
///
/// The snapshot holds hex-encoded values so arbitrary bytes (including empty
/// and non-UTF-8 content) round-trip exactly. The full-file rewrite is O(store
/// size) per put; this store targets small-scale experimentation and keeps
/// that behavior observable rather than optimizing it away.
pub struct Store {
    data: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    path: PathBuf,
}

impl Store {
    /// Open the store backed by the snapshot file at `path`, loading any
    /// existing snapshot. A missing file is a normal first start.
    pub fn open(path: impl Into<PathBuf>) -> Store {
        let path = path.into();
        let data = load_snapshot(&path);

        Store {
            data: Arc::new(RwLock::new(data)),
            path,
        }
    }

    /// Insert or overwrite `key`, then persist the whole store.
    ///
    /// On a failed write-out the in-memory mutation is NOT rolled back: the
    /// map and the snapshot diverge until the next successful put.
    pub fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut data = self.data.write();
        data.insert(key.to_string(), value);

        let encoded: HashMap<&String, String> =
            data.iter().map(|(k, v)| (k, hex::encode(v))).collect();
        fs::write(&self.path, serde_json::to_vec(&encoded)?)?;

        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

fn load_snapshot(path: &Path) -> HashMap<String, Vec<u8>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            debug!(path = %path.display(), %err, "no existing snapshot loaded");
            return HashMap::new();
        }
    };

    let encoded: HashMap<String, String> = match serde_json::from_slice(&raw) {
        Ok(encoded) => encoded,
        Err(err) => {
            warn!(path = %path.display(), %err, "snapshot unreadable, starting empty");
            return HashMap::new();
        }
    };

    let mut data = HashMap::with_capacity(encoded.len());
    for (key, value) in encoded {
        match hex::decode(&value) {
            Ok(bytes) => {
                data.insert(key, bytes);
            }
            Err(err) => warn!(%key, %err, "skipping undecodable snapshot entry"),
        }
    }
    data
}
