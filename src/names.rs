//! Name→key mapping, persisted independently of the value store.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::Result;

#[derive(Debug, Clone)]
/// Map from human-readable name to the key its content is stored under.
///
/// Unique per name, last set wins. Persisted to its own JSON snapshot file,
/// rewritten on every mutation.
pub struct NameMap {
    names: Arc<RwLock<HashMap<String, String>>>,
    path: PathBuf,
}

impl NameMap {
    /// Open the map backed by the snapshot file at `path`, loading any
    /// existing snapshot.
    pub fn open(path: impl Into<PathBuf>) -> NameMap {
        let path = path.into();
        let names = match fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_default(),
            Err(err) => {
                debug!(path = %path.display(), %err, "no existing name map loaded");
                HashMap::new()
            }
        };

        NameMap {
            names: Arc::new(RwLock::new(names)),
            path,
        }
    }

    /// Record `name -> key`, then persist the whole map.
    pub fn set(&self, name: &str, key: &str) -> Result<()> {
        let mut names = self.names.write();
        names.insert(name.to_string(), key.to_string());
        fs::write(&self.path, serde_json::to_vec(&*names)?)?;

        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        self.names.read().get(name).cloned()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn last_set_wins() {
        let dir = tempfile::tempdir().unwrap();
        let names = NameMap::open(dir.path().join("names.json"));

        names.set("doc", "aa").unwrap();
        names.set("doc", "bb").unwrap();

        assert_eq!(names.resolve("doc").as_deref(), Some("bb"));
        assert_eq!(names.resolve("other"), None);
    }

    #[test]
    fn mapping_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.json");

        NameMap::open(&path).set("doc", "aa").unwrap();

        assert_eq!(NameMap::open(&path).resolve("doc").as_deref(), Some("aa"));
    }
}
