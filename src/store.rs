// Cache store module: the two pieces of state this tool keeps between
// runs (the account id and the group profile) live behind a minimal
// key-value interface, so the file layout stays in one place and tests
// can swap in an in-memory store.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Minimal write-once cache interface. Keys are file names relative to
/// the store root; values are raw file contents. There is deliberately
/// no delete operation and no freshness metadata: a present key is
/// trusted as-is.
pub trait KvStore {
    /// Read the full value for `key`, or `None` if it was never written.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Write `value` under `key`, replacing a previous value.
    fn put(&mut self, key: &str, value: &str) -> io::Result<()>;
}

/// Directory-backed store used by real runs: each key is a plain file
/// directly under `root`.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStore { root: root.into() }
    }
}

impl KvStore for DirStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.root.join(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::write(self.root.join(key), value)
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemStore {
    entries: std::collections::BTreeMap<String, String>,
}

#[cfg(test)]
impl KvStore for MemStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dir_store_round_trips_and_reports_missing_keys() {
        let dir = tempdir().unwrap();
        let mut store = DirStore::new(dir.path());
        assert_eq!(store.get("account.txt").unwrap(), None);
        store.put("account.txt", "oid-123").unwrap();
        assert_eq!(store.get("account.txt").unwrap().as_deref(), Some("oid-123"));
    }

    #[test]
    fn dir_store_keeps_contents_verbatim() {
        // values are used exactly as stored: no trimming
        let dir = tempdir().unwrap();
        let mut store = DirStore::new(dir.path());
        store.put("account.txt", "  oid with spaces \n").unwrap();
        assert_eq!(
            store.get("account.txt").unwrap().as_deref(),
            Some("  oid with spaces \n")
        );
    }

    #[test]
    fn dir_store_put_overwrites() {
        let dir = tempdir().unwrap();
        let mut store = DirStore::new(dir.path());
        store.put("group.json", "{}").unwrap();
        store.put("group.json", "{\"nid\": 1}").unwrap();
        assert_eq!(
            store.get("group.json").unwrap().as_deref(),
            Some("{\"nid\": 1}")
        );
    }
}
