use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::core::error::Result;
use crate::core::record::KeyRecord;

/// JSON-file-backed store of key records. All access serializes through a
/// per-store mutex so overlapping callers within the process cannot
/// interleave a read and a write into a torn state. The store does not
/// coordinate across processes.
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open a store, creating the parent directory and an empty collection
    /// if the backing file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            fs::write(&path, "[]")?;
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    /// Read every record. A missing or corrupt backing file degrades to an
    /// empty collection; the degradation is logged so operators can audit
    /// it rather than mistaking it for an empty store.
    pub fn read_all(&self) -> Vec<KeyRecord> {
        let _guard = self.lock.lock().unwrap();
        self.read_unlocked()
    }

    /// Replace the whole collection in one write.
    pub fn write_all(&self, records: &[KeyRecord]) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        self.write_unlocked(records)
    }

    /// Append one record, holding the lock across the read-modify-write.
    pub fn append(&self, record: KeyRecord) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut records = self.read_unlocked();
        records.push(record);
        self.write_unlocked(&records)
    }

    fn read_unlocked(&self) -> Vec<KeyRecord> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "Corrupt store at {}, treating as empty: {}",
                        self.path.display(),
                        e
                    );
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(
                    "Unreadable store at {}, treating as empty: {}",
                    self.path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    fn write_unlocked(&self, records: &[KeyRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
