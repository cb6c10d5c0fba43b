//! JSON file triple repository
//!
//! The whole store lives in one JSON document. Every write goes to its own
//! temp file in the same directory, which is then renamed over the target.
//! Read-modify-write cycles hold an exclusive advisory lock on a sibling
//! `.lock` file, so separate handles and separate processes are serialized.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info};

use kgq_core::{KgError, MergeSummary, Result, Triple, TripleStore};

use crate::TripleRepository;

/// Exclusive OS lock on a store's lock file, released on drop
struct StoreLock {
    file: File,
}

impl StoreLock {
    fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| KgError::io(lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| KgError::io(lock_path, e))?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Triple store persisted as a JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_path = path.as_os_str().to_os_string();
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file holding the writer lock
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Remove the backing file and its lock file; files already gone are fine
    pub fn remove(&self) -> Result<()> {
        {
            let _lock = self.lock()?;
            remove_if_present(&self.path)?;
        }
        remove_if_present(&self.lock_path)
    }

    fn lock(&self) -> Result<StoreLock> {
        if let Some(parent) = self.parent_dir() {
            std::fs::create_dir_all(parent).map_err(|e| KgError::io(parent, e))?;
        }
        StoreLock::acquire(&self.lock_path)
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    fn read_store(&self) -> Result<TripleStore> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file missing, starting empty");
                return Ok(TripleStore::new());
            }
            Err(e) => return Err(KgError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(TripleStore::new());
        }
        TripleStore::from_json_str(&content, &self.location())
    }

    /// Write through a uniquely named temp file; the temp file is deleted
    /// if anything fails before the rename
    fn write_store(&self, store: &TripleStore) -> Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let json = store.to_json_string()?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".kgq-store-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| KgError::io(dir, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| KgError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| KgError::io(&self.path, e.error))?;
        Ok(())
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(KgError::io(path, e)),
    }
}

impl TripleRepository for JsonFileStore {
    fn load(&self) -> Result<TripleStore> {
        self.read_store()
    }

    fn save(&self, store: &TripleStore) -> Result<()> {
        let _lock = self.lock()?;
        self.write_store(store)
    }

    fn merge(&self, topic: &str, triples: &[Triple]) -> Result<MergeSummary> {
        let _lock = self.lock()?;

        let mut store = self.read_store()?;
        let summary = store.merge(topic, triples);
        if summary.changed() {
            self.write_store(&store)?;
        }

        info!(
            store = %self.path.display(),
            topic,
            created = summary.records_created,
            added = summary.relations_added,
            unchanged = summary.unchanged,
            "Merged triples into store"
        );
        Ok(summary)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
