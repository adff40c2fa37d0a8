//! Exposition store
//!
//! Persists one JSON document per exposition at
//! `<research-dir>/<id>/<id>.json`. Writes are all-or-nothing: the
//! document is serialized to a temporary file and renamed into place, so
//! an interrupted crawl never leaves a partial record. A lock file per
//! exposition keeps two workers from writing the same id.

use crate::model::Exposition;
use crate::{Result, WeaveError};
use std::fs;
use std::path::{Path, PathBuf};

pub struct ExpositionStore {
    research_dir: PathBuf,
}

/// Held while one worker owns an exposition's output folder
///
/// Dropping the guard releases the lock.
pub struct ExpositionLock {
    lock_path: PathBuf,
}

impl Drop for ExpositionLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            tracing::warn!("failed to release lock {}: {}", self.lock_path.display(), e);
        }
    }
}

impl ExpositionStore {
    /// Opens (and creates if needed) the research directory
    pub fn new(research_dir: &Path) -> Result<Self> {
        fs::create_dir_all(research_dir)?;
        Ok(Self {
            research_dir: research_dir.to_path_buf(),
        })
    }

    pub fn research_dir(&self) -> &Path {
        &self.research_dir
    }

    /// Path of an exposition's persisted document
    pub fn document_path(&self, exposition_id: u64) -> PathBuf {
        self.folder(exposition_id)
            .join(format!("{}.json", exposition_id))
    }

    fn folder(&self, exposition_id: u64) -> PathBuf {
        self.research_dir.join(exposition_id.to_string())
    }

    /// Claims an exposition for this worker
    ///
    /// # Returns
    ///
    /// * `Ok(ExpositionLock)` - The caller owns the exposition's folder
    /// * `Err(WeaveError::Locked)` - Another worker is writing it
    pub fn try_lock(&self, exposition_id: u64) -> Result<ExpositionLock> {
        let folder = self.folder(exposition_id);
        fs::create_dir_all(&folder)?;

        let lock_path = folder.join(format!("{}.lock", exposition_id));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(ExpositionLock { lock_path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(WeaveError::Locked { id: exposition_id })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Writes an exposition document atomically
    pub fn write(&self, exposition: &Exposition) -> Result<()> {
        let path = self.document_path(exposition.id);
        let temp_path = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(exposition)?;
        fs::write(&temp_path, json)
            .map_err(|e| WeaveError::Persistence(format!("write {}: {}", temp_path.display(), e)))?;
        fs::rename(&temp_path, &path)
            .map_err(|e| WeaveError::Persistence(format!("rename {}: {}", path.display(), e)))?;

        tracing::info!("wrote exposition {} to {}", exposition.id, path.display());
        Ok(())
    }

    /// Deletes an exposition's folder, forcing the next crawl to redo it
    pub fn remove(&self, exposition_id: u64) -> Result<()> {
        let folder = self.folder(exposition_id);
        if folder.exists() {
            fs::remove_dir_all(&folder)
                .map_err(|e| WeaveError::Persistence(format!("remove {}: {}", folder.display(), e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_back() {
        let dir = TempDir::new().unwrap();
        let store = ExpositionStore::new(dir.path()).unwrap();

        let expo = Exposition::new(42, "https://example.net/view/42/1");
        store.write(&expo).unwrap();

        let raw = fs::read_to_string(store.document_path(42)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["id"], 42);
        assert_eq!(value["url"], "https://example.net/view/42/1");
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = ExpositionStore::new(dir.path()).unwrap();
        store.write(&Exposition::new(7, "https://x/view/7/1")).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path().join("7"))
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(entries, vec!["7.json"]);
    }

    #[test]
    fn test_lock_excludes_second_worker() {
        let dir = TempDir::new().unwrap();
        let store = ExpositionStore::new(dir.path()).unwrap();

        let guard = store.try_lock(42).unwrap();
        assert!(matches!(
            store.try_lock(42),
            Err(WeaveError::Locked { id: 42 })
        ));

        drop(guard);
        assert!(store.try_lock(42).is_ok());
    }

    #[test]
    fn test_remove_clears_folder() {
        let dir = TempDir::new().unwrap();
        let store = ExpositionStore::new(dir.path()).unwrap();
        store.write(&Exposition::new(9, "https://x/view/9/1")).unwrap();

        store.remove(9).unwrap();
        assert!(!store.document_path(9).exists());
        // removing again is a no-op
        store.remove(9).unwrap();
    }
}
