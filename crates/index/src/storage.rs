use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} does not exist")]
    NotFound { path: PathBuf },
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Storage collaborator the index reads and writes map files through.
///
/// The backing directory is owned by this collaborator, not the index; the
/// index only ever touches it through this trait.
pub trait Storage: Send + Sync {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Replace `path`'s content. With `keep_history` the previous content
    /// is retained by the storage layer rather than discarded.
    fn write_bytes(&self, path: &Path, bytes: &[u8], keep_history: bool)
        -> Result<(), StorageError>;

    fn exists(&self, path: &Path) -> bool;

    /// Direct children of a directory, in stable order.
    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;
}

/// Filesystem-backed storage.
///
/// Keep-history writes copy the previous bytes into a timestamped file
/// under a `.history` sibling directory before overwriting.
#[derive(Debug, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    fn retain_history(&self, path: &Path) -> Result<(), StorageError> {
        let Ok(previous) = std::fs::read(path) else {
            // Nothing to retain for a fresh file.
            return Ok(());
        };
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let history_dir = parent.join(".history");
        std::fs::create_dir_all(&history_dir).map_err(|e| StorageError::io(&history_dir, e))?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let history_path = history_dir.join(format!("{name}.{stamp}"));
        std::fs::write(&history_path, previous).map_err(|e| StorageError::io(&history_path, e))
    }
}

impl Storage for FsStorage {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        std::fs::read(path).map_err(|e| StorageError::io(path, e))
    }

    fn write_bytes(
        &self,
        path: &Path,
        bytes: &[u8],
        keep_history: bool,
    ) -> Result<(), StorageError> {
        if keep_history {
            self.retain_history(path)?;
        }
        std::fs::write(path, bytes).map_err(|e| StorageError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let mut children = Vec::new();
        let read = std::fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
        for entry in read {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let Ok(file_type) = entry.file_type() else {
                log::warn!("skipping unreadable entry in {}", dir.display());
                continue;
            };
            if file_type.is_file() {
                children.push(entry.path());
            }
        }
        children.sort();
        Ok(children)
    }
}

/// In-process storage used by tests and embedders without a filesystem.
///
/// Keep-history writes are recorded so callers can assert how often old
/// content was retained.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    history: Mutex<Vec<(PathBuf, Vec<u8>)>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .expect("memory storage lock")
            .insert(path.into(), bytes.into());
    }

    pub fn remove(&self, path: &Path) {
        self.files.lock().expect("memory storage lock").remove(path);
    }

    /// Keep-history writes observed so far, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<(PathBuf, Vec<u8>)> {
        self.history.lock().expect("memory storage lock").clone()
    }
}

impl Storage for MemoryStorage {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.files
            .lock()
            .expect("memory storage lock")
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn write_bytes(
        &self,
        path: &Path,
        bytes: &[u8],
        keep_history: bool,
    ) -> Result<(), StorageError> {
        let mut files = self.files.lock().expect("memory storage lock");
        if keep_history {
            if let Some(previous) = files.get(path) {
                self.history
                    .lock()
                    .expect("memory storage lock")
                    .push((path.to_path_buf(), previous.clone()));
            }
        }
        files.insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().expect("memory storage lock");
        files.contains_key(path) || files.keys().any(|p| p.starts_with(path))
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let files = self.files.lock().expect("memory storage lock");
        let mut children: Vec<PathBuf> = files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        children.sort();
        Ok(children)
    }
}
