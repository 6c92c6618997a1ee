use crate::error::{IndexError, Result};
use crate::storage::Storage;
use crate::workspace::Workspace;
use relmap_format::{parse_entries, MapEntry, MAP_FILE_EXTENSION};
use std::path::{Path, PathBuf};

/// Parsed view of one on-disk map file.
///
/// `entries` reflects the last successful parse of the backing path and is
/// stale between an external edit and the next [`reload`](Self::reload).
/// Identity is the backing path; content never participates in equality.
#[derive(Debug, Clone)]
pub struct MapFile {
    path: PathBuf,
    entries: Vec<MapEntry>,
}

impl MapFile {
    /// Read and parse the map file at `path`.
    pub fn load(storage: &dyn Storage, path: &Path) -> Result<Self> {
        let bytes = storage.read_bytes(path)?;
        let entries = parse_entries(&bytes).map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Re-parse the backing content, replacing the entry sequence.
    ///
    /// All-or-nothing: on failure the previous entries stay in place.
    pub fn reload(&mut self, storage: &dyn Storage) -> Result<()> {
        let bytes = storage.read_bytes(&self.path)?;
        let entries = parse_entries(&bytes).map_err(|source| IndexError::Parse {
            path: self.path.clone(),
            source,
        })?;
        self.entries = entries;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn contains(&self, project_id: &str) -> bool {
        self.entries.iter().any(|e| e.project_id() == project_id)
    }

    #[must_use]
    pub fn entry_for(&self, project_id: &str) -> Option<&MapEntry> {
        self.entries.iter().find(|e| e.project_id() == project_id)
    }

    #[must_use]
    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    /// Project ids listed here that the workspace can actually reach.
    #[must_use]
    pub fn accessible_projects(&self, workspace: &dyn Workspace) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| workspace.is_accessible(e.project_id()))
            .map(|e| e.project_id().to_string())
            .collect()
    }

    /// Whether `path` qualifies as a map file by extension.
    #[must_use]
    pub fn has_map_extension(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == MAP_FILE_EXTENSION)
    }
}

impl PartialEq for MapFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for MapFile {}
