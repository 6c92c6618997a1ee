use crate::error::{IndexError, Result};
use crate::event::{ChangeEvent, ChangeKind, PathDelta, ResourceKind};
use crate::mapfile::MapFile;
use crate::storage::Storage;
use crate::vcs::{CommitDepth, Progress, Vcs};
use crate::workspace::Workspace;
use relmap_format::{MapContentDocument, MapEntry, DEFAULT_TAG};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Tracked map files, keyed by backing path.
///
/// `Absent` is distinct from an empty `Present` map: it is the "no map
/// project configured" signal and callers branch on it. An empty `Present`
/// map means the watched directory exists but holds no qualifying files;
/// read operations treat both as the empty sentinel.
#[derive(Debug)]
enum MapFileSet {
    Absent,
    Present(BTreeMap<PathBuf, MapFile>),
}

impl MapFileSet {
    fn is_empty_sentinel(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Present(map) => map.is_empty(),
        }
    }
}

/// Index of the map files inside one watched directory.
///
/// Owns the set of [`MapFile`]s exclusively; external edits reach the set
/// only through [`reconcile`](Self::reconcile). Queries take the shared
/// side of a single `RwLock`, reconciliation takes the exclusive side, so
/// no reader ever observes a half-updated set.
pub struct MapIndex {
    root: PathBuf,
    storage: Arc<dyn Storage>,
    vcs: Arc<dyn Vcs>,
    workspace: Arc<dyn Workspace>,
    files: RwLock<MapFileSet>,
    disposed: AtomicBool,
}

impl MapIndex {
    /// Build an index over the map directory at `root`, performing the
    /// initial scan. Any storage or parse failure during the scan aborts
    /// construction.
    pub fn open(
        root: impl Into<PathBuf>,
        storage: Arc<dyn Storage>,
        vcs: Arc<dyn Vcs>,
        workspace: Arc<dyn Workspace>,
    ) -> Result<Self> {
        let root = root.into();
        let files = Self::scan(storage.as_ref(), &root)?;
        Ok(Self {
            root,
            storage,
            vcs,
            workspace,
            files: RwLock::new(files),
            disposed: AtomicBool::new(false),
        })
    }

    fn scan(storage: &dyn Storage, root: &Path) -> Result<MapFileSet> {
        if !storage.exists(root) {
            return Ok(MapFileSet::Absent);
        }
        let mut map = BTreeMap::new();
        for child in storage.list_children(root)? {
            if !MapFile::has_map_extension(&child) {
                continue;
            }
            let file = MapFile::load(storage, &child)?;
            map.insert(child, file);
        }
        Ok(MapFileSet::Present(map))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the watched directory currently exists.
    #[must_use]
    pub fn maps_are_loaded(&self) -> bool {
        self.storage.exists(&self.root)
    }

    /// First entry claiming `project_id` across the tracked map files.
    #[must_use]
    pub fn map_entry(&self, project_id: &str) -> Option<MapEntry> {
        let guard = self.read_files();
        match &*guard {
            MapFileSet::Absent => None,
            MapFileSet::Present(map) => map
                .values()
                .find(|file| file.contains(project_id))
                .and_then(|file| file.entry_for(project_id).cloned()),
        }
    }

    /// Snapshot of every tracked map file, in path order. `None` is the
    /// empty sentinel.
    #[must_use]
    pub fn map_files(&self) -> Option<Vec<MapFile>> {
        let guard = self.read_files();
        match &*guard {
            MapFileSet::Present(map) if !map.is_empty() => {
                Some(map.values().cloned().collect())
            }
            _ => None,
        }
    }

    /// Map files with at least one workspace-reachable project.
    ///
    /// `None` means no map project is configured at all (the empty
    /// sentinel); `Some` with an empty vector means map files exist but
    /// nothing in them is reachable.
    #[must_use]
    pub fn valid_map_files(&self) -> Option<Vec<MapFile>> {
        let guard = self.read_files();
        match &*guard {
            MapFileSet::Present(map) if !map.is_empty() => Some(
                map.values()
                    .filter(|file| !file.accessible_projects(self.workspace.as_ref()).is_empty())
                    .cloned()
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Owning map files for the given projects, de-duplicated by backing
    /// path. Unresolved projects are skipped.
    #[must_use]
    pub fn map_files_for(&self, project_ids: &[&str]) -> Vec<MapFile> {
        let guard = self.read_files();
        let MapFileSet::Present(map) = &*guard else {
            return Vec::new();
        };
        let mut owners: BTreeMap<&Path, &MapFile> = BTreeMap::new();
        for &id in project_ids {
            if let Some(file) = map.values().find(|file| file.contains(id)) {
                owners.entry(file.path()).or_insert(file);
            }
        }
        owners.into_values().cloned().collect()
    }

    /// Tags for the given projects, in input order. Projects that resolve
    /// to no entry get [`DEFAULT_TAG`]. `None` mirrors an empty input.
    #[must_use]
    pub fn tags_for(&self, project_ids: &[&str]) -> Option<Vec<String>> {
        if project_ids.is_empty() {
            return None;
        }
        // One guard for the whole batch so every id resolves against the
        // same generation of the set.
        let guard = self.read_files();
        let tags = project_ids
            .iter()
            .map(|&id| {
                let entry = match &*guard {
                    MapFileSet::Absent => None,
                    MapFileSet::Present(map) => map
                        .values()
                        .find(|file| file.contains(id))
                        .and_then(|file| file.entry_for(id)),
                };
                entry.map_or_else(|| DEFAULT_TAG.to_string(), |entry| entry.tag().to_string())
            })
            .collect();
        Some(tags)
    }

    /// Indexed map file backing `path`, if any.
    #[must_use]
    pub fn map_file_at(&self, path: &Path) -> Option<MapFile> {
        let guard = self.read_files();
        match &*guard {
            MapFileSet::Absent => None,
            MapFileSet::Present(map) => map.get(path).cloned(),
        }
    }

    /// Indexed map file backing `path`, or a freshly parsed one that is
    /// *not* inserted into the tracked set.
    pub fn peek_map_file(&self, path: &Path) -> Result<MapFile> {
        if let Some(file) = self.map_file_at(path) {
            return Ok(file);
        }
        MapFile::load(self.storage.as_ref(), path)
    }

    /// Rewrite `project_id`'s tag to `new_tag` inside its owning map file.
    ///
    /// No-op when no map file claims the project or the tag already equals
    /// `new_tag`; otherwise exactly one keep-history write is issued.
    pub fn request_tag_update(&self, project_id: &str, new_tag: &str) -> Result<()> {
        let guard = self.read_files();
        let MapFileSet::Present(map) = &*guard else {
            return Ok(());
        };
        let Some(file) = map.values().find(|file| file.contains(project_id)) else {
            return Ok(());
        };

        let bytes = self.storage.read_bytes(file.path())?;
        let mut document = MapContentDocument::new(bytes);
        document
            .update_tag(project_id, new_tag)
            .map_err(|source| IndexError::Parse {
                path: file.path().to_path_buf(),
                source,
            })?;
        if document.is_changed() {
            self.storage
                .write_bytes(file.path(), document.contents(), true)?;
        }
        Ok(())
    }

    /// Commit the entire watched directory recursively with `comment`.
    pub fn commit(&self, comment: &str, progress: &dyn Progress) -> Result<()> {
        self.vcs.set_comment(comment)?;
        self.vcs
            .commit(&[self.root.clone()], CommitDepth::Infinite, progress)?;
        Ok(())
    }

    /// Reconcile the tracked set against an external change notification.
    ///
    /// Only direct file children of the watched directory are considered.
    /// A failure while processing one file is logged and does not abort
    /// processing of the remaining files in the same event.
    pub fn reconcile(&self, event: &ChangeEvent) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let relevant: Vec<&PathDelta> = event
            .children_of(&self.root)
            .filter(|delta| delta.resource == ResourceKind::File)
            .filter(|delta| MapFile::has_map_extension(&delta.path))
            .collect();
        if relevant.is_empty() {
            return;
        }

        let mut guard = self.write_files();
        for delta in relevant {
            match delta.kind {
                ChangeKind::Changed => self.reconcile_changed(&mut guard, &delta.path),
                ChangeKind::Removed => Self::reconcile_removed(&mut guard, &delta.path),
                ChangeKind::Added => self.reconcile_added(&mut guard, &delta.path),
            }
        }
    }

    fn reconcile_changed(&self, set: &mut MapFileSet, path: &Path) {
        let MapFileSet::Present(map) = set else {
            return;
        };
        let Some(file) = map.get_mut(path) else {
            // Change to a file we never indexed; nothing to refresh.
            return;
        };
        if let Err(err) = file.reload(self.storage.as_ref()) {
            log::warn!("failed to reload {}: {err}", path.display());
        }
    }

    fn reconcile_removed(set: &mut MapFileSet, path: &Path) {
        let MapFileSet::Present(map) = set else {
            return;
        };
        if map.remove(path).is_some() && map.is_empty() {
            // Losing the last map file re-enters the "no map project"
            // state, not an empty-but-configured one.
            *set = MapFileSet::Absent;
        }
    }

    fn reconcile_added(&self, set: &mut MapFileSet, path: &Path) {
        // An add arriving while the set is the empty sentinel does not
        // bootstrap it back to non-empty; the original behaves the same
        // way and callers rely on the sentinel staying put.
        if set.is_empty_sentinel() {
            return;
        }
        let MapFileSet::Present(map) = set else {
            return;
        };
        match MapFile::load(self.storage.as_ref(), path) {
            Ok(file) => {
                map.insert(path.to_path_buf(), file);
            }
            Err(err) => log::warn!("failed to load added {}: {err}", path.display()),
        }
    }

    /// Mark the index disposed. Terminal: subsequent reconciliation
    /// requests are ignored.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn read_files(&self) -> std::sync::RwLockReadGuard<'_, MapFileSet> {
        self.files.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_files(&self) -> std::sync::RwLockWriteGuard<'_, MapFileSet> {
        self.files.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::MapIndex;
    use crate::storage::MemoryStorage;
    use crate::vcs::{CommitDepth, Progress, Vcs, VcsError};
    use crate::workspace::AllAccessible;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct NoVcs;

    impl Vcs for NoVcs {
        fn set_comment(&self, _text: &str) -> Result<(), VcsError> {
            Ok(())
        }

        fn commit(
            &self,
            _resources: &[PathBuf],
            _depth: CommitDepth,
            _progress: &dyn Progress,
        ) -> Result<(), VcsError> {
            Ok(())
        }
    }

    fn index_over(storage: Arc<MemoryStorage>) -> MapIndex {
        MapIndex::open("/maps", storage, Arc::new(NoVcs), Arc::new(AllAccessible))
            .expect("open index")
    }

    #[test]
    fn missing_directory_yields_empty_sentinel() {
        let storage = Arc::new(MemoryStorage::new());
        let index = index_over(storage);
        assert!(index.valid_map_files().is_none());
        assert!(index.map_entry("org.example.core").is_none());
    }

    #[test]
    fn initial_scan_failure_aborts_construction() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("/maps/bad.map", b"no separator here\n".to_vec());
        let result = MapIndex::open(
            "/maps",
            storage,
            Arc::new(NoVcs),
            Arc::new(AllAccessible),
        );
        assert!(result.is_err());
    }

    #[test]
    fn scan_ignores_non_map_files() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("/maps/a.map", b"org.example.core=v1\n".to_vec());
        storage.insert("/maps/readme.txt", b"not a map\n".to_vec());

        let index = index_over(storage);
        assert_eq!(
            index.map_entry("org.example.core").expect("entry").tag(),
            "v1"
        );
        assert_eq!(index.valid_map_files().expect("files").len(), 1);
    }

    #[test]
    fn tags_for_mirrors_input_null() {
        let storage = Arc::new(MemoryStorage::new());
        storage.insert("/maps/a.map", b"org.example.core=v1\n".to_vec());
        let index = index_over(storage);
        assert!(index.tags_for(&[]).is_none());
    }
}
