use std::path::{Path, PathBuf};

/// What happened to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

/// Whether the resource is a plain file or a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Directory,
}

/// One changed path inside a change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDelta {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub resource: ResourceKind,
}

impl PathDelta {
    pub fn file(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            resource: ResourceKind::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            resource: ResourceKind::Directory,
        }
    }
}

/// A change notification, scoped arbitrarily.
///
/// Consumers locate the deltas relevant to them (for the map index: direct
/// file children of the watched directory) and ignore everything else. The
/// type is deliberately decoupled from any host notifier so reconciliation
/// can be exercised with synthetic events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeEvent {
    pub deltas: Vec<PathDelta>,
}

impl ChangeEvent {
    pub fn new(deltas: Vec<PathDelta>) -> Self {
        Self { deltas }
    }

    pub fn single(delta: PathDelta) -> Self {
        Self {
            deltas: vec![delta],
        }
    }

    /// Deltas whose path is a direct child of `dir`.
    pub fn children_of<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = &'a PathDelta> {
        self.deltas
            .iter()
            .filter(move |delta| delta.path.parent() == Some(dir))
    }
}
