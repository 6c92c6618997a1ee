use std::hash::{Hash, Hasher};

/// Tag used when a project cannot be resolved to a map entry.
pub const DEFAULT_TAG: &str = "HEAD";

/// One project/tag pair parsed from a map file.
///
/// Identity is the project id alone: updating a tag replaces the tag while
/// preserving entry identity, which is what "update the tag for project X"
/// relies on.
#[derive(Debug, Clone)]
pub struct MapEntry {
    project_id: String,
    tag: String,
}

impl MapEntry {
    pub fn new(project_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            tag: tag.into(),
        }
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl PartialEq for MapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.project_id == other.project_id
    }
}

impl Eq for MapEntry {}

impl Hash for MapEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project_id.hash(state);
    }
}
