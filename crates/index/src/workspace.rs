/// Reachability oracle for component projects.
///
/// The surrounding environment decides which projects are actually present
/// and open; the index only asks.
pub trait Workspace: Send + Sync {
    fn is_accessible(&self, project_id: &str) -> bool;
}

/// Workspace in which every project is reachable. Useful for CLIs operating
/// on a bare map directory without a surrounding project model.
#[derive(Debug, Default)]
pub struct AllAccessible;

impl Workspace for AllAccessible {
    fn is_accessible(&self, _project_id: &str) -> bool {
        true
    }
}
