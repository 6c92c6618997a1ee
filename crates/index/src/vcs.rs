use std::path::PathBuf;
use std::process::Command;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("no commit comment set")]
    MissingComment,
}

/// How deep a commit reaches from each listed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitDepth {
    /// The resource itself.
    Item,
    /// The resource and its direct children.
    Children,
    /// The resource and everything below it.
    Infinite,
}

/// Sink for progress reporting during long-running collaborator calls.
pub trait Progress: Send + Sync {
    fn subtask(&self, message: &str);
}

/// Progress sink that discards all reports.
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {
    fn subtask(&self, _message: &str) {}
}

/// Version-control collaborator.
///
/// A comment is staged first, then one or more resources are committed.
/// Both calls are synchronous and block until the backend returns or fails.
pub trait Vcs: Send + Sync {
    fn set_comment(&self, text: &str) -> Result<(), VcsError>;

    fn commit(
        &self,
        resources: &[PathBuf],
        depth: CommitDepth,
        progress: &dyn Progress,
    ) -> Result<(), VcsError>;
}

/// `Vcs` implementation shelling out to the `git` binary.
pub struct GitVcs {
    repo_root: PathBuf,
    comment: Mutex<Option<String>>,
}

impl GitVcs {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            comment: Mutex::new(None),
        }
    }

    fn run_git(&self, args: &[&str]) -> Result<(), VcsError> {
        let rendered = format!("git {}", args.join(" "));
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(args)
            .output()
            .map_err(|e| VcsError::Spawn {
                command: rendered.clone(),
                source: e,
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VcsError::CommandFailed {
                command: rendered,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl Vcs for GitVcs {
    fn set_comment(&self, text: &str) -> Result<(), VcsError> {
        *self.comment.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        Ok(())
    }

    fn commit(
        &self,
        resources: &[PathBuf],
        _depth: CommitDepth,
        progress: &dyn Progress,
    ) -> Result<(), VcsError> {
        let comment = self
            .comment
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(VcsError::MissingComment)?;

        progress.subtask("staging map files");
        for resource in resources {
            let rendered = resource.to_string_lossy();
            self.run_git(&["add", "--all", rendered.as_ref()])?;
        }

        progress.subtask("committing");
        self.run_git(&["commit", "-m", &comment])
    }
}

#[cfg(test)]
mod tests {
    use super::{CommitDepth, GitVcs, NullProgress, Vcs, VcsError};

    #[test]
    fn commit_without_comment_is_rejected() {
        let vcs = GitVcs::new("/nonexistent");
        let err = vcs
            .commit(&[], CommitDepth::Infinite, &NullProgress)
            .unwrap_err();
        assert!(matches!(err, VcsError::MissingComment));
    }
}
