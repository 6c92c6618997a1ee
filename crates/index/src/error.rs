use crate::storage::StorageError;
use crate::vcs::VcsError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("vcs error: {0}")]
    Vcs(#[from] VcsError),

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: relmap_format::ParseError,
    },

    #[error("{0}")]
    Other(String),
}
