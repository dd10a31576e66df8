use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the repository-state core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("Remote unreachable: {url}: {message}")]
    RemoteUnreachable { url: String, message: String },

    #[error("Clone of {url} (branch '{branch}') failed: {message}")]
    CloneError {
        url: String,
        branch: String,
        message: String,
    },

    #[error("Store {path} could not be read or written: {message}")]
    PersistenceError { path: PathBuf, message: String },

    #[error("The path {0} does not exist")]
    PathNotFound(PathBuf),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Could not open {path}: {message}")]
    FolderOpen { path: PathBuf, message: String },
}

impl RepoError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, err: impl ToString) -> Self {
        RepoError::PersistenceError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

pub type RepoResult<T> = std::result::Result<T, RepoError>;
