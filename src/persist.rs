//! JSON store helpers shared by the favorites store and the clone registry.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers only ever see a complete document.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{RepoError, RepoResult};

/// Read a JSON document, or `T::default()` when the file does not exist
pub fn read_json_or_default<T>(path: &Path) -> RepoResult<T>
where
    T: DeserializeOwned + Default,
{
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Store {} not found, starting empty", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(RepoError::persistence(path, e)),
    };

    serde_json::from_str(&content).map_err(|e| RepoError::persistence(path, e))
}

/// Serialize `value` and atomically replace `path` with it
pub fn write_json_atomic<T>(path: &Path, value: &T) -> RepoResult<()>
where
    T: Serialize + ?Sized,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    std::fs::create_dir_all(parent).map_err(|e| RepoError::persistence(path, e))?;

    let content = serde_json::to_vec_pretty(value).map_err(|e| RepoError::persistence(path, e))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| RepoError::persistence(path, e))?;
    temp.write_all(&content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| RepoError::persistence(path, e))?;
    temp.persist(path)
        .map_err(|e| RepoError::persistence(path, e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
