//! Clone registry - every repository URL ever cloned and where it landed

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use crate::error::RepoResult;
use crate::persist::{read_json_or_default, write_json_atomic};

/// URL → local path mapping backed by a JSON object file
#[derive(Debug)]
pub struct RepoRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RepoRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole mapping; an absent file is an empty mapping
    pub fn load(&self) -> RepoResult<BTreeMap<String, PathBuf>> {
        read_json_or_default(&self.path)
    }

    /// Record where `url` was cloned, overwriting any previous path
    pub fn set(&self, url: &str, path: &Path) -> RepoResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut repos = self.load()?;
        if let Some(previous) = repos.insert(url.to_string(), path.to_path_buf()) {
            if previous != path {
                info!(
                    "Re-clone of {} moves it from {} to {}",
                    url,
                    previous.display(),
                    path.display()
                );
            }
        }
        write_json_atomic(&self.path, &repos)
    }

    pub fn get(&self, url: &str) -> RepoResult<Option<PathBuf>> {
        Ok(self.load()?.remove(url))
    }
}
