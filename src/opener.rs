//! Opening a favorite's local clone in the platform file browser

use std::path::Path;
use std::process::{Command, Stdio};
use tracing::info;

use crate::error::{RepoError, RepoResult};

/// Shows a local directory to the user
pub trait FolderOpener: Send + Sync {
    fn open(&self, path: &Path) -> RepoResult<()>;
}

/// Launches the desktop's file browser (`xdg-open`, `open` or `explorer`)
#[derive(Debug, Default, Clone)]
pub struct SystemOpener;

impl SystemOpener {
    fn launcher() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(windows) {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

impl FolderOpener for SystemOpener {
    fn open(&self, path: &Path) -> RepoResult<()> {
        if !path.exists() {
            return Err(RepoError::PathNotFound(path.to_path_buf()));
        }

        let launcher = Self::launcher();
        info!("Opening {} with {}", path.display(), launcher);

        // the file browser outlives us; don't wait for it
        Command::new(launcher)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| RepoError::FolderOpen {
                path: path.to_path_buf(),
                message: format!("{}: {}", launcher, e),
            })
    }
}
