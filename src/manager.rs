//! Repository manager - the operations a front end drives
//!
//! Ties the git client, the clone registry and the favorites store together:
//! listing branches, cloning (and recording) a branch, favorites maintenance,
//! opening a clone, one-off update checks and starting the background poller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{RepoError, RepoResult};
use crate::favorites::{FavoriteEntry, FavoritesStore};
use crate::git::{BranchRef, GitClient, GitOps};
use crate::opener::{FolderOpener, SystemOpener};
use crate::poller::{FavoritesSource, PollerHandle, StatusEvent, StatusListener, UpdatePoller};
use crate::registry::RepoRegistry;

/// Outcome of [`RepoManager::clone_repository`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneOutcome {
    pub path: PathBuf,
    pub favorited: bool,
}

pub struct RepoManager {
    git: Arc<dyn GitOps>,
    favorites: Arc<FavoritesStore>,
    registry: RepoRegistry,
    opener: Box<dyn FolderOpener>,
    auto_favorite: bool,
    refresh_each_cycle: bool,
}

impl RepoManager {
    /// Build a manager backed by the real `git` executable and the configured store files
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(GitClient::new(config)),
            FavoritesStore::new(config.favorites_path()),
            RepoRegistry::new(config.registry_path()),
            Box::new(SystemOpener),
        )
        .auto_favorite(config.clone.auto_favorite)
        .refresh_each_cycle(config.poller.refresh_each_cycle)
    }

    pub fn new(
        git: Arc<dyn GitOps>,
        favorites: FavoritesStore,
        registry: RepoRegistry,
        opener: Box<dyn FolderOpener>,
    ) -> Self {
        Self {
            git,
            favorites: Arc::new(favorites),
            registry,
            opener,
            auto_favorite: true,
            refresh_each_cycle: true,
        }
    }

    pub fn auto_favorite(mut self, enabled: bool) -> Self {
        self.auto_favorite = enabled;
        self
    }

    pub fn refresh_each_cycle(mut self, enabled: bool) -> Self {
        self.refresh_each_cycle = enabled;
        self
    }

    pub fn favorites_store(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn registry(&self) -> &RepoRegistry {
        &self.registry
    }

    /// Branches and tags of `repo_url`, in remote order
    pub async fn list_branches(&self, repo_url: &str) -> RepoResult<Vec<BranchRef>> {
        let repo_url = require("repository URL", repo_url)?;

        match self.git.list_remote_refs(repo_url).await {
            Ok(refs) => {
                info!("Branches loaded for {} ({} refs)", repo_url, refs.len());
                Ok(refs)
            }
            Err(e) => {
                error!("Error listing branches: {}", e);
                Err(e)
            }
        }
    }

    /// Clone `branch` of `repo_url` below `dest_root`, record it and (optionally) favorite it.
    ///
    /// Nothing is recorded when the clone fails.
    pub async fn clone_repository(
        &self,
        repo_url: &str,
        branch: &str,
        dest_root: &Path,
        favorite: bool,
    ) -> RepoResult<CloneOutcome> {
        let repo_url = require("repository URL", repo_url)?;
        let branch = require("branch", branch)?;
        if dest_root.as_os_str().is_empty() {
            return Err(RepoError::InvalidInput("destination folder is empty".to_string()));
        }

        let path = self.git.clone_repository(repo_url, branch, dest_root).await?;

        self.registry.set(repo_url, &path)?;

        let favorited = favorite && self.auto_favorite;
        if favorited {
            self.favorites.add(FavoriteEntry::new(repo_url, path.clone()))?;
        }

        Ok(CloneOutcome { path, favorited })
    }

    pub fn list_favorites(&self) -> RepoResult<Vec<FavoriteEntry>> {
        self.favorites.load()
    }

    /// Favorite `repo_url`; without a path it defaults to `<base>/<last URL segment>`
    pub fn add_favorite(
        &self,
        repo_url: &str,
        path: Option<PathBuf>,
        base: &Path,
    ) -> RepoResult<FavoriteEntry> {
        let repo_url = require("repository URL", repo_url)?;
        let path = path.unwrap_or_else(|| default_favorite_path(repo_url, base));
        let entry = FavoriteEntry::new(repo_url, path);

        self.favorites.add(entry.clone())?;
        Ok(entry)
    }

    pub fn remove_favorite(&self, repo_url: &str) -> RepoResult<usize> {
        self.favorites.remove(require("repository URL", repo_url)?)
    }

    /// Open a favorite's clone; a vanished path is reported, the entry is kept
    pub fn open_favorite(&self, repo_url: &str) -> RepoResult<PathBuf> {
        let repo_url = require("repository URL", repo_url)?;
        let entry = self.favorites.find(repo_url)?.ok_or_else(|| {
            RepoError::InvalidInput(format!("{} is not a favorite", repo_url))
        })?;

        if let Err(e) = self.opener.open(&entry.path) {
            warn!("Could not open favorite {}: {}", repo_url, e);
            return Err(e);
        }
        Ok(entry.path)
    }

    /// One immediate pass over the current favorites
    pub async fn check_updates(&self) -> RepoResult<Vec<StatusEvent>> {
        let favorites = self.favorites.load()?;
        let (tx, mut rx) = mpsc::unbounded_channel();

        UpdatePoller::run_cycle(self.git.as_ref(), &favorites, &tx).await;
        drop(tx);

        let mut events = Vec::with_capacity(favorites.len());
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        Ok(events)
    }

    /// Start background polling, reporting to `listener`
    pub fn start_polling(
        &self,
        listener: StatusListener,
        interval: std::time::Duration,
    ) -> RepoResult<PollerHandle> {
        let source = if self.refresh_each_cycle {
            FavoritesSource::Store(self.favorites.clone())
        } else {
            FavoritesSource::Snapshot(self.favorites.load()?)
        };

        Ok(UpdatePoller::new(self.git.clone(), source, interval).start(listener))
    }
}

fn require<'a>(what: &str, value: &'a str) -> RepoResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RepoError::InvalidInput(format!("{} is empty", what)))
    } else {
        Ok(trimmed)
    }
}

/// `<base>/<last path segment of the URL>`
pub fn default_favorite_path(repo_url: &str, base: &Path) -> PathBuf {
    let name = repo_url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(repo_url);
    base.join(name)
}
