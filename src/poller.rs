//! Update poller - background task re-checking every favorite on a fixed interval
//!
//! Each pass walks the favorites in order, asks [`GitOps::check_for_updates`]
//! for a verdict and emits one [`StatusEvent`] per repository to the listener.
//! Passes never overlap. The task stops when [`PollerHandle::stop`] is called,
//! when the handle is dropped, or when the listener goes away.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{RepoError, RepoResult};
use crate::favorites::{FavoriteEntry, FavoritesStore};
use crate::git::GitOps;

/// Update verdict for a single favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateStatus {
    Updated,
    UpdatesAvailable,
}

impl UpdateStatus {
    pub fn from_check(up_to_date: bool) -> Self {
        if up_to_date {
            UpdateStatus::Updated
        } else {
            UpdateStatus::UpdatesAvailable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Updated => "Updated",
            UpdateStatus::UpdatesAvailable => "Updates Available",
        }
    }
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(url, status)` report produced by a polling pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub url: String,
    pub status: UpdateStatus,
    pub checked_at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(url: impl Into<String>, status: UpdateStatus) -> Self {
        Self {
            url: url.into(),
            status,
            checked_at: Utc::now(),
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.status)
    }
}

/// Receiving side of status reports
pub type StatusListener = mpsc::UnboundedSender<StatusEvent>;

/// Where each pass gets its list of favorites from
pub enum FavoritesSource {
    /// Fixed list captured when the poller was built
    Snapshot(Vec<FavoriteEntry>),
    /// Re-read from the store before every pass
    Store(Arc<FavoritesStore>),
}

impl FavoritesSource {
    async fn current(&self) -> RepoResult<Vec<FavoriteEntry>> {
        match self {
            FavoritesSource::Snapshot(entries) => Ok(entries.clone()),
            FavoritesSource::Store(store) => {
                let path = store.path().to_path_buf();
                let store = store.clone();
                // std::fs reads and the store mutex stay off the async workers
                tokio::task::spawn_blocking(move || store.load())
                    .await
                    .map_err(|e| RepoError::persistence(path, e))?
            }
        }
    }
}

/// Recurring update checker for the favorites
pub struct UpdatePoller {
    git: Arc<dyn GitOps>,
    source: FavoritesSource,
    interval: Duration,
}

/// Control handle for a running [`UpdatePoller`]
pub struct PollerHandle {
    shutdown_sender: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Ask the poller to stop and wait until it has
    pub async fn stop(self) {
        let _ = self.shutdown_sender.send(());
        if let Err(e) = self.task.await {
            warn!("Update poller task ended abnormally: {}", e);
        }
    }

    /// Wait for the poller to end on its own (listener dropped)
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            warn!("Update poller task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl UpdatePoller {
    pub fn new(git: Arc<dyn GitOps>, source: FavoritesSource, interval: Duration) -> Self {
        Self {
            git,
            source,
            interval,
        }
    }

    /// Check every favorite once, in order, reporting to `listener`.
    ///
    /// Returns the number of events delivered.
    pub async fn run_cycle(
        git: &dyn GitOps,
        favorites: &[FavoriteEntry],
        listener: &StatusListener,
    ) -> usize {
        let mut emitted = 0;

        for entry in favorites {
            let up_to_date = git.check_for_updates(entry).await;
            let event = StatusEvent::new(entry.url.clone(), UpdateStatus::from_check(up_to_date));
            debug!("{}", event);

            if listener.send(event).is_err() {
                debug!("Status listener dropped mid-pass");
                break;
            }
            emitted += 1;
        }

        emitted
    }

    /// Spawn the polling loop; the first pass starts immediately
    pub fn start(self, listener: StatusListener) -> PollerHandle {
        let (shutdown_sender, shutdown_receiver) = broadcast::channel(1);
        let task = tokio::spawn(self.run(listener, shutdown_receiver));

        PollerHandle {
            shutdown_sender,
            task,
        }
    }

    async fn run(self, listener: StatusListener, mut shutdown_receiver: broadcast::Receiver<()>) {
        let mut passes: u64 = 0;

        info!("Update poller started with interval: {:?}", self.interval);

        loop {
            match self.source.current().await {
                Ok(favorites) => {
                    tokio::select! {
                        _ = shutdown_receiver.recv() => break,
                        emitted = Self::run_cycle(self.git.as_ref(), &favorites, &listener) => {
                            passes += 1;
                            debug!("Update pass {} reported {} of {} favorites", passes, emitted, favorites.len());
                        }
                    }
                }
                Err(e) => warn!("Skipping update pass, favorites unavailable: {}", e),
            }

            if listener.is_closed() {
                info!("Status listener gone, stopping update poller");
                break;
            }

            // the full interval separates the end of one pass from the start of the next
            tokio::select! {
                _ = shutdown_receiver.recv() => break,
                _ = sleep(self.interval) => {}
            }
        }

        info!("Update poller stopped after {} passes", passes);
    }
}
