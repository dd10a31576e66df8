//! repowatch - clone branches of remote git repositories and watch them for updates
//!
//! Lists the branches and tags a remote advertises, clones a single branch into
//! a destination folder, remembers every clone, keeps a list of favorites and
//! periodically checks each favorite against its remote.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration management and parsing
//! - [`git`]: `git` subprocess wrapper behind the [`GitOps`] trait
//! - [`favorites`] / [`registry`]: JSON-backed stores
//! - [`poller`]: background update checks
//! - [`manager`]: the operations a front end drives
//! - [`health`]: preflight diagnostics

pub mod config;
pub mod error;
pub mod favorites;
pub mod git;
pub mod health;
pub mod manager;
pub mod opener;
pub mod persist;
pub mod poller;
pub mod registry;

pub use config::{CheckMode, Config};
pub use error::{RepoError, RepoResult};
pub use favorites::{FavoriteEntry, FavoritesStore};
pub use git::{BranchRef, GitClient, GitOps, RefKind};
pub use health::HealthCheck;
pub use manager::{CloneOutcome, RepoManager};
pub use opener::{FolderOpener, SystemOpener};
pub use poller::{PollerHandle, StatusEvent, UpdatePoller, UpdateStatus};
pub use registry::RepoRegistry;
