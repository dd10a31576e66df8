use async_trait::async_trait;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

use crate::config::{CheckMode, Config};
use crate::error::{RepoError, RepoResult};
use crate::favorites::FavoriteEntry;

/// Whether a remote ref is a branch head or a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Head,
    Tag,
}

/// A branch or tag advertised by a remote, with its `refs/...` prefix stripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub kind: RefKind,
    /// Object id the remote reported for this ref
    pub commit: String,
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse `git ls-remote` output into branch and tag refs.
///
/// Lines are `<hash> <ref>`; only `refs/heads/*` and `refs/tags/*` are kept,
/// in the order the remote listed them. Peeled tag lines keep their `^{}` suffix.
pub fn parse_ls_remote(output: &str) -> Vec<BranchRef> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let commit = fields.next()?;
            let reference = fields.next()?;

            let (kind, name) = if let Some(name) = reference.strip_prefix("refs/heads/") {
                (RefKind::Head, name)
            } else if let Some(name) = reference.strip_prefix("refs/tags/") {
                (RefKind::Tag, name)
            } else {
                return None;
            };

            Some(BranchRef {
                name: name.to_string(),
                kind,
                commit: commit.to_string(),
            })
        })
        .collect()
}

/// Remote introspection and clone operations the core depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitOps: Send + Sync {
    /// Branches and tags advertised by `repo_url`
    async fn list_remote_refs(&self, repo_url: &str) -> RepoResult<Vec<BranchRef>>;

    /// `true` means the favorite is considered up to date. Never fails.
    async fn check_for_updates(&self, entry: &FavoriteEntry) -> bool;

    /// Single-branch clone into `dest_root/branch`; returns the clone path
    async fn clone_repository(
        &self,
        repo_url: &str,
        branch: &str,
        dest_root: &Path,
    ) -> RepoResult<PathBuf>;
}

/// `git` executable wrapper with a bounded runtime per invocation
#[derive(Debug, Clone)]
pub struct GitClient {
    timeout: Duration,
    check_mode: CheckMode,
    cleanup_on_error: bool,
}

impl GitClient {
    /// Create a new Git client with the given configuration
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.git_timeout(),
            check_mode: config.git.check_mode,
            cleanup_on_error: config.clone.cleanup_on_error,
        }
    }

    pub fn check_mode(&self) -> CheckMode {
        self.check_mode
    }

    fn git_command(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new("git");
        cmd.stdin(Stdio::null())
            // never block on a credential prompt
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);
        cmd
    }

    /// Run a prepared command; `Err` carries a human readable reason
    async fn run(&self, mut cmd: AsyncCommand, what: &str) -> Result<Output, String> {
        debug!("Running git {} (timeout {:?})", what, self.timeout);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(format!("Failed to execute git {}: {}", what, e)),
            Err(_) => Err(format!(
                "git {} timed out after {}s",
                what,
                self.timeout.as_secs()
            )),
        }
    }

    async fn ls_remote_raw(&self, repo_url: &str) -> RepoResult<String> {
        validate_url(repo_url)?;

        let unreachable = |message: String| RepoError::RemoteUnreachable {
            url: repo_url.to_string(),
            message,
        };

        let mut cmd = self.git_command();
        cmd.args(["ls-remote", repo_url]);
        let output = self.run(cmd, "ls-remote").await.map_err(unreachable)?;

        if !output.status.success() {
            return Err(unreachable(stderr_message(&output)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Connectivity check: the remote answers `ls-remote`
    async fn is_reachable(&self, repo_url: &str) -> bool {
        if validate_url(repo_url).is_err() {
            return false;
        }

        let mut cmd = self.git_command();
        cmd.args(["ls-remote", repo_url, "HEAD"]);
        match self.run(cmd, "ls-remote").await {
            Ok(output) if output.status.success() => true,
            Ok(output) => {
                debug!("{} unreachable: {}", repo_url, stderr_message(&output));
                false
            }
            Err(reason) => {
                debug!("{} unreachable: {}", repo_url, reason);
                false
            }
        }
    }

    /// Local HEAD of the favorite's clone equals what the remote advertises
    async fn local_matches_remote(&self, entry: &FavoriteEntry) -> Result<bool, String> {
        if !entry.path.exists() {
            return Err(format!("local clone {} is missing", entry.path.display()));
        }

        let head = self.rev_parse(&entry.path, &["rev-parse", "HEAD"]).await?;
        let branch = self
            .rev_parse(&entry.path, &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?;

        let listing = self
            .ls_remote_raw(&entry.url)
            .await
            .map_err(|e| e.to_string())?;

        if branch == "HEAD" {
            // detached (tag clone): up to date while some remote ref still points at HEAD
            return Ok(listing
                .lines()
                .filter_map(|line| line.split_whitespace().next())
                .any(|hash| hash == head));
        }

        let remote_head = parse_ls_remote(&listing)
            .into_iter()
            .find(|r| r.kind == RefKind::Head && r.name == branch)
            .ok_or_else(|| format!("branch '{}' no longer exists on the remote", branch))?;

        Ok(remote_head.commit == head)
    }

    async fn rev_parse(&self, path: &Path, args: &[&str]) -> Result<String, String> {
        let mut cmd = self.git_command();
        cmd.args(args).current_dir(path);
        let output = self.run(cmd, "rev-parse").await?;

        if !output.status.success() {
            return Err(stderr_message(&output));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitOps for GitClient {
    async fn list_remote_refs(&self, repo_url: &str) -> RepoResult<Vec<BranchRef>> {
        info!("Listing remote refs for {}", repo_url);
        let listing = self.ls_remote_raw(repo_url).await?;
        let refs = parse_ls_remote(&listing);
        debug!("{} advertises {} branches/tags", repo_url, refs.len());
        Ok(refs)
    }

    async fn check_for_updates(&self, entry: &FavoriteEntry) -> bool {
        match self.check_mode {
            CheckMode::Reachability => self.is_reachable(&entry.url).await,
            CheckMode::CompareHeads => match self.local_matches_remote(entry).await {
                Ok(up_to_date) => up_to_date,
                Err(reason) => {
                    warn!("Update check for {} failed: {}", entry.url, reason);
                    false
                }
            },
        }
    }

    async fn clone_repository(
        &self,
        repo_url: &str,
        branch: &str,
        dest_root: &Path,
    ) -> RepoResult<PathBuf> {
        validate_url(repo_url)?;
        validate_branch(branch)?;

        let clone_error = |message: String| RepoError::CloneError {
            url: repo_url.to_string(),
            branch: branch.to_string(),
            message,
        };

        let target = dest_root.join(branch);
        // outermost directory this call creates; removed again if the clone fails
        let created_root = target
            .ancestors()
            .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
            .last()
            .map(Path::to_path_buf);

        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|e| clone_error(format!("Failed to create {}: {}", target.display(), e)))?;

        info!("Cloning {} (branch {}) -> {}", repo_url, branch, target.display());

        let mut cmd = self.git_command();
        cmd.args(["clone", "--branch", branch, "--single-branch", repo_url])
            .arg(&target);

        let outcome = match self.run(cmd, "clone").await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(stderr_message(&output)),
            Err(reason) => Err(reason),
        };

        if let Err(message) = outcome {
            if self.cleanup_on_error {
                if let Some(created) = &created_root {
                    if let Err(e) = tokio::fs::remove_dir_all(created).await {
                        warn!("Failed to clean up {}: {}", created.display(), e);
                    }
                }
            }
            return Err(clone_error(message));
        }

        info!("Successfully cloned: {}", repo_url);
        Ok(target)
    }
}

fn stderr_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("git exited with {}", output.status)
    } else {
        stderr
    }
}

fn validate_url(repo_url: &str) -> RepoResult<()> {
    if repo_url.trim().is_empty() {
        return Err(RepoError::InvalidInput("repository URL is empty".to_string()));
    }
    if repo_url.starts_with('-') {
        return Err(RepoError::InvalidInput(format!(
            "repository URL may not start with '-': {}",
            repo_url
        )));
    }
    Ok(())
}

fn validate_branch(branch: &str) -> RepoResult<()> {
    if branch.trim().is_empty() {
        return Err(RepoError::InvalidInput("branch is empty".to_string()));
    }
    if branch.starts_with('-') {
        return Err(RepoError::InvalidInput(format!(
            "branch may not start with '-': {}",
            branch
        )));
    }
    // the branch name becomes a directory below the destination root
    if !Path::new(branch)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(RepoError::InvalidInput(format!(
            "branch '{}' does not name a subdirectory",
            branch
        )));
    }
    Ok(())
}
