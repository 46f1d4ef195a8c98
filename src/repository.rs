//! # App Cache Management
//!
//! This module provides the `RepositoryManager`, which keeps one local clone
//! per cataloged app under a cache root (`<cache-root>/<app id>`).
//!
//! ## Design
//!
//! Git access goes through the **`GitOperations`** trait, the narrow set of
//! capabilities the catalog needs: clone, remote/branch management, fetch,
//! hard reset, and a few history queries. `DefaultGitOperations` wraps the
//! system `git` command; tests swap in a double that records its calls, so
//! the cache logic runs without a real repository.
//!
//! ## Refresh rules
//!
//! - **Cache miss**: shallow single-branch clone, depth tuned by the app's
//!   lifecycle state (see [`crate::defaults::clone_depth`]).
//! - **Cache hit, fresh**: skipped when the last clone/fetch happened within
//!   the freshness window and the cache already follows the entry's URL and
//!   branch.
//! - **Cache hit, stale**: repoint `origin`, make sure the branch is fetched,
//!   force-fetch it, and hard-reset the working copy. The cache is a
//!   read-only mirror, so local modifications are discarded.
//!
//! Each app owns its own subdirectory, so refreshes of different apps can run
//! concurrently without locking.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{CatalogEntry, Registry};
use crate::defaults::{clone_depth, DEFAULT_FRESHNESS, DEFAULT_NETWORK_TIMEOUT};
use crate::error::Result;
use crate::git::CommitInfo;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Shallow, single-branch clone into `target_dir`.
    fn clone_shallow(&self, url: &str, branch: &str, depth: u32, target_dir: &Path) -> Result<()>;

    /// Points `origin` at `url`.
    fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()>;

    /// Whether `origin/<branch>` is known locally.
    fn has_branch(&self, repo: &Path, branch: &str) -> bool;

    /// URL `origin` points at, `None` if unknown.
    fn remote_url(&self, repo: &Path) -> Option<String>;

    /// Checked-out branch, `None` on a detached `HEAD`.
    fn current_branch(&self, repo: &Path) -> Option<String>;

    /// Registers `branch` as fetched from `origin`.
    fn track_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Force-fetches `branch` from `origin`.
    fn fetch_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Hard-resets the working copy to the fetched tip of `branch`.
    fn reset_hard(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Whether `rev` is a commit of the local history.
    fn commit_exists(&self, repo: &Path, rev: &str) -> bool;

    /// Id and committer timestamp of `rev`.
    fn commit_info(&self, repo: &Path, rev: &str) -> Result<CommitInfo>;

    /// Most recent commit touching any of `paths`.
    fn last_commit_touching(&self, repo: &Path, paths: &[&str]) -> Result<Option<CommitInfo>>;

    /// Content of `path` at `commit`, `None` if absent.
    fn read_file(&self, repo: &Path, commit: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// Time since the last clone/fetch, `None` if `repo` is not a clone.
    fn repo_age(&self, repo: &Path) -> Option<Duration>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations {
    network_timeout: Duration,
}

impl DefaultGitOperations {
    pub fn new(network_timeout: Duration) -> Self {
        Self { network_timeout }
    }
}

impl Default for DefaultGitOperations {
    fn default() -> Self {
        Self::new(DEFAULT_NETWORK_TIMEOUT)
    }
}

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, branch: &str, depth: u32, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, branch, depth, target_dir, self.network_timeout)
    }

    fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()> {
        crate::git::set_remote_url(repo, url)
    }

    fn has_branch(&self, repo: &Path, branch: &str) -> bool {
        crate::git::has_branch(repo, branch)
    }

    fn remote_url(&self, repo: &Path) -> Option<String> {
        crate::git::remote_url(repo)
    }

    fn current_branch(&self, repo: &Path) -> Option<String> {
        crate::git::current_branch(repo)
    }

    fn track_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        crate::git::track_branch(repo, branch)
    }

    fn fetch_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        crate::git::fetch_branch(repo, branch, self.network_timeout)
    }

    fn reset_hard(&self, repo: &Path, branch: &str) -> Result<()> {
        crate::git::reset_hard(repo, branch)
    }

    fn commit_exists(&self, repo: &Path, rev: &str) -> bool {
        crate::git::commit_exists(repo, rev)
    }

    fn commit_info(&self, repo: &Path, rev: &str) -> Result<CommitInfo> {
        crate::git::commit_info(repo, rev)
    }

    fn last_commit_touching(&self, repo: &Path, paths: &[&str]) -> Result<Option<CommitInfo>> {
        crate::git::last_commit_touching(repo, paths)
    }

    fn read_file(&self, repo: &Path, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
        crate::git::read_file(repo, commit, path)
    }

    fn repo_age(&self, repo: &Path) -> Option<Duration> {
        crate::git::repo_age(repo)
    }
}

/// How cache entries are refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    /// Entries fetched more recently than this are left alone.
    pub freshness: Duration,
    /// Stalled network operations abort after this long.
    pub network_timeout: Duration,
    /// Clone GitHub repositories over SSH instead of HTTPS.
    pub ssh: bool,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            freshness: DEFAULT_FRESHNESS,
            network_timeout: DEFAULT_NETWORK_TIMEOUT,
            ssh: false,
        }
    }
}

/// What a refresh did to a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Cloned,
    Updated,
    /// Refreshed within the freshness window; nothing was fetched.
    Fresh,
}

/// Rewrites a GitHub HTTPS URL into its SSH form.
pub fn ssh_url(url: &str) -> String {
    url.replacen("https://github.com/", "git@github.com:", 1)
}

/// The main entry point for managing the app caches.
pub struct RepositoryManager {
    cache_root: PathBuf,
    git_ops: Box<dyn GitOperations>,
    policy: RefreshPolicy,
}

impl RepositoryManager {
    /// Creates a `RepositoryManager` backed by the system `git`.
    pub fn new(cache_root: PathBuf, policy: RefreshPolicy) -> Self {
        Self {
            cache_root,
            git_ops: Box::new(DefaultGitOperations::new(policy.network_timeout)),
            policy,
        }
    }

    /// Creates a `RepositoryManager` with a custom `GitOperations`
    /// implementation.
    pub fn with_operations(
        cache_root: PathBuf,
        git_ops: Box<dyn GitOperations>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            cache_root,
            git_ops,
            policy,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn git(&self) -> &dyn GitOperations {
        self.git_ops.as_ref()
    }

    /// Cache directory of an app.
    pub fn app_cache_path(&self, app: &str) -> PathBuf {
        self.cache_root.join(app)
    }

    /// Whether the app has a usable clone in the cache.
    pub fn is_cached(&self, app: &str) -> bool {
        self.git_ops.repo_age(&self.app_cache_path(app)).is_some()
    }

    fn remote_url(&self, entry: &CatalogEntry) -> String {
        if self.policy.ssh {
            ssh_url(&entry.url)
        } else {
            entry.url.clone()
        }
    }

    /// Whether the cache at `path` tracks `branch` of `url`.
    fn follows(&self, path: &Path, url: &str, branch: &str) -> bool {
        self.git_ops.remote_url(path).as_deref() == Some(url)
            && self.git_ops.current_branch(path).as_deref() == Some(branch)
    }

    /// Clones the app if it has no cache yet, otherwise brings its cache up
    /// to date with the registry entry.
    pub fn clone_or_update(&self, app: &str, entry: &CatalogEntry) -> Result<RefreshOutcome> {
        let path = self.app_cache_path(app);
        let url = self.remote_url(entry);

        let Some(age) = self.git_ops.repo_age(&path) else {
            let depth = clone_depth(entry.state);
            info!("Cloning {} (depth {})...", app, depth);
            self.git_ops
                .clone_shallow(&url, &entry.branch, depth, &path)?;
            return Ok(RefreshOutcome::Cloned);
        };

        if age < self.policy.freshness {
            if self.follows(&path, &url, &entry.branch) {
                debug!("Skipping {}, it was refreshed {}s ago", app, age.as_secs());
                return Ok(RefreshOutcome::Fresh);
            }
            debug!("{}: cache does not follow {}@{} yet", app, url, entry.branch);
        }

        info!("Updating {}...", app);
        self.git_ops.set_remote_url(&path, &url)?;
        if !self.git_ops.has_branch(&path, &entry.branch) {
            debug!("{}: fetching new branch {}", app, entry.branch);
            self.git_ops.track_branch(&path, &entry.branch)?;
        }
        self.git_ops.fetch_branch(&path, &entry.branch)?;
        self.git_ops.reset_hard(&path, &entry.branch)?;
        Ok(RefreshOutcome::Updated)
    }

    /// Removes every cache entry whose name is not an app of the registry.
    ///
    /// Returns the removed paths. Must only run once no refresh is in
    /// flight, since it inspects the final directory state.
    pub fn cleanup(&self, registry: &Registry) -> Result<Vec<PathBuf>> {
        if !self.cache_root.exists() {
            return Ok(Vec::new());
        }

        let mut removed = Vec::new();
        for entry in WalkDir::new(&self.cache_root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let name = entry.file_name().to_string_lossy();
            if registry.contains(&name) {
                continue;
            }

            warn!("Removing {}...", entry.path().display());
            if entry.file_type().is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
            removed.push(entry.path().to_path_buf());
        }
        Ok(removed)
    }
}
