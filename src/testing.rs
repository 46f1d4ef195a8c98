//! Fixture git repositories and a scriptable git double for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::git::CommitInfo;
use crate::repository::GitOperations;

/// Whether a `git` binary is available to run fixture-backed tests.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.name=Catalog Tests", "-c", "user.email=tests@example.org"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A throwaway upstream repository on branch `master`.
pub struct FixtureRepo {
    _dir: TempDir,
    path: PathBuf,
}

impl FixtureRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upstream");
        fs::create_dir_all(&path).unwrap();
        git(&path, &["init", "--quiet"]);
        git(&path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    /// Writes `file` and commits it, returning the new commit id.
    pub fn commit(&self, file: &str, content: &str, message: &str) -> String {
        let target = self.path.join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&target, content).unwrap();
        git(&self.path, &["add", "--all"]);
        git(&self.path, &["commit", "--quiet", "-m", message]);
        git(&self.path, &["rev-parse", "HEAD"])
    }
}

/// Scriptable `GitOperations` recording every call it receives.
#[derive(Default)]
pub struct MockGitOperations {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub ages: HashMap<PathBuf, Duration>,
    /// Repository -> URL of `origin`.
    pub remotes: HashMap<PathBuf, String>,
    /// Repository -> checked-out branch.
    pub heads: HashMap<PathBuf, String>,
    /// History reachable from `HEAD`, newest first.
    pub history: Vec<CommitInfo>,
    /// Commit returned for the relevant-paths query.
    pub relevant: Option<CommitInfo>,
    /// `(commit, path)` -> content.
    pub files: HashMap<(String, String), Vec<u8>>,
    pub known_branches: Vec<String>,
    pub fail_clone: bool,
}

impl MockGitOperations {
    pub fn with_history(history: Vec<CommitInfo>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn with_file(mut self, commit: &str, path: &str, content: &str) -> Self {
        self.files.insert(
            (commit.to_string(), path.to_string()),
            content.as_bytes().to_vec(),
        );
        self
    }

    /// Marks `repo` as a clone of `url` on `branch`, fetched `age` ago.
    pub fn cache(&mut self, repo: impl Into<PathBuf>, age: Duration, url: &str, branch: &str) {
        let repo = repo.into();
        self.ages.insert(repo.clone(), age);
        self.remotes.insert(repo.clone(), url.to_string());
        self.heads.insert(repo, branch.to_string());
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl GitOperations for MockGitOperations {
    fn clone_shallow(
        &self,
        url: &str,
        branch: &str,
        depth: u32,
        _target_dir: &Path,
    ) -> Result<()> {
        self.record(format!("clone {} {} {}", url, branch, depth));
        if self.fail_clone {
            return Err(Error::GitClone {
                url: url.to_string(),
                branch: branch.to_string(),
                message: "repository not found".to_string(),
            });
        }
        Ok(())
    }

    fn set_remote_url(&self, _repo: &Path, url: &str) -> Result<()> {
        self.record(format!("set-url {}", url));
        Ok(())
    }

    fn has_branch(&self, _repo: &Path, branch: &str) -> bool {
        self.known_branches.iter().any(|b| b == branch)
    }

    fn remote_url(&self, repo: &Path) -> Option<String> {
        self.remotes.get(repo).cloned()
    }

    fn current_branch(&self, repo: &Path) -> Option<String> {
        self.heads.get(repo).cloned()
    }

    fn track_branch(&self, _repo: &Path, branch: &str) -> Result<()> {
        self.record(format!("track {}", branch));
        Ok(())
    }

    fn fetch_branch(&self, _repo: &Path, branch: &str) -> Result<()> {
        self.record(format!("fetch {}", branch));
        Ok(())
    }

    fn reset_hard(&self, _repo: &Path, branch: &str) -> Result<()> {
        self.record(format!("reset {}", branch));
        Ok(())
    }

    fn commit_exists(&self, _repo: &Path, rev: &str) -> bool {
        self.history.iter().any(|c| c.id == rev)
    }

    fn commit_info(&self, repo: &Path, rev: &str) -> Result<CommitInfo> {
        let found = if rev == "HEAD" {
            self.history.first()
        } else {
            self.history.iter().find(|c| c.id == rev)
        };
        found.cloned().ok_or_else(|| Error::GitCommand {
            command: format!("log -1 {}", rev),
            repo: repo.to_path_buf(),
            stderr: "unknown revision".to_string(),
        })
    }

    fn last_commit_touching(
        &self,
        _repo: &Path,
        paths: &[&str],
    ) -> Result<Option<CommitInfo>> {
        self.record(format!("log-paths {}", paths.join(",")));
        Ok(self.relevant.clone())
    }

    fn read_file(
        &self,
        _repo: &Path,
        commit: &str,
        path: &str,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self
            .files
            .get(&(commit.to_string(), path.to_string()))
            .cloned())
    }

    fn repo_age(&self, repo: &Path) -> Option<Duration> {
        self.ages.get(repo).copied()
    }
}

/// Snapshot of the calls recorded through a shared handle.
pub fn recorded(calls: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// Shorthand for a `CommitInfo`.
pub fn commit(id: &str, timestamp: i64) -> CommitInfo {
    CommitInfo {
        id: id.to_string(),
        timestamp,
    }
}
