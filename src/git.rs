//! Thin wrappers over the system `git` command.
//!
//! Using the CLI rather than a library binding means SSH keys, credential
//! helpers and anything configured in `~/.gitconfig` keep working. Every
//! command runs with `GIT_TERMINAL_PROMPT=0` so a missing credential fails
//! instead of waiting on a prompt, and network commands abort when the
//! transfer stalls for longer than the configured timeout.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, SystemTime};

use crate::error::{Error, Result};

/// A commit id together with its committer timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub id: String,
    pub timestamp: i64,
}

fn git_command(repo: Option<&Path>) -> Command {
    let mut cmd = Command::new("git");
    if let Some(repo) = repo {
        cmd.arg("-C").arg(repo);
    }
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Adds the low-speed abort settings bounding a network operation.
fn with_network_timeout(cmd: &mut Command, timeout: Duration) {
    let secs = timeout.as_secs().max(1);
    cmd.args(["-c", "http.lowSpeedLimit=1000"])
        .arg("-c")
        .arg(format!("http.lowSpeedTime={}", secs));
}

fn run(repo: &Path, mut cmd: Command, description: &str) -> Result<Output> {
    let output = cmd.output().map_err(|e| Error::GitCommand {
        command: description.to_string(),
        repo: repo.to_path_buf(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: description.to_string(),
            repo: repo.to_path_buf(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

fn run_in(repo: &Path, args: &[&str]) -> Result<String> {
    let mut cmd = git_command(Some(repo));
    cmd.args(args);
    let output = run(repo, cmd, &args.join(" "))?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Shallow, single-branch clone of `url` at `branch` into `target_dir`.
///
/// Any existing `target_dir` is removed first, and a failed clone leaves no
/// directory behind.
pub fn clone_shallow(
    url: &str,
    branch: &str,
    depth: u32,
    target_dir: &Path,
    timeout: Duration,
) -> Result<()> {
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut cmd = git_command(None);
    with_network_timeout(&mut cmd, timeout);
    cmd.args(["clone", "--quiet", "--single-branch"])
        .arg(format!("--depth={}", depth))
        .args(["--branch", branch, url])
        .arg(target_dir);

    let output = cmd.output().map_err(|e| Error::GitClone {
        url: url.to_string(),
        branch: branch.to_string(),
        message: e.to_string(),
    })?;

    if !output.status.success() {
        if target_dir.exists() {
            fs::remove_dir_all(target_dir)?;
        }
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("could not read Username")
        {
            format!(
                "Authentication failed. The repository may be private or may have moved.\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            branch: branch.to_string(),
            message,
        });
    }

    Ok(())
}

/// Points `origin` at `url`.
pub fn set_remote_url(repo: &Path, url: &str) -> Result<()> {
    run_in(repo, &["remote", "set-url", "origin", url]).map(|_| ())
}

/// Whether `origin/<branch>` is known locally.
pub fn has_branch(repo: &Path, branch: &str) -> bool {
    let reference = format!("refs/remotes/origin/{}", branch);
    run_in(repo, &["rev-parse", "--verify", "--quiet", &reference]).is_ok()
}

/// URL of `origin`, `None` when it cannot be read.
pub fn remote_url(repo: &Path) -> Option<String> {
    run_in(repo, &["remote", "get-url", "origin"]).ok()
}

/// Short name of the checked-out branch, `None` on a detached `HEAD`.
pub fn current_branch(repo: &Path) -> Option<String> {
    run_in(repo, &["symbolic-ref", "--quiet", "--short", "HEAD"]).ok()
}

/// Adds `branch` to the branches fetched from `origin`.
pub fn track_branch(repo: &Path, branch: &str) -> Result<()> {
    run_in(repo, &["remote", "set-branches", "--add", "origin", branch]).map(|_| ())
}

/// Force-fetches `branch` from `origin` into `origin/<branch>`.
pub fn fetch_branch(repo: &Path, branch: &str, timeout: Duration) -> Result<()> {
    let refspec = format!("+refs/heads/{0}:refs/remotes/origin/{0}", branch);
    let mut cmd = git_command(Some(repo));
    with_network_timeout(&mut cmd, timeout);
    cmd.args(["fetch", "--quiet", "--force", "origin", &refspec]);
    run(repo, cmd, &format!("fetch --force origin {}", refspec)).map(|_| ())
}

/// Checks out `branch` reset to the fetched `origin/<branch>`, discarding
/// any local modification.
pub fn reset_hard(repo: &Path, branch: &str) -> Result<()> {
    let remote_ref = format!("refs/remotes/origin/{}", branch);
    run_in(repo, &["checkout", "--quiet", "--force", "-B", branch, &remote_ref])?;
    run_in(repo, &["reset", "--quiet", "--hard", &remote_ref]).map(|_| ())
}

/// Whether `rev` names a commit present in the local history.
pub fn commit_exists(repo: &Path, rev: &str) -> bool {
    let spec = format!("{}^{{commit}}", rev);
    run_in(repo, &["rev-parse", "--verify", "--quiet", &spec]).is_ok()
}

fn parse_commit_line(line: &str) -> Option<CommitInfo> {
    let (id, timestamp) = line.trim().split_once(' ')?;
    Some(CommitInfo {
        id: id.to_string(),
        timestamp: timestamp.trim().parse().ok()?,
    })
}

/// Id and committer timestamp of `rev`.
pub fn commit_info(repo: &Path, rev: &str) -> Result<CommitInfo> {
    let stdout = run_in(repo, &["log", "-1", "--format=%H %ct", rev, "--"])?;
    parse_commit_line(&stdout).ok_or_else(|| Error::GitCommand {
        command: format!("log -1 {}", rev),
        repo: repo.to_path_buf(),
        stderr: format!("unexpected output: {}", stdout),
    })
}

/// Most recent commit reachable from `HEAD` touching any of `paths`.
pub fn last_commit_touching(repo: &Path, paths: &[&str]) -> Result<Option<CommitInfo>> {
    let mut args = vec!["log", "-1", "--format=%H %ct", "HEAD", "--"];
    args.extend_from_slice(paths);
    let stdout = run_in(repo, &args)?;
    if stdout.is_empty() {
        return Ok(None);
    }
    Ok(parse_commit_line(&stdout))
}

/// Content of `path` at `commit`, or `None` when the file does not exist
/// there.
pub fn read_file(repo: &Path, commit: &str, path: &str) -> Result<Option<Vec<u8>>> {
    let object = format!("{}:{}", commit, path);
    if run_in(repo, &["cat-file", "-e", &object]).is_err() {
        return Ok(None);
    }

    let mut cmd = git_command(Some(repo));
    cmd.args(["cat-file", "blob", &object]);
    let output = run(repo, cmd, &format!("cat-file blob {}", object))?;
    Ok(Some(output.stdout))
}

/// Time elapsed since the working copy was last cloned or fetched, or `None`
/// when `repo` is not a git working copy.
pub fn repo_age(repo: &Path) -> Option<Duration> {
    let git_dir = repo.join(".git");
    ["FETCH_HEAD", "HEAD"]
        .iter()
        .map(|marker| git_dir.join(marker))
        .find(|marker| marker.exists())
        .and_then(|marker| fs::metadata(marker).ok())
        .and_then(|metadata| metadata.modified().ok())
        .map(|modified| {
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO)
        })
}
