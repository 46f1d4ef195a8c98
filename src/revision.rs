//! Revision resolution.
//!
//! An app is built either from a pinned commit, which must exist in the
//! cached history, or from the most recent commit touching its packaging
//! files. The branch tip is not used directly: a commit that only touches CI
//! configuration must not bump the app's `lastUpdate`.

use std::path::Path;

use crate::config::{CatalogEntry, Revision};
use crate::error::{Error, Result};
use crate::repository::GitOperations;

/// Paths whose changes count as an update of the app.
pub const RELEVANT_PATHS: &[&str] = &[
    "manifest.json",
    "manifest.toml",
    "config_panel.toml",
    "hooks/",
    "scripts/",
    "conf/",
    "sources/",
];

/// The commit an app is extracted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRevision {
    pub commit: String,
    /// Committer timestamp, published as `lastUpdate`.
    pub timestamp: i64,
}

/// Picks the commit to extract `app` from.
pub fn resolve(
    git: &dyn GitOperations,
    repo: &Path,
    app: &str,
    entry: &CatalogEntry,
) -> Result<ResolvedRevision> {
    match &entry.revision {
        Revision::Pinned(rev) => {
            if !git.commit_exists(repo, rev) {
                return Err(Error::RevisionNotFound {
                    app: app.to_string(),
                    revision: rev.clone(),
                });
            }
            let info = git.commit_info(repo, rev)?;
            Ok(ResolvedRevision {
                commit: rev.clone(),
                timestamp: info.timestamp,
            })
        }
        Revision::Head => {
            let info = git
                .last_commit_touching(repo, RELEVANT_PATHS)?
                .ok_or_else(|| Error::NoRelevantCommit {
                    app: app.to_string(),
                })?;
            Ok(ResolvedRevision {
                commit: info.id,
                timestamp: info.timestamp,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppState;
    use crate::testing::{commit, git_available, FixtureRepo, MockGitOperations};
    use crate::repository::DefaultGitOperations;
    use tempfile::TempDir;

    fn entry(revision: Revision) -> CatalogEntry {
        let mut entry = CatalogEntry::new("https://example.org/foo_ynh", AppState::Working);
        entry.revision = revision;
        entry
    }

    #[test]
    fn test_pinned_revision_is_returned_unchanged() {
        let git = MockGitOperations::with_history(vec![
            commit("c2", 200),
            commit("c1", 100),
        ]);
        let resolved = resolve(
            &git,
            Path::new("/cache/foo"),
            "foo",
            &entry(Revision::Pinned("c1".to_string())),
        )
        .unwrap();
        assert_eq!(
            resolved,
            ResolvedRevision {
                commit: "c1".to_string(),
                timestamp: 100,
            }
        );
    }

    #[test]
    fn test_pinned_revision_missing_from_history() {
        let git = MockGitOperations::with_history(vec![commit("c1", 100)]);
        let err = resolve(
            &git,
            Path::new("/cache/foo"),
            "foo",
            &entry(Revision::Pinned("deadbeef".to_string())),
        )
        .unwrap_err();

        assert!(matches!(err, Error::RevisionNotFound { .. }));
        let message = err.to_string();
        assert!(message.contains("deadbeef"));
        assert!(message.contains("foo"));
    }

    #[test]
    fn test_head_uses_relevant_commit() {
        let mut git = MockGitOperations::with_history(vec![
            commit("ci-tweak", 300),
            commit("manifest", 200),
        ]);
        git.relevant = Some(commit("manifest", 200));
        let calls = git.calls.clone();

        let resolved = resolve(&git, Path::new("/cache/foo"), "foo", &entry(Revision::Head))
            .unwrap();
        assert_eq!(resolved.commit, "manifest");
        assert_eq!(resolved.timestamp, 200);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].contains("manifest.toml"));
        assert!(calls[0].contains("scripts/"));
    }

    #[test]
    fn test_head_without_relevant_commit() {
        let git = MockGitOperations::with_history(vec![commit("c1", 100)]);
        let err = resolve(&git, Path::new("/cache/foo"), "foo", &entry(Revision::Head))
            .unwrap_err();
        assert!(matches!(err, Error::NoRelevantCommit { .. }));
    }

    #[test]
    fn test_head_skips_ci_only_tip_in_real_repository() {
        if !git_available() {
            return;
        }
        let upstream = FixtureRepo::new();
        let manifest = upstream.commit("manifest.toml", "id = \"foo\"\nname = \"Foo\"\n", "manifest");
        let tip = upstream.commit(".github/workflows/ci.yml", "on: push\n", "ci");
        assert_ne!(manifest, tip);

        let git = DefaultGitOperations::default();
        let resolved = resolve(&git, upstream.path(), "foo", &entry(Revision::Head)).unwrap();
        assert_eq!(resolved.commit, manifest);

        let pinned = resolve(
            &git,
            upstream.path(),
            "foo",
            &entry(Revision::Pinned(tip.clone())),
        )
        .unwrap();
        assert_eq!(pinned.commit, tip);

        let temp = TempDir::new().unwrap();
        let missing = resolve(
            &git,
            temp.path(),
            "foo",
            &entry(Revision::Pinned(tip)),
        );
        assert!(missing.is_err());
    }
}
