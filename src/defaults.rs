//! Default values for the catalog builder.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::AppState;

/// Name of the cache directory inside the apps directory.
pub const CACHE_DIR_NAME: &str = ".apps_cache";

/// Branch used when a registry entry does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Sentinel revision meaning "most recent relevant commit".
pub const HEAD_REVISION: &str = "HEAD";

/// Cache entries refreshed more recently than this are not fetched again.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(3600);

/// Network git operations abort when stalled for this long.
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(300);

/// Returns the default cache root for an apps directory.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `YNH_APPS_CACHE` environment variable.
pub fn default_cache_root(apps_dir: &Path) -> PathBuf {
    apps_dir.join(CACHE_DIR_NAME)
}

/// Returns the default build output directory for an apps directory.
pub fn default_output_dir(apps_dir: &Path) -> PathBuf {
    apps_dir.join("builds").join("default")
}

/// Returns the default number of parallel jobs (the available CPU count).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Clone depth for an app, tuned by its lifecycle state.
///
/// Apps that do not work need little history; apps in progress need a bit
/// more to find their last relevant commit.
pub fn clone_depth(state: AppState) -> u32 {
    match state {
        AppState::NotWorking => 5,
        AppState::InProgress => 20,
        AppState::Working => 40,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root() {
        let cache_root = default_cache_root(Path::new("/srv/apps"));
        assert_eq!(cache_root, PathBuf::from("/srv/apps/.apps_cache"));
    }

    #[test]
    fn test_default_output_dir() {
        let output = default_output_dir(Path::new("/srv/apps"));
        assert_eq!(output, PathBuf::from("/srv/apps/builds/default"));
    }

    #[test]
    fn test_default_jobs_is_positive() {
        assert!(default_jobs() >= 1);
    }

    #[test]
    fn test_clone_depth_by_state() {
        assert_eq!(clone_depth(AppState::NotWorking), 5);
        assert_eq!(clone_depth(AppState::InProgress), 20);
        assert_eq!(clone_depth(AppState::Working), 40);
    }
}
