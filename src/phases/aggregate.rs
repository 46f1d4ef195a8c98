//! Aggregate pass: build the base catalog.
//!
//! Every registry app goes through the same pipeline on a worker of a
//! dedicated rayon pool:
//!
//! 1. refresh its cache (unless disabled)
//! 2. resolve the revision to build from
//! 3. extract the manifest at that revision
//! 4. assemble a [`BuiltAppRecord`]
//!
//! A failure at any step is caught at the task boundary, logged, and
//! leaves the app out of the catalog. Results are keyed by app id, so the
//! catalog does not depend on completion order.

use std::collections::BTreeMap;

use log::{error, info};
use rayon::prelude::*;

use crate::config::{CatalogContext, CatalogEntry};
use crate::error::{Error, Result};
use crate::manifest;
use crate::record::BuiltAppRecord;
use crate::repository::RepositoryManager;
use crate::revision;

use super::{progress_bar, worker_pool};

/// Knobs of the aggregate pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub jobs: usize,
    /// Refresh each app cache before processing it.
    pub update_cache: bool,
    pub progress: bool,
}

/// The successfully built apps, plus the ids of those that failed.
#[derive(Debug, Default, Clone)]
pub struct BaseCatalog {
    pub apps: BTreeMap<String, BuiltAppRecord>,
    /// Sorted.
    pub failed: Vec<String>,
}

impl BaseCatalog {
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// Runs the per-app pipeline for one app.
pub fn build_app(
    manager: &RepositoryManager,
    app: &str,
    entry: &CatalogEntry,
    update_cache: bool,
) -> Result<BuiltAppRecord> {
    if update_cache {
        manager.clone_or_update(app, entry)?;
    } else if !manager.is_cached(app) {
        return Err(Error::CacheMissing {
            app: app.to_string(),
            path: manager.app_cache_path(app),
        });
    }

    let repo = manager.app_cache_path(app);
    let resolved = revision::resolve(manager.git(), &repo, app, entry)?;
    let (manifest, summary) = manifest::extract(manager.git(), &repo, app, &resolved.commit)?;
    Ok(BuiltAppRecord::build(app, entry, resolved, manifest, summary))
}

/// Builds the record of every registry app, isolating failures.
pub fn build_base_catalog(
    ctx: &CatalogContext,
    manager: &RepositoryManager,
    options: AggregateOptions,
) -> Result<BaseCatalog> {
    let entries = ctx.registry.entries();
    let pool = worker_pool(options.jobs)?;
    let progress = progress_bar(entries.len(), options.progress);

    let results: Vec<(&String, Result<BuiltAppRecord>)> = pool.install(|| {
        entries
            .par_iter()
            .map(|(app, entry)| {
                let result = build_app(manager, app, entry, options.update_cache);
                progress.inc(1);
                (app, result)
            })
            .collect()
    });
    progress.finish_and_clear();

    let mut catalog = BaseCatalog::default();
    for (app, result) in results {
        match result {
            Ok(record) => {
                catalog.apps.insert(app.clone(), record);
            }
            Err(e) => {
                error!("[{}] Error while building the catalog entry: {}", app, e);
                catalog.failed.push(app.clone());
            }
        }
    }
    catalog.failed.sort();

    info!(
        "Built {} apps ({} failed)",
        catalog.apps.len(),
        catalog.failed.len()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppState, Registry, Revision, SideRegistry};
    use crate::repository::RefreshPolicy;
    use crate::testing::{commit, recorded, MockGitOperations};
    use std::path::PathBuf;
    use std::time::Duration;

    const MANIFEST: &str = "packaging_format = 2\nid = \"foo\"\nname = \"Foo\"\n";

    fn context(apps: &[(&str, CatalogEntry)]) -> CatalogContext {
        let entries = apps
            .iter()
            .map(|(app, entry)| (app.to_string(), entry.clone()))
            .collect();
        CatalogContext {
            apps_dir: PathBuf::from("/apps"),
            registry: Registry::from_entries(entries),
            categories: SideRegistry::default(),
            antifeatures: SideRegistry::default(),
        }
    }

    fn working(app: &str) -> CatalogEntry {
        CatalogEntry::new(format!("https://example.org/{}_ynh", app), AppState::Working)
    }

    /// A git double where every app is cached and fresh. The double ignores
    /// the repository path, so all apps share the manifest at commit `c1`.
    fn cached_git(apps: &[&str]) -> MockGitOperations {
        let mut git = MockGitOperations::with_history(vec![commit("c1", 1_700_000_000)])
            .with_file("c1", "manifest.toml", MANIFEST);
        git.relevant = Some(commit("c1", 1_700_000_000));
        for app in apps {
            git.cache(
                PathBuf::from("/mock/cache").join(app),
                Duration::from_secs(5),
                &format!("https://example.org/{}_ynh", app),
                "master",
            );
        }
        git
    }

    fn manager(git: MockGitOperations) -> RepositoryManager {
        RepositoryManager::with_operations(
            PathBuf::from("/mock/cache"),
            Box::new(git),
            RefreshPolicy::default(),
        )
    }

    fn options(update_cache: bool) -> AggregateOptions {
        AggregateOptions {
            jobs: 4,
            update_cache,
            progress: false,
        }
    }

    #[test]
    fn test_builds_every_app() {
        let ctx = context(&[("foo", working("foo"))]);
        let manager = manager(cached_git(&["foo"]));

        let catalog = build_base_catalog(&ctx, &manager, options(true)).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.failed.is_empty());

        let foo = &catalog.apps["foo"];
        assert_eq!(foo.git.revision, "c1");
        assert_eq!(foo.last_update, 1_700_000_000);
        assert_eq!(foo.summary.name, "Foo");
    }

    #[test]
    fn test_one_failure_does_not_affect_the_others() {
        let mut broken = working("bar");
        broken.revision = Revision::Pinned("deadbeef".to_string());
        let ctx = context(&[("foo", working("foo")), ("bar", broken)]);
        let manager = manager(cached_git(&["foo", "bar"]));

        let catalog = build_base_catalog(&ctx, &manager, options(true)).unwrap();
        assert_eq!(catalog.apps.keys().collect::<Vec<_>>(), vec!["foo"]);
        assert_eq!(catalog.failed, vec!["bar"]);
    }

    #[test]
    fn test_results_do_not_depend_on_worker_count() {
        let apps = ["a", "b", "c", "d", "e"];
        let ctx = context(&apps.map(|app| (app, working(app))));

        let serial = build_base_catalog(&ctx, &manager(cached_git(&apps)), AggregateOptions {
            jobs: 1,
            ..options(true)
        })
        .unwrap();
        let parallel = build_base_catalog(&ctx, &manager(cached_git(&apps)), AggregateOptions {
            jobs: 8,
            ..options(true)
        })
        .unwrap();
        assert_eq!(serial.apps, parallel.apps);
    }

    #[test]
    fn test_without_cache_update_requires_a_cache() {
        let ctx = context(&[("foo", working("foo")), ("new", working("new"))]);
        let git = cached_git(&["foo"]);
        let calls = git.calls.clone();
        let manager = manager(git);

        let catalog = build_base_catalog(&ctx, &manager, options(false)).unwrap();
        assert!(catalog.apps.contains_key("foo"));
        assert_eq!(catalog.failed, vec!["new"]);
        assert!(!recorded(&calls).iter().any(|c| c.starts_with("clone")));
    }

    #[test]
    fn test_missing_manifest_is_a_failure() {
        let ctx = context(&[("foo", working("foo"))]);
        let mut git = MockGitOperations::with_history(vec![commit("c1", 1)]);
        git.relevant = Some(commit("c1", 1));
        git.ages
            .insert(PathBuf::from("/mock/cache/foo"), Duration::from_secs(5));

        let err = build_app(&manager(git), "foo", &ctx.registry.entries()["foo"], true).unwrap_err();
        assert!(matches!(err, Error::ManifestMissing { .. }));
    }
}
