//! Refresh pass: bring every app cache up to date.
//!
//! Each app owns its cache directory, so refreshes run in parallel without
//! coordination. A failing app is logged and counted; it never stops the
//! others. Cleanup of stale entries runs only once every refresh is done.

use std::path::PathBuf;

use log::{error, info};
use rayon::prelude::*;

use crate::config::Registry;
use crate::error::Result;
use crate::repository::{RefreshOutcome, RepositoryManager};

use super::{progress_bar, worker_pool};

/// Knobs of the refresh pass.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    pub jobs: usize,
    /// Remove cache entries of apps that left the registry.
    pub cleanup: bool,
    pub progress: bool,
}

/// What the refresh pass did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub cloned: usize,
    pub updated: usize,
    pub fresh: usize,
    /// Apps whose refresh failed, sorted.
    pub failed: Vec<String>,
    /// Cache entries removed by cleanup.
    pub removed: Vec<PathBuf>,
}

/// Refreshes the cache of every registry app.
pub fn execute(
    registry: &Registry,
    manager: &RepositoryManager,
    options: RefreshOptions,
) -> Result<RefreshSummary> {
    let pool = worker_pool(options.jobs)?;
    let progress = progress_bar(registry.len(), options.progress);

    let outcomes: Vec<(&String, Result<RefreshOutcome>)> = pool.install(|| {
        registry
            .entries()
            .par_iter()
            .map(|(app, entry)| {
                let outcome = manager.clone_or_update(app, entry);
                progress.inc(1);
                (app, outcome)
            })
            .collect()
    });
    progress.finish_and_clear();

    let mut summary = RefreshSummary::default();
    for (app, outcome) in outcomes {
        match outcome {
            Ok(RefreshOutcome::Cloned) => summary.cloned += 1,
            Ok(RefreshOutcome::Updated) => summary.updated += 1,
            Ok(RefreshOutcome::Fresh) => summary.fresh += 1,
            Err(e) => {
                error!("[{}] Failed to update the cache: {}", app, e);
                summary.failed.push(app.clone());
            }
        }
    }
    summary.failed.sort();

    if options.cleanup {
        summary.removed = manager.cleanup(registry)?;
    }

    info!(
        "Cache refreshed: {} cloned, {} updated, {} fresh, {} failed",
        summary.cloned,
        summary.updated,
        summary.fresh,
        summary.failed.len()
    );
    Ok(summary)
}
