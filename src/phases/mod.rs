//! The passes of a catalog build.
//!
//! ## Overview
//!
//! A build runs these passes in order:
//! 1. Refresh - bring every app cache up to date, in parallel, then
//!    optionally remove cache entries for apps no longer in the registry
//! 2. Aggregate - resolve, extract and record every app, in parallel,
//!    isolating per-app failures
//! 3. Write - project the base catalog into the versioned views
//!
//! The aggregate pass can refresh each app right before processing it, so a
//! `build` does not need a separate refresh pass; the `cache` command runs
//! the refresh pass alone.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Error, Result};

pub mod aggregate;
pub mod orchestrator;
pub mod refresh;
pub mod write;

/// A dedicated pool with `jobs` workers (at least one).
pub(crate) fn worker_pool(jobs: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .thread_name(|i| format!("catalog-worker-{}", i))
        .build()
        .map_err(|e| Error::WorkerPool {
            message: e.to_string(),
        })
}

/// A completed/total progress bar, hidden when `enabled` is false.
pub(crate) fn progress_bar(len: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_has_at_least_one_thread() {
        assert_eq!(worker_pool(0).unwrap().current_num_threads(), 1);
        assert_eq!(worker_pool(3).unwrap().current_num_threads(), 3);
    }

    #[test]
    fn test_disabled_progress_is_hidden() {
        let bar = progress_bar(10, false);
        assert!(bar.is_hidden());
        bar.inc(1);
        bar.finish_and_clear();
    }
}
