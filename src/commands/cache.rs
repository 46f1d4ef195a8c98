//! # Cache Command Implementation
//!
//! Refreshes every app cache without building the catalog, so that a later
//! `build --no-update-cache` works offline. With `--cleanup`, caches of apps
//! that left the registry are removed once all refreshes are done.

use anyhow::{Context, Result};
use clap::Args;

use apps_catalog::config::Registry;
use apps_catalog::output::{bad_count, dim, emoji, good_count, OutputConfig};
use apps_catalog::phases::refresh::{self, RefreshOptions};
use apps_catalog::repository::RepositoryManager;

use super::RefreshArgs;
use crate::cli::GlobalOptions;

/// Refresh the app caches
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Clone GitHub repositories over SSH instead of HTTPS
    #[arg(long)]
    pub ssh: bool,

    #[command(flatten)]
    pub refresh: RefreshArgs,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs, globals: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);

    let registry = Registry::load(&globals.apps_dir).with_context(|| {
        format!(
            "Failed to load the registry from {}",
            globals.apps_dir.display()
        )
    })?;

    println!(
        "{} Refreshing {} app caches in {}",
        emoji(&out, "🔄", "[SYNC]"),
        registry.len(),
        dim(&out, &globals.cache_root.display().to_string())
    );

    let manager = RepositoryManager::new(globals.cache_root.clone(), args.refresh.policy(args.ssh));
    let summary = refresh::execute(
        &registry,
        &manager,
        RefreshOptions {
            jobs: args.refresh.jobs(),
            cleanup: args.refresh.cleanup,
            progress: !args.refresh.no_progress,
        },
    )
    .context("Failed to refresh the app caches")?;

    println!(
        "{} {} cloned, {} updated, {} already fresh, {} failed",
        emoji(&out, "✅", "[OK]"),
        good_count(&out, summary.cloned),
        good_count(&out, summary.updated),
        summary.fresh,
        bad_count(&out, summary.failed.len())
    );
    for path in &summary.removed {
        println!(
            "{} Removed {}",
            emoji(&out, "🗑️", "[DEL]"),
            dim(&out, &path.display().to_string())
        );
    }
    if !summary.failed.is_empty() {
        println!(
            "{} Failed apps: {}",
            emoji(&out, "⚠️", "[WARN]"),
            summary.failed.join(", ")
        );
    }
    Ok(())
}
