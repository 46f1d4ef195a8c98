//! # Build Command Implementation
//!
//! Runs a complete catalog build: refresh each app cache, resolve the
//! revision, extract the manifest, and write the `v2`, `v3` and
//! `doc_catalog` views under the output directory.
//!
//! Apps that fail are listed in the summary; they do not make the command
//! fail. Only problems affecting the whole build (unreadable registry,
//! unwritable output) exit non-zero.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use apps_catalog::config::CatalogContext;
use apps_catalog::defaults;
use apps_catalog::output::{bad_count, dim, emoji, good_count, OutputConfig};
use apps_catalog::phases::orchestrator::{self, BuildOptions};
use apps_catalog::repository::RepositoryManager;

use super::RefreshArgs;
use crate::cli::GlobalOptions;

/// Build the catalog views
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Output directory [default: <apps-dir>/builds/default]
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Use the caches as they are, without fetching anything
    #[arg(long)]
    pub no_update_cache: bool,

    #[command(flatten)]
    pub refresh: RefreshArgs,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs, globals: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);
    let start_time = Instant::now();

    let ctx = CatalogContext::load(&globals.apps_dir).with_context(|| {
        format!(
            "Failed to load the registry from {}",
            globals.apps_dir.display()
        )
    })?;
    let output_dir = args
        .output
        .unwrap_or_else(|| defaults::default_output_dir(&globals.apps_dir));

    println!(
        "{} Building catalog of {} apps into {}",
        emoji(&out, "📦", "[BUILD]"),
        ctx.registry.len(),
        dim(&out, &output_dir.display().to_string())
    );

    let manager = RepositoryManager::new(globals.cache_root.clone(), args.refresh.policy(false));
    let catalog = orchestrator::execute_build(
        &ctx,
        &manager,
        &output_dir,
        BuildOptions {
            jobs: args.refresh.jobs(),
            update_cache: !args.no_update_cache,
            cleanup: args.refresh.cleanup,
            progress: !args.refresh.no_progress,
        },
    )
    .with_context(|| format!("Failed to build the catalog into {}", output_dir.display()))?;

    println!(
        "{} {} apps built, {} failed in {:.1}s",
        emoji(&out, "✅", "[OK]"),
        good_count(&out, catalog.len()),
        bad_count(&out, catalog.failed.len()),
        start_time.elapsed().as_secs_f64()
    );
    if !catalog.failed.is_empty() {
        println!(
            "{} Failed apps: {}",
            emoji(&out, "⚠️", "[WARN]"),
            catalog.failed.join(", ")
        );
    }
    Ok(())
}
