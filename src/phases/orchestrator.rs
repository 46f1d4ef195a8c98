//! Orchestrator for a complete catalog build
//!
//! This module chains the passes into the single entry point used by the
//! `build` command.

use std::path::Path;

use log::info;

use super::aggregate::{self, AggregateOptions, BaseCatalog};
use super::write;
use crate::config::CatalogContext;
use crate::error::Result;
use crate::repository::RepositoryManager;

/// Options of a complete build.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub jobs: usize,
    pub update_cache: bool,
    /// Remove cache entries of apps no longer in the registry once every
    /// app has been processed.
    pub cleanup: bool,
    pub progress: bool,
}

/// Builds the base catalog and writes every view to `output_dir`.
///
/// Per-app failures are reported in the returned catalog; only failures
/// that affect the whole build are returned as errors.
pub fn execute_build(
    ctx: &CatalogContext,
    manager: &RepositoryManager,
    output_dir: &Path,
    options: BuildOptions,
) -> Result<BaseCatalog> {
    let catalog = aggregate::build_base_catalog(
        ctx,
        manager,
        AggregateOptions {
            jobs: options.jobs,
            update_cache: options.update_cache,
            progress: options.progress,
        },
    )?;

    if options.cleanup {
        let removed = manager.cleanup(&ctx.registry)?;
        info!("Removed {} stale cache entries", removed.len());
    }

    write::execute(&catalog, ctx, output_dir)?;
    Ok(catalog)
}
