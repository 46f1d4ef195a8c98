//! # Lint Command Implementation
//!
//! Checks the registry without touching any repository. Exits non-zero
//! when at least one error is found; warnings alone do not fail.

use anyhow::{Context, Result};
use clap::Args;

use apps_catalog::config::CatalogContext;
use apps_catalog::lint::{self, Severity};
use apps_catalog::output::{bad_count, emoji, OutputConfig};

use crate::cli::GlobalOptions;

/// Check the registry
#[derive(Args, Debug)]
pub struct LintArgs {}

/// Execute the `lint` command.
pub fn execute(_args: LintArgs, globals: &GlobalOptions) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(&globals.color);

    let ctx = CatalogContext::load(&globals.apps_dir).with_context(|| {
        format!(
            "Failed to load the registry from {}",
            globals.apps_dir.display()
        )
    })?;
    let report = lint::lint(&ctx);

    let mut current_app: Option<&str> = None;
    for finding in &report.findings {
        if current_app != Some(finding.app.as_str()) {
            println!("{}:", finding.app);
            current_app = Some(finding.app.as_str());
        }
        let marker = match finding.severity {
            Severity::Error => emoji(&out, "❌", "[ERR]"),
            Severity::Warning => emoji(&out, "⚠️", "[WARN]"),
        };
        println!("  {} {}: {}", marker, finding.severity, finding.message);
    }

    if report.is_clean() {
        println!(
            "{} {} registry entries checked, no problem found",
            emoji(&out, "✅", "[OK]"),
            ctx.registry.len()
        );
        return Ok(());
    }

    println!(
        "\n{} errors, {} warnings",
        bad_count(&out, report.error_count()),
        report.warning_count()
    );
    if report.has_errors() {
        anyhow::bail!("The registry has {} errors", report.error_count());
    }
    Ok(())
}
