//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use apps_catalog::defaults;

use crate::commands;

/// Apps Catalog - Build the app catalog from the per-app git repositories
#[derive(Parser, Debug)]
#[command(name = "apps-catalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Directory holding apps.toml, categories.toml, antifeatures.toml and logos/
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "YNH_APPS_DIR",
        default_value = "."
    )]
    apps_dir: PathBuf,

    /// Root of the per-app git caches [default: <apps-dir>/.apps_cache]
    #[arg(long, global = true, value_name = "DIR", env = "YNH_APPS_CACHE")]
    cache_root: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the catalog views from the registry and the app repositories
    Build(commands::build::BuildArgs),
    /// Refresh the app caches without building anything
    Cache(commands::cache::CacheArgs),
    /// Check the registry against the categories, antifeatures and naming rules
    Lint(commands::lint::LintArgs),
    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub apps_dir: PathBuf,
    pub cache_root: PathBuf,
    pub color: String,
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running embedded; keep it.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let cache_root = self
            .cache_root
            .unwrap_or_else(|| defaults::default_cache_root(&self.apps_dir));
        let globals = GlobalOptions {
            apps_dir: self.apps_dir,
            cache_root,
            color: self.color,
        };

        match self.command {
            Commands::Build(args) => commands::build::execute(args, &globals),
            Commands::Cache(args) => commands::cache::execute(args, &globals),
            Commands::Lint(args) => commands::lint::execute(args, &globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
