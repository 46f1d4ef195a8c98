//! # CLI Command Implementations
//!
//! Each subcommand of `apps-catalog` lives in its own file, with:
//! - an `Args` struct deriving `clap::Args`
//! - an `execute` function calling into the `apps_catalog` library
//!
//! Options shared by the commands that touch the app caches are grouped in
//! [`RefreshArgs`] and flattened into each of them.

use std::time::Duration;

use clap::Args;

use apps_catalog::defaults;
use apps_catalog::duration::parse_duration;
use apps_catalog::repository::RefreshPolicy;

pub mod build;
pub mod cache;
pub mod completions;
pub mod lint;

/// Cache refresh options.
#[derive(Args, Debug, Clone)]
pub struct RefreshArgs {
    /// Number of apps processed in parallel [default: number of CPUs]
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Leave alone caches fetched within this window (e.g. 30m, 1h; 0 to always fetch)
    #[arg(long, value_name = "DURATION", default_value = "1h", value_parser = parse_duration)]
    pub fresh_within: Duration,

    /// Abort a git transfer stalled for this long
    #[arg(long, value_name = "DURATION", default_value = "5m", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Remove caches of apps that are no longer in the registry
    #[arg(long)]
    pub cleanup: bool,

    /// Do not display the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl RefreshArgs {
    pub fn jobs(&self) -> usize {
        self.jobs.unwrap_or_else(defaults::default_jobs)
    }

    pub fn policy(&self, ssh: bool) -> RefreshPolicy {
        RefreshPolicy {
            freshness: self.fresh_within,
            network_timeout: self.timeout,
            ssh,
        }
    }
}
