//! # Apps Catalog CLI
//!
//! This is the binary entry point for the `apps-catalog` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Turning fatal errors into a non-zero exit status.
//!
//! The catalog logic lives in the `apps_catalog` library crate; the binary
//! is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
