//! # Apps Catalog Library
//!
//! This library builds the app catalog of a self-hosting platform from the
//! hand-maintained registry and one git repository per app. It backs the
//! `apps-catalog` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use apps_catalog::config::{AppState, DocumentFormat, Registry, Revision};
//!
//! let registry = Registry::parse(
//!     r#"
//! [nextcloud]
//! url = "https://github.com/YunoHost-Apps/nextcloud_ynh"
//! state = "working"
//! level = 8
//! "#,
//!     DocumentFormat::Toml,
//!     Path::new("apps.toml"),
//! )
//! .unwrap();
//!
//! let entry = registry.get("nextcloud").unwrap();
//! assert_eq!(entry.state, AppState::Working);
//! assert_eq!(entry.branch, "master");
//! assert_eq!(entry.revision, Revision::Head);
//! ```
//!
//! ## Core Concepts
//!
//! - **Registry (`config`)**: the app entries plus the category and
//!   antifeature side registries, gathered in a `CatalogContext`.
//! - **App cache (`repository`, `git`)**: one shallow clone per app, kept up
//!   to date through the `GitOperations` trait.
//! - **Revisions (`revision`)**: which commit an app is built from.
//! - **Manifests (`manifest`)**: the app metadata read at that commit, in
//!   either schema generation.
//! - **Records (`record`)**: the per-app output of a build.
//! - **Passes (`phases`)**: refresh, aggregate and write, chained by
//!   `phases::orchestrator`.
//!
//! ## Execution Flow
//!
//! 1. Load the `CatalogContext` once.
//! 2. For every app, in parallel: refresh its cache, resolve the revision,
//!    extract the manifest and build its record. A failing app is logged and
//!    left out; it never aborts the build.
//! 3. Write the `v2`, `v3` and `doc_catalog` views.

pub mod config;
pub mod defaults;
pub mod duration;
pub mod error;
pub mod git;
pub mod lint;
pub mod manifest;
pub mod output;
pub mod phases;
pub mod record;
pub mod repository;
pub mod revision;

#[cfg(test)]
mod testing;
