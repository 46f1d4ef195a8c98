//! # Error Handling
//!
//! This module defines the centralized error type for the catalog builder. It
//! uses `thiserror` to derive a descriptive `Error` enum covering every failure
//! mode of the library, each variant carrying the context (app identifier,
//! path, git command) needed to act on it.
//!
//! Errors fall into two groups:
//!
//! - **Fatal to the run**: the registry or one of the side registries cannot
//!   be loaded (`RegistryRead`, `RegistryParse`), or an output artifact
//!   cannot be written.
//! - **Fatal to one app**: clone/fetch failures, revision validation
//!   failures, missing or malformed manifests. These are caught at the task
//!   boundary of the aggregator and never abort the whole build.
//!
//! The `Result` type alias is used throughout the library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for catalog operations
#[derive(Error, Debug)]
pub enum Error {
    /// A registry document (apps, categories, antifeatures) could not be read.
    #[error("Cannot read registry {}: {message}", path.display())]
    RegistryRead { path: PathBuf, message: String },

    /// A registry document exists but is not a valid TOML/JSON document.
    #[error("Registry parsing error in {}: {message}", path.display())]
    RegistryParse { path: PathBuf, message: String },

    /// A single registry entry does not follow the expected schema.
    ///
    /// Loading continues with the other entries.
    #[error("Invalid registry entry '{app}': {message}")]
    InvalidEntry { app: String, message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}@{branch}: {message}")]
    GitClone {
        url: String,
        branch: String,
        message: String,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {}: {command} - {stderr}", repo.display())]
    GitCommand {
        command: String,
        repo: PathBuf,
        stderr: String,
    },

    /// The app has no cache entry to read from.
    #[error("No cache yet for {app} (expected {})", path.display())]
    CacheMissing { app: String, path: PathBuf },

    /// A pinned revision is not part of the cached history.
    #[error("Revision {revision} of {app} is not in the repository history")]
    RevisionNotFound { app: String, revision: String },

    /// No commit touches any of the manifest-relevant paths.
    #[error("No commit of {app} touches the packaging files")]
    NoRelevantCommit { app: String },

    /// Neither manifest file exists at the resolved commit.
    #[error("No manifest found for {app} at {commit}")]
    ManifestMissing { app: String, commit: String },

    /// The manifest exists but cannot be parsed.
    #[error("Cannot parse {file} of {app}: {message}")]
    ManifestParse {
        app: String,
        file: String,
        message: String,
    },

    /// The manifest parsed but lacks required fields.
    #[error("Invalid manifest for {app}: {message}")]
    ManifestInvalid { app: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An error indicating that the worker pool could not be created.
    #[error("Cannot start worker pool: {message}")]
    WorkerPool { message: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
