//! Shared test utilities for the CLI E2E tests.
//!
//! A [`TestFixture`] is an apps directory (registry, side registries, logos)
//! in a temporary directory, next to which upstream app repositories can be
//! created with the system `git`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     if !git_available() {
//!         return;
//!     }
//!     let fixture = TestFixture::new().with_side_registries();
//!     let foo = fixture.upstream("foo");
//!     foo.commit("manifest.json", manifests::LEGACY_FOO, "init");
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    #[allow(unused_imports)]
    pub use super::{git_available, read_json, working_entry, TestFixture};
}

/// Manifest snippets for upstream repositories.
#[allow(dead_code)]
pub mod manifests {
    /// Legacy JSON manifest of app `foo`.
    pub const LEGACY_FOO: &str = r#"{
    "id": "foo",
    "name": "Foo",
    "packaging_format": 1,
    "description": {"en": "The foo app"},
    "version": "1.0~ynh1",
    "maintainer": {"name": "alice"},
    "arguments": {"install": [{"name": "domain", "type": "domain"}]}
}"#;

    /// Current TOML manifest of app `bar`.
    pub const CURRENT_BAR: &str = r#"packaging_format = 2
id = "bar"
name = "Bar"
description.en = "The bar app"
version = "2.0~ynh1"
maintainers = ["bob"]

[install.domain]
type = "domain"

[resources.system_user]
"#;

    pub const CATEGORIES: &str = r#"[office]
title.en = "Office"

[office.subtags.wiki]
title.en = "Wiki"
"#;

    pub const ANTIFEATURES: &str = r#"[ads]
title.en = "Advertising"
"#;
}

/// Whether a `git` binary is available; tests needing repositories return
/// early otherwise.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Parses a JSON file.
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&content).expect("Invalid JSON")
}

fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(["-c", "user.name=Catalog Tests", "-c", "user.email=tests@example.org"])
        .args(["-c", "commit.gpgsign=false"])
        .args(args)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// An upstream app repository on branch `master`.
pub struct UpstreamRepo {
    path: PathBuf,
}

impl UpstreamRepo {
    /// `file://` URL, so shallow clones work.
    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    /// Creates `branch` at the current commit and checks it out.
    pub fn branch(&self, branch: &str) {
        git(&self.path, &["checkout", "--quiet", "-b", branch]);
    }

    /// Writes `file`, commits it, and returns the commit id.
    pub fn commit(&self, file: &str, content: &str, message: &str) -> String {
        let target = self.path.join(file);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&target, content).expect("Failed to write file");
        git(&self.path, &["add", "--all"]);
        git(&self.path, &["commit", "--quiet", "-m", message]);
        git(&self.path, &["rev-parse", "HEAD"])
    }
}

/// A temporary apps directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `categories.toml` and `antifeatures.toml`.
    pub fn with_side_registries(self) -> Self {
        self.with_file("categories.toml", manifests::CATEGORIES)
            .with_file("antifeatures.toml", manifests::ANTIFEATURES)
    }

    /// Writes `apps.toml`.
    pub fn with_registry(self, content: &str) -> Self {
        self.with_file("apps.toml", content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    #[allow(dead_code)]
    pub fn with_binary_file(self, path: &str, content: &[u8]) -> Self {
        self.temp_dir
            .child(path)
            .write_binary(content)
            .expect("Failed to write binary file");
        self
    }

    /// Creates an empty upstream repository `<app>_ynh` outside the apps
    /// directory layout.
    pub fn upstream(&self, app: &str) -> UpstreamRepo {
        let path = self.temp_dir.path().join("upstream").join(format!("{}_ynh", app));
        fs::create_dir_all(&path).expect("Failed to create upstream directory");
        git(&path, &["init", "--quiet"]);
        git(&path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        UpstreamRepo { path }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Default cache root of this apps directory.
    #[allow(dead_code)]
    pub fn cache_root(&self) -> PathBuf {
        self.path().join(".apps_cache")
    }

    /// Default build output directory.
    #[allow(dead_code)]
    pub fn output(&self) -> PathBuf {
        self.path().join("builds/default")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running against this apps directory, isolated from the
    /// caller's environment.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("apps-catalog");
        cmd.current_dir(self.path())
            .env_remove("YNH_APPS_DIR")
            .env_remove("YNH_APPS_CACHE")
            .env_remove("RUST_LOG")
            .arg("--apps-dir")
            .arg(self.path())
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry entry for a working app in category `office`.
#[allow(dead_code)]
pub fn working_entry(app: &str, url: &str, extra: &str) -> String {
    format!(
        "[{}]\nurl = \"{}\"\nstate = \"working\"\ncategory = \"office\"\n{}\n",
        app, url, extra
    )
}
