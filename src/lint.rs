//! Registry linter.
//!
//! Checks every registry entry against the side registries and the naming
//! conventions of app repositories. Errors make the registry unfit for a
//! release; warnings are reported but tolerated.

use std::fmt;

use url::Url;

use crate::config::{CatalogContext, CatalogEntry, SideRegistry};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One problem found in a registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub app: String,
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    fn error(app: &str, message: impl Into<String>) -> Self {
        Self {
            app: app.to_string(),
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(app: &str, message: impl Into<String>) -> Self {
        Self {
            app: app.to_string(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Findings of a lint run, grouped by app in id order.
#[derive(Debug, Default, Clone)]
pub struct LintReport {
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Last path segment of a repository URL (or plain path).
fn repo_name(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        let last = parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last());
        if let Some(last) = last {
            return last.to_string();
        }
    }
    // scp-like remotes (`git@host:owner/repo`) and plain paths
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed).to_string()
}

/// Checks one registry entry.
pub fn check_app(
    app: &str,
    entry: &CatalogEntry,
    categories: &SideRegistry,
    antifeatures: &SideRegistry,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    let expected = format!("{}_ynh", app);
    let actual = repo_name(&entry.url);
    if actual != expected {
        findings.push(Finding::error(
            app,
            format!("repo name should be {}, not {}", expected, actual),
        ));
    }

    for antifeature in &entry.antifeatures {
        if !antifeatures.contains(antifeature) {
            findings.push(Finding::error(
                app,
                format!("unknown antifeature {}", antifeature),
            ));
        }
    }

    match entry.category.as_deref() {
        None | Some("") => findings.push(Finding::error(app, "category is missing")),
        Some(category) if !categories.contains(category) => {
            findings.push(Finding::error(app, format!("unknown category {}", category)));
        }
        Some(category) => {
            let known = categories.subtag_ids(category);
            for subtag in &entry.subtags {
                if !known.contains(&subtag.as_str()) {
                    findings.push(Finding::warning(
                        app,
                        format!("unknown subtag {} / {}", category, subtag),
                    ));
                }
            }
        }
    }

    findings
}

/// Lints the whole registry, including entries skipped at load time.
pub fn lint(ctx: &CatalogContext) -> LintReport {
    let mut findings: Vec<Finding> = ctx
        .registry
        .violations()
        .iter()
        .map(|violation| match violation {
            Error::InvalidEntry { app, message } => Finding::error(app, message.clone()),
            other => Finding::error("<registry>", other.to_string()),
        })
        .collect();

    for (app, entry) in ctx.registry.entries() {
        findings.extend(check_app(app, entry, &ctx.categories, &ctx.antifeatures));
    }
    findings.sort_by(|a, b| a.app.cmp(&b.app));

    LintReport { findings }
}
