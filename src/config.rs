//! # Registry Configuration
//!
//! This module loads the hand-maintained registry documents that drive a
//! catalog build:
//!
//! - **`apps.toml`** (or the older **`apps.json`**): one [`CatalogEntry`] per
//!   app, keyed by the app identifier.
//! - **`categories.toml`** and **`antifeatures.toml`**: side registries
//!   mapping a short id to display metadata.
//!
//! Everything is gathered into a [`CatalogContext`], built once at process
//! start and passed by reference to every component. Nothing is memoized at
//! module level, so tests can build a context from fixtures.
//!
//! ## Failure policy
//!
//! A missing or unparseable document is fatal to the run. A single registry
//! entry that does not follow the schema is logged, recorded in
//! [`Registry::violations`], and skipped; the other entries still load.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::defaults::{DEFAULT_BRANCH, HEAD_REVISION};
use crate::error::{Error, Result};

/// Highest quality level an app can be given.
pub const MAX_LEVEL: u8 = 10;

/// Structured document formats understood by the loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Parses a document into a JSON value, whatever its on-disk format.
    pub fn parse(self, content: &str) -> std::result::Result<Value, String> {
        match self {
            DocumentFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            DocumentFormat::Json => {
                serde_json::from_str::<Value>(content).map_err(|e| e.to_string())
            }
        }
    }
}

/// Registry files tried in order; the first one present wins.
pub const REGISTRY_SOURCES: &[(&str, DocumentFormat)] = &[
    ("apps.toml", DocumentFormat::Toml),
    ("apps.json", DocumentFormat::Json),
];

/// Coarse health classification of an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    NotWorking,
    InProgress,
    Working,
}

impl AppState {
    pub fn as_str(self) -> &'static str {
        match self {
            AppState::NotWorking => "notworking",
            AppState::InProgress => "inprogress",
            AppState::Working => "working",
        }
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The revision an app is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Revision {
    /// Most recent commit touching the packaging files.
    #[default]
    Head,
    /// An explicit commit that must exist in the history.
    Pinned(String),
}

impl From<String> for Revision {
    fn from(value: String) -> Self {
        if value == HEAD_REVISION {
            Revision::Head
        } else {
            Revision::Pinned(value)
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Head => f.write_str(HEAD_REVISION),
            Revision::Pinned(rev) => f.write_str(rev),
        }
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

/// One cataloged app, as declared in the registry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub revision: Revision,
    pub state: AppState,
    #[serde(default)]
    pub level: Option<u8>,
    #[serde(default)]
    pub maintained: Option<bool>,
    #[serde(default)]
    pub high_quality: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subtags: Vec<String>,
    #[serde(default)]
    pub antifeatures: Vec<String>,
    #[serde(default)]
    pub potential_alternative_to: Vec<String>,
    /// First-added timestamp; 0 while the entry is being added.
    #[serde(default)]
    pub added_date: i64,
}

impl CatalogEntry {
    /// Creates a working entry on the default branch, tracking `HEAD`.
    pub fn new(url: impl Into<String>, state: AppState) -> Self {
        Self {
            url: url.into(),
            branch: default_branch(),
            revision: Revision::Head,
            state,
            level: None,
            maintained: None,
            high_quality: false,
            featured: false,
            category: None,
            subtags: Vec::new(),
            antifeatures: Vec::new(),
            potential_alternative_to: Vec::new(),
            added_date: 0,
        }
    }

    /// Parses and validates one registry entry.
    pub fn from_value(app: &str, value: Value) -> Result<Self> {
        let entry: CatalogEntry =
            serde_json::from_value(value).map_err(|e| Error::InvalidEntry {
                app: app.to_string(),
                message: e.to_string(),
            })?;

        if entry.url.trim().is_empty() {
            return Err(Error::InvalidEntry {
                app: app.to_string(),
                message: "url is empty".to_string(),
            });
        }
        if let Some(level) = entry.level {
            if level > MAX_LEVEL {
                return Err(Error::InvalidEntry {
                    app: app.to_string(),
                    message: format!("level {} is outside 0-{}", level, MAX_LEVEL),
                });
            }
        }
        Ok(entry)
    }
}

/// The app registry, loaded once per run.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, CatalogEntry>,
    violations: Vec<Error>,
}

impl Registry {
    /// Builds a registry from already-validated entries.
    pub fn from_entries(entries: BTreeMap<String, CatalogEntry>) -> Self {
        Self {
            entries,
            violations: Vec::new(),
        }
    }

    /// Loads the registry from an apps directory, trying `REGISTRY_SOURCES`
    /// in order.
    pub fn load(apps_dir: &Path) -> Result<Self> {
        let Some((path, format)) = REGISTRY_SOURCES
            .iter()
            .map(|(name, format)| (apps_dir.join(name), *format))
            .find(|(path, _)| path.is_file())
        else {
            return Err(Error::RegistryRead {
                path: apps_dir.join(REGISTRY_SOURCES[0].0),
                message: "no apps.toml or apps.json found".to_string(),
            });
        };

        let content = read_document(&path)?;
        Self::parse(&content, format, &path)
    }

    /// Parses registry content. `origin` is only used in error messages.
    pub fn parse(content: &str, format: DocumentFormat, origin: &Path) -> Result<Self> {
        let document = parse_object(content, format, origin)?;

        let mut registry = Registry::default();
        for (app, value) in document {
            match CatalogEntry::from_value(&app, value) {
                Ok(entry) => {
                    registry.entries.insert(app, entry);
                }
                Err(e) => {
                    error!("{}", e);
                    registry.violations.push(e);
                }
            }
        }
        Ok(registry)
    }

    pub fn entries(&self) -> &BTreeMap<String, CatalogEntry> {
        &self.entries
    }

    pub fn get(&self, app: &str) -> Option<&CatalogEntry> {
        self.entries.get(app)
    }

    pub fn contains(&self, app: &str) -> bool {
        self.entries.contains_key(app)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that were skipped because they did not follow the schema.
    pub fn violations(&self) -> &[Error] {
        &self.violations
    }
}

/// A side registry (categories, antifeatures): id -> display metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideRegistry {
    items: BTreeMap<String, Map<String, Value>>,
}

impl SideRegistry {
    /// Loads a TOML side registry; any failure is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_document(path)?;
        Self::parse(&content, DocumentFormat::Toml, path)
    }

    pub fn parse(content: &str, format: DocumentFormat, origin: &Path) -> Result<Self> {
        let document = parse_object(content, format, origin)?;
        let mut items = BTreeMap::new();
        for (id, value) in document {
            match value {
                Value::Object(map) => {
                    items.insert(id, map);
                }
                other => {
                    return Err(Error::RegistryParse {
                        path: origin.to_path_buf(),
                        message: format!("'{}' should be a table, found {}", id, other),
                    });
                }
            }
        }
        Ok(Self { items })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Map<String, Value>> {
        self.items.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Subtag ids declared by a category.
    pub fn subtag_ids(&self, category: &str) -> Vec<&str> {
        self.items
            .get(category)
            .and_then(|c| c.get("subtags"))
            .and_then(Value::as_object)
            .map(|subtags| subtags.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The registry as a list of objects, each carrying its own `id`.
    pub fn to_list(&self) -> Vec<Value> {
        self.items
            .iter()
            .map(|(id, infos)| {
                let mut infos = infos.clone();
                infos.insert("id".to_string(), Value::String(id.clone()));
                Value::Object(infos)
            })
            .collect()
    }

    /// Like [`SideRegistry::to_list`], with each `subtags` table also turned
    /// into a list of objects carrying their `id`.
    pub fn to_category_list(&self) -> Vec<Value> {
        self.to_list()
            .into_iter()
            .map(|mut category| {
                if let Value::Object(infos) = &mut category {
                    let subtags = match infos.remove("subtags") {
                        Some(Value::Object(subtags)) => subtags
                            .into_iter()
                            .map(|(id, subtag)| {
                                let mut subtag = match subtag {
                                    Value::Object(map) => map,
                                    _ => Map::new(),
                                };
                                subtag.insert("id".to_string(), Value::String(id));
                                Value::Object(subtag)
                            })
                            .collect(),
                        _ => Vec::new(),
                    };
                    infos.insert("subtags".to_string(), Value::Array(subtags));
                }
                category
            })
            .collect()
    }
}

/// Immutable inputs of a catalog build, loaded once per process.
#[derive(Debug)]
pub struct CatalogContext {
    pub apps_dir: PathBuf,
    pub registry: Registry,
    pub categories: SideRegistry,
    pub antifeatures: SideRegistry,
}

impl CatalogContext {
    /// Loads the registry and both side registries from an apps directory.
    pub fn load(apps_dir: &Path) -> Result<Self> {
        let registry = Registry::load(apps_dir)?;
        let categories = SideRegistry::load(&apps_dir.join("categories.toml"))?;
        let antifeatures = SideRegistry::load(&apps_dir.join("antifeatures.toml"))?;
        Ok(Self {
            apps_dir: apps_dir.to_path_buf(),
            registry,
            categories,
            antifeatures,
        })
    }

    /// Directory holding the `<app>.png` logos.
    pub fn logos_dir(&self) -> PathBuf {
        self.apps_dir.join("logos")
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::RegistryRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_object(content: &str, format: DocumentFormat, origin: &Path) -> Result<Map<String, Value>> {
    match format.parse(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(Error::RegistryParse {
            path: origin.to_path_buf(),
            message: format!("expected a table at top level, found {}", other),
        }),
        Err(message) => Err(Error::RegistryParse {
            path: origin.to_path_buf(),
            message,
        }),
    }
}
