//! # App Manifests
//!
//! Each app repository carries a manifest describing the app. Two schema
//! generations coexist:
//!
//! - **Legacy** (`packaging_format` absent or below 2): flat schema with a
//!   single `maintainer` object and install questions under
//!   `arguments.install` as a list.
//! - **Current** (`packaging_format >= 2`): structured schema with a
//!   `maintainers` list, an `install` table keyed by question name and a
//!   `resources` table.
//!
//! The schema is independent from the file format: a manifest may be read
//! from `manifest.toml` or `manifest.json`, tried in that order.
//!
//! Extraction keeps the manifest in its native schema. Converting a legacy
//! manifest into the current shape is a separate, pure step
//! ([`LegacyManifest::to_current`]) used by the catalog views that need it.

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::config::DocumentFormat;
use crate::error::{Error, Result};
use crate::repository::GitOperations;

/// Manifest files tried in order; the first one present is used.
pub const MANIFEST_SOURCES: &[(&str, DocumentFormat)] = &[
    ("manifest.toml", DocumentFormat::Toml),
    ("manifest.json", DocumentFormat::Json),
];

/// Keys kept by the legacy to current conversion.
const CURRENT_KEYS: &[&str] = &[
    "packaging_format",
    "id",
    "name",
    "description",
    "version",
    "maintainers",
    "upstream",
    "integration",
    "install",
    "resources",
];

/// Install questions whose prompt is provided by the platform itself.
const BUILTIN_QUESTIONS: &[&str] = &["domain", "path", "admin", "is_public", "password"];

/// Question types for which an example value is meaningless.
const TYPES_WITHOUT_EXAMPLE: &[&str] = &["domain", "path", "user", "boolean", "password"];

/// Numeric packaging format of a raw manifest; absent or unparseable is 0.
pub fn packaging_format(raw: &Map<String, Value>) -> f64 {
    let text = match raw.get("packaging_format") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    text.parse().unwrap_or(0.0)
}

/// A manifest in the legacy (v1) schema.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyManifest {
    raw: Map<String, Value>,
}

/// A manifest in the current (v2) schema.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentManifest {
    raw: Map<String, Value>,
}

impl CurrentManifest {
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    pub fn into_raw(self) -> Map<String, Value> {
        self.raw
    }
}

impl LegacyManifest {
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }

    /// Converts into the current schema.
    ///
    /// Pure and deterministic: the same input always yields the same output,
    /// and `maintainers` is always a list.
    pub fn to_current(&self) -> CurrentManifest {
        let mut manifest = self.raw.clone();

        let mut upstream = match manifest.remove("upstream") {
            Some(Value::Object(upstream)) => upstream,
            _ => Map::new(),
        };
        if let Some(license) = manifest.get("license") {
            upstream
                .entry("license")
                .or_insert_with(|| license.clone());
        }
        if let Some(url) = manifest.get("url") {
            upstream.entry("website").or_insert_with(|| url.clone());
        }
        manifest.insert("upstream".to_string(), Value::Object(upstream));

        let yunohost_requirement: String = manifest
            .get("requirements")
            .and_then(|r| r.get("yunohost"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .chars()
            .filter(|c| !matches!(c, '>' | '=' | ' '))
            .collect();
        let multi_instance = manifest
            .get("multi_instance")
            .cloned()
            .unwrap_or(Value::Bool(false));
        manifest.insert(
            "integration".to_string(),
            json!({
                "yunohost": yunohost_requirement,
                "architectures": "all",
                "multi_instance": multi_instance,
                "ldap": "?",
                "sso": "?",
                "disk": "50M",
                "ram": {"build": "50M", "runtime": "10M"},
            }),
        );

        let maintainers = legacy_maintainers(manifest.get("maintainer"));
        manifest.insert(
            "maintainers".to_string(),
            Value::Array(maintainers.into_iter().map(Value::String).collect()),
        );

        let questions = manifest
            .get("arguments")
            .and_then(|a| a.get("install"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let mut install = Map::new();
        for question in questions {
            let Value::Object(mut question) = question else {
                continue;
            };
            let Some(Value::String(name)) = question.remove("name") else {
                continue;
            };
            if BUILTIN_QUESTIONS.contains(&name.as_str()) {
                question.remove("ask");
            }
            let has_example = question.get("example").is_some_and(is_truthy);
            let example_useless = question
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| TYPES_WITHOUT_EXAMPLE.contains(&t));
            if has_example && example_useless {
                question.remove("example");
            }
            install.insert(name, Value::Object(question));
        }
        manifest.insert("install".to_string(), Value::Object(install));

        manifest.insert(
            "resources".to_string(),
            json!({
                "system_user": {},
                "install_dir": {"alias": "final_path"},
            }),
        );

        manifest.retain(|key, _| CURRENT_KEYS.contains(&key.as_str()));
        CurrentManifest { raw: manifest }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
    }
}

/// Maintainer names from a legacy `maintainer` field, which may be a single
/// object, a list of objects, or plain names.
fn legacy_maintainers(value: Option<&Value>) -> Vec<String> {
    fn name_of(value: &Value) -> Option<String> {
        match value {
            Value::String(name) if !name.is_empty() => Some(name.clone()),
            Value::Object(map) => match map.get("name") {
                Some(Value::String(name)) if !name.is_empty() => Some(name.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    match value {
        Some(Value::Array(items)) => items.iter().filter_map(name_of).collect(),
        Some(other) => name_of(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// An app manifest, tagged with its schema generation.
#[derive(Debug, Clone, PartialEq)]
pub enum Manifest {
    Legacy(LegacyManifest),
    Current(CurrentManifest),
}

impl Manifest {
    /// Wraps a raw manifest object, picking the variant from its
    /// `packaging_format`.
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        if packaging_format(&raw) < 2.0 {
            Manifest::Legacy(LegacyManifest { raw })
        } else {
            Manifest::Current(CurrentManifest { raw })
        }
    }

    /// Parses manifest content read from `file`.
    pub fn parse(app: &str, file: &str, format: DocumentFormat, content: &str) -> Result<Self> {
        match format.parse(content) {
            Ok(Value::Object(raw)) => Ok(Self::from_raw(raw)),
            Ok(other) => Err(Error::ManifestParse {
                app: app.to_string(),
                file: file.to_string(),
                message: format!("expected a table at top level, found {}", other),
            }),
            Err(message) => Err(Error::ManifestParse {
                app: app.to_string(),
                file: file.to_string(),
                message,
            }),
        }
    }

    pub fn raw(&self) -> &Map<String, Value> {
        match self {
            Manifest::Legacy(m) => &m.raw,
            Manifest::Current(m) => &m.raw,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Manifest::Legacy(_))
    }

    pub fn id(&self) -> Option<&str> {
        self.raw().get("id").and_then(Value::as_str)
    }

    /// The manifest in the current schema, converting a legacy one.
    pub fn to_current(&self) -> CurrentManifest {
        match self {
            Manifest::Legacy(m) => m.to_current(),
            Manifest::Current(m) => m.clone(),
        }
    }

    /// Antifeature ids declared by the manifest itself.
    pub fn antifeatures(&self) -> Vec<String> {
        match self.raw().get("antifeatures") {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The normalized view of the manifest; fails when required fields are
    /// missing.
    pub fn record(&self, app: &str) -> Result<ManifestRecord> {
        ManifestRecord::from_current(app, self.to_current().raw())
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw().serialize(serializer)
    }
}

/// An install-time question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallQuestion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub default: Option<Value>,
}

/// Schema-independent view of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRecord {
    pub id: String,
    pub name: String,
    /// Language code -> text.
    pub description: BTreeMap<String, String>,
    pub version: Option<String>,
    pub maintainers: Vec<String>,
    pub upstream: BTreeMap<String, Value>,
    pub install: Vec<InstallQuestion>,
    pub resources: Vec<String>,
}

impl ManifestRecord {
    fn from_current(app: &str, raw: &Map<String, Value>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match raw.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
                Some(_) => Err(Error::ManifestInvalid {
                    app: app.to_string(),
                    message: format!("'{}' must be a non-empty string", key),
                }),
                None => Err(Error::ManifestInvalid {
                    app: app.to_string(),
                    message: format!("'{}' is missing", key),
                }),
            }
        };

        let description = match raw.get("description") {
            Some(Value::String(text)) => BTreeMap::from([("en".to_string(), text.clone())]),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(lang, text)| Some((lang.clone(), text.as_str()?.to_string())))
                .collect(),
            _ => BTreeMap::new(),
        };

        let maintainers = match raw.get("maintainers") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(name)) => vec![name.clone()],
            _ => Vec::new(),
        };

        let upstream = raw
            .get("upstream")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let install = raw
            .get("install")
            .and_then(Value::as_object)
            .map(|questions| {
                questions
                    .iter()
                    .map(|(name, question)| InstallQuestion {
                        name: name.clone(),
                        kind: question
                            .get("type")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        default: question.get("default").cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let resources = raw
            .get("resources")
            .and_then(Value::as_object)
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();

        let version = match raw.get("version") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Ok(Self {
            id: required("id")?,
            name: required("name")?,
            description,
            version,
            maintainers,
            upstream,
            install,
            resources,
        })
    }
}

/// Reads and parses the manifest of `app` at `commit`.
///
/// A missing manifest, an unparseable one, or one without `id`/`name` is an
/// error. An `id` that differs from the registry key is only reported.
pub fn extract(
    git: &dyn GitOperations,
    repo: &Path,
    app: &str,
    commit: &str,
) -> Result<(Manifest, ManifestRecord)> {
    for (file, format) in MANIFEST_SOURCES {
        let Some(bytes) = git.read_file(repo, commit, file)? else {
            continue;
        };
        let content = String::from_utf8(bytes).map_err(|e| Error::ManifestParse {
            app: app.to_string(),
            file: file.to_string(),
            message: e.to_string(),
        })?;

        let manifest = Manifest::parse(app, file, *format, &content)?;
        let record = manifest.record(app)?;
        if record.id != app {
            warn!(
                "[{}] manifest id '{}' does not match the catalog id",
                app, record.id
            );
        }
        return Ok((manifest, record));
    }

    Err(Error::ManifestMissing {
        app: app.to_string(),
        commit: commit.to_string(),
    })
}
