//! Built app records: the per-app output of the aggregation pass.

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use crate::config::{AppState, CatalogEntry};
use crate::manifest::{Manifest, ManifestRecord};
use crate::revision::ResolvedRevision;

/// Antifeature implying that an app is not maintained.
pub const NOT_MAINTAINED: &str = "package-not-maintained";

/// Where an app was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitSource {
    pub url: String,
    pub branch: String,
    pub revision: String,
}

fn serialize_level<S: Serializer>(level: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    match level {
        Some(level) => serializer.serialize_u8(*level),
        None => serializer.serialize_str("?"),
    }
}

/// One app of the base catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuiltAppRecord {
    pub id: String,
    pub git: GitSource,
    pub added_in_catalog: i64,
    #[serde(rename = "lastUpdate")]
    pub last_update: i64,
    /// Raw manifest, in its native schema.
    pub manifest: Manifest,
    #[serde(skip)]
    pub summary: ManifestRecord,
    pub state: AppState,
    #[serde(serialize_with = "serialize_level")]
    pub level: Option<u8>,
    pub maintained: bool,
    pub high_quality: bool,
    pub featured: bool,
    pub category: Option<String>,
    pub subtags: Vec<String>,
    pub potential_alternative_to: Vec<String>,
    /// Sorted union of the registry and manifest antifeatures.
    pub antifeatures: Vec<String>,
}

impl BuiltAppRecord {
    pub fn build(
        app: &str,
        entry: &CatalogEntry,
        revision: ResolvedRevision,
        manifest: Manifest,
        summary: ManifestRecord,
    ) -> Self {
        let antifeatures: BTreeSet<String> = entry
            .antifeatures
            .iter()
            .cloned()
            .chain(manifest.antifeatures())
            .collect();
        let maintained = entry
            .maintained
            .unwrap_or_else(|| !entry.antifeatures.iter().any(|a| a == NOT_MAINTAINED));

        Self {
            id: app.to_string(),
            git: GitSource {
                url: entry.url.clone(),
                branch: entry.branch.clone(),
                revision: revision.commit,
            },
            added_in_catalog: entry.added_date,
            last_update: revision.timestamp,
            manifest,
            summary,
            state: entry.state,
            level: entry.level,
            maintained,
            high_quality: entry.high_quality,
            featured: entry.featured,
            category: entry.category.clone(),
            subtags: entry.subtags.clone(),
            potential_alternative_to: entry.potential_alternative_to.clone(),
            antifeatures: antifeatures.into_iter().collect(),
        }
    }

    pub fn is_working(&self) -> bool {
        self.state == AppState::Working
    }
}
