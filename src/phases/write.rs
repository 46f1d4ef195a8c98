//! Write pass: project the base catalog into the versioned views.
//!
//! ## Views
//!
//! - **`v2/apps.json`**: legacy-schema apps only, manifests unchanged, for
//!   clients that predate the current manifest schema.
//! - **`v3/apps.json`**: every app, manifests in the current schema without
//!   their `install` and `resources` sections, plus a `logo_hash` pointing
//!   into `v3/logos/<hash>.png`.
//! - **`doc_catalog/apps.json`**: a flat summary of the working apps for the
//!   documentation site.
//!
//! Every view is built as a `serde_json::Value`, whose maps are sorted, so
//! unchanged input always produces byte-identical files. Views are pure
//! functions of the base catalog and the context; only [`execute`] touches
//! the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::config::CatalogContext;
use crate::error::Result;
use crate::record::BuiltAppRecord;

use super::aggregate::BaseCatalog;

/// Version directory -> catalog file, relative to the output directory.
pub const V2_CATALOG: &str = "v2/apps.json";
pub const V3_CATALOG: &str = "v3/apps.json";
pub const DOC_CATALOG: &str = "doc_catalog/apps.json";
pub const V3_LOGOS: &str = "v3/logos";

/// Logo content hash -> source file, for the logos referenced by v3.
pub type LogoTable = BTreeMap<String, PathBuf>;

fn record_value(record: &BuiltAppRecord) -> Result<Map<String, Value>> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        // A struct always serializes to an object.
        _ => Ok(Map::new()),
    }
}

/// The legacy view: only apps whose manifest predates the current schema.
pub fn v2_catalog(catalog: &BaseCatalog, ctx: &CatalogContext) -> Result<Value> {
    let mut apps = Map::new();
    for (id, record) in &catalog.apps {
        if record.manifest.is_legacy() {
            apps.insert(id.clone(), Value::Object(record_value(record)?));
        }
    }
    Ok(json!({
        "apps": apps,
        "categories": ctx.categories.to_category_list(),
        "antifeatures": ctx.antifeatures.to_list(),
    }))
}

/// Sha256 of a logo file, hex encoded.
pub fn logo_hash(path: &Path) -> Result<String> {
    let content = fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
}

/// The current view, along with the logos it references.
pub fn v3_catalog(catalog: &BaseCatalog, ctx: &CatalogContext) -> Result<(Value, LogoTable)> {
    let logos_dir = ctx.logos_dir();
    let mut logos = LogoTable::new();
    let mut apps = Map::new();

    for (id, record) in &catalog.apps {
        let mut infos = record_value(record)?;

        let mut manifest = record.manifest.to_current().into_raw();
        manifest.remove("install");
        manifest.remove("resources");
        infos.insert("manifest".to_string(), Value::Object(manifest));

        let logo = logos_dir.join(format!("{}.png", id.to_lowercase()));
        let hash = if logo.is_file() {
            let hash = logo_hash(&logo)?;
            logos.insert(hash.clone(), logo);
            Value::String(hash)
        } else {
            debug!("[{}] no logo at {}", id, logo.display());
            Value::Null
        };
        infos.insert("logo_hash".to_string(), hash);

        apps.insert(id.clone(), Value::Object(infos));
    }

    let view = json!({
        "apps": apps,
        "categories": ctx.categories.to_category_list(),
        "antifeatures": ctx.antifeatures.to_list(),
    });
    Ok((view, logos))
}

fn doc_entry(record: &BuiltAppRecord) -> Value {
    let level = record.level.map(i64::from).unwrap_or(-1);
    // Published as written in the manifest, string or per-language table.
    let description = record.manifest.raw().get("description").cloned();
    json!({
        "id": record.id,
        "category": record.category,
        "url": record.git.url,
        "name": record.summary.name,
        "description": description,
        "state": record.state,
        "level": level,
        "broken": level <= 0,
        "good_quality": level >= 8,
        "bad_quality": level <= 5,
        "antifeatures": record.antifeatures,
        "potential_alternative_to": record.potential_alternative_to,
    })
}

/// The documentation view: a summary of every working app.
pub fn doc_catalog(catalog: &BaseCatalog, ctx: &CatalogContext) -> Value {
    let apps: Map<String, Value> = catalog
        .apps
        .iter()
        .filter(|(_, record)| record.is_working())
        .map(|(id, record)| (id.clone(), doc_entry(record)))
        .collect();
    json!({
        "apps": apps,
        "categories": ctx.categories.to_category_list(),
    })
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string(value)?)?;
    Ok(())
}

/// Writes every view under `output_dir`.
pub fn execute(catalog: &BaseCatalog, ctx: &CatalogContext, output_dir: &Path) -> Result<()> {
    write_json(&output_dir.join(V2_CATALOG), &v2_catalog(catalog, ctx)?)?;

    let (v3, logos) = v3_catalog(catalog, ctx)?;
    let logos_dir = output_dir.join(V3_LOGOS);
    fs::create_dir_all(&logos_dir)?;
    for (hash, source) in &logos {
        let target = logos_dir.join(format!("{}.png", hash));
        if !target.exists() {
            fs::copy(source, &target)?;
        }
    }
    write_json(&output_dir.join(V3_CATALOG), &v3)?;

    write_json(&output_dir.join(DOC_CATALOG), &doc_catalog(catalog, ctx))?;

    info!(
        "Wrote {} apps ({} logos) to {}",
        catalog.len(),
        logos.len(),
        output_dir.display()
    );
    Ok(())
}
