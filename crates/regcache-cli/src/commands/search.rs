use super::{print_json, read_manifest};
use chrono::SecondsFormat;
use miette::{miette, Result};
use regcache_core::manifest::search_projection;
use std::path::Path;

pub fn run(file: &Path, modified: Option<String>) -> Result<()> {
    let manifest = read_manifest(file)?;

    let modified = modified
        .or_else(|| manifest.time.get("modified").cloned())
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

    let entry = search_projection(&manifest, &modified).ok_or_else(|| {
        miette!(
            "{} has no `latest` dist-tag pointing at a known version",
            manifest.name
        )
    })?;

    print_json(&entry)
}
