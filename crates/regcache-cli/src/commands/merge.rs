use super::{print_json, read_manifest};
use miette::Result;
use regcache_core::manifest::{attach_uplink_metadata, merge, merge_time};
use std::path::Path;

/// Merge `remote` into `cache` the way a sync with one uplink would.
pub fn run(cache: &Path, remote: &Path, uplink: Option<&str>, etag: Option<&str>) -> Result<()> {
    let cached = read_manifest(cache)?;
    let fetched = read_manifest(remote)?;

    let mut merged = merge(&cached, &fetched);
    merged.time = merge_time(&cached.time, &fetched.time);

    if let Some(id) = uplink {
        merged = attach_uplink_metadata(&merged, id, etag);
    }

    tracing::info!(
        name = %merged.name,
        added = merged.versions.len() - cached.versions.len(),
        "Merged manifest"
    );
    print_json(&merged)
}
