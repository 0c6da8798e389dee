use super::{print_json, read_manifest};
use miette::Result;
use regcache_core::manifest::set_tag;
use std::path::Path;

pub fn run(file: &Path, version: &str, tag: &str) -> Result<()> {
    let mut manifest = read_manifest(file)?;

    if set_tag(&mut manifest, version, tag) {
        tracing::info!(tag = %tag, version = %version, "Tag updated");
    } else {
        tracing::warn!(tag = %tag, version = %version, "Tag left unchanged");
    }
    if !manifest.versions.contains_key(version) {
        tracing::warn!(version = %version, "Tag points at a version the manifest does not have");
    }

    print_json(&manifest)
}
