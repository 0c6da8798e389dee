use super::{print_json, read_manifest};
use miette::Result;
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    let manifest = read_manifest(file)?;
    tracing::debug!(
        name = %manifest.name,
        versions = manifest.versions.len(),
        "Normalized manifest"
    );
    print_json(&manifest)
}
