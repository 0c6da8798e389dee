use super::{print_json, read_manifest};
use miette::Result;
use regcache_core::manifest::project;
use std::path::Path;

pub fn run(file: &Path, keep_uplinks: bool) -> Result<()> {
    let manifest = read_manifest(file)?;
    print_json(&project(manifest, keep_uplinks))
}
