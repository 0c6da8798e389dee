use super::{print_json, read_manifest};
use miette::Result;
use regcache_core::manifest::latest_readme;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ReadmeResult {
    name: String,
    readme: String,
}

/// Print the readme a client would be shown. Empty output means there is none.
pub fn run(file: &Path, json: bool) -> Result<()> {
    let manifest = read_manifest(file)?;
    let readme = latest_readme(&manifest);

    if json {
        print_json(&ReadmeResult {
            name: manifest.name,
            readme,
        })
    } else {
        println!("{readme}");
        Ok(())
    }
}
