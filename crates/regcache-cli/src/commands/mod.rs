pub mod exists;
pub mod merge;
pub mod normalize;
pub mod project;
pub mod publish;
pub mod readme;
pub mod revision;
pub mod search;
pub mod tag;

use miette::{IntoDiagnostic, Result, WrapErr};
use regcache_core::manifest::normalize::normalize;
use regcache_core::manifest::Manifest;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Read a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid JSON in {}", path.display()))
}

/// Read a manifest file. Structural damage is repaired, not reported.
pub fn read_manifest(path: &Path) -> Result<Manifest> {
    Ok(normalize(read_json(path)?))
}

/// Print a value to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
