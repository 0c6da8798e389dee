//! Effective readme resolution.

use super::model::{non_blank, Manifest, PackageVersion, LATEST_TAG};

/// Pre-release tags consulted, in order, when neither the manifest nor
/// `latest` has a readme.
pub const README_TAG_PRIORITY: [&str; 6] = ["next", "beta", "alpha", "test", "dev", "canary"];

/// The readme a client should see for this package, trimmed, or `""`.
#[must_use]
pub fn latest_readme(manifest: &Manifest) -> String {
    let latest = manifest
        .tagged_version(LATEST_TAG)
        .and_then(PackageVersion::non_blank_readme);

    non_blank(manifest.readme.as_deref())
        .or(latest)
        .or_else(|| {
            README_TAG_PRIORITY.iter().find_map(|tag| {
                manifest
                    .tagged_version(tag)
                    .and_then(PackageVersion::non_blank_readme)
            })
        })
        .unwrap_or_default()
        .to_string()
}

/// Drop the per-version readme once the manifest-level readme holds it.
#[must_use]
pub fn strip_readme(version: Option<PackageVersion>) -> Option<PackageVersion> {
    version.map(|mut version| {
        version.readme = None;
        version
    })
}
