//! Dist-tag assignment.

use super::model::Manifest;
use super::version;

/// Point `tag` at `version`.
///
/// Returns `false` without touching the manifest when the tag is empty, already
/// points at `version`, or `version` is not a valid semver. Does not check that
/// `version` exists in `versions`; that is the caller's job.
pub fn set_tag(manifest: &mut Manifest, version: &str, tag: &str) -> bool {
    if tag.is_empty() {
        return false;
    }
    if manifest.dist_tags.get(tag).map(String::as_str) == Some(version) {
        return false;
    }
    if !version::is_valid(version) {
        return false;
    }
    manifest
        .dist_tags
        .insert(tag.to_string(), version.to_string());
    true
}
