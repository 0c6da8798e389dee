//! Reconciliation of a cached manifest with one fetched from an uplink.
//!
//! Every function here returns a new value and leaves its inputs alone, so a
//! storage layer can rerun them inside a compare-and-swap loop on `_rev`.

use super::model::{Manifest, UplinkMeta, LATEST_TAG};
use super::version;
use indexmap::IndexMap;
use tracing::debug;

/// Merge `remote` into `cache`.
///
/// - versions only the remote knows are copied in; versions already cached are
///   never replaced, even if the remote copy differs
/// - a remote dist-tag is adopted when the cache has no usable value for it or
///   the cached version is `<=` the remote one, and only if the target version
///   exists after the copy above
/// - when `latest` ends up equal to the remote's, the remote readme is taken
///
/// Merging the same remote twice is a no-op the second time.
#[must_use]
pub fn merge(cache: &Manifest, remote: &Manifest) -> Manifest {
    let mut merged = cache.clone();

    for (key, version) in &remote.versions {
        if !merged.versions.contains_key(key) {
            merged.versions.insert(key.clone(), version.clone());
        }
    }

    for (tag, target) in &remote.dist_tags {
        let cached = merged.dist_tags.get(tag).map(String::as_str);
        if cached == Some(target.as_str()) {
            continue;
        }

        if should_adopt(cached, target) {
            if merged.versions.contains_key(target) {
                merged.dist_tags.insert(tag.clone(), target.clone());
            } else {
                debug!(
                    name = %cache.name,
                    tag = %tag,
                    version = %target,
                    "Ignoring remote dist-tag for unknown version"
                );
            }
        }

        if tag == LATEST_TAG && merged.dist_tags.get(tag) == Some(target) {
            merged.readme.clone_from(&remote.readme);
        }
    }

    merged
}

/// A cached tag value that is not a valid version counts as absent. A remote
/// value that is not a valid version never replaces a cached one.
fn should_adopt(cached: Option<&str>, remote: &str) -> bool {
    let Some(cached) = cached else {
        return true;
    };
    match (version::parse_loose(cached), version::parse_loose(remote)) {
        (Some(cached), Some(remote)) => cached <= remote,
        (None, Some(_)) => true,
        (_, None) => false,
    }
}

/// Union of the two `time` maps, remote entries winning. An empty remote map
/// leaves the cached one as is.
#[must_use]
pub fn merge_time(
    cache_time: &IndexMap<String, String>,
    remote_time: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut merged = cache_time.clone();
    for (key, stamp) in remote_time {
        merged.insert(key.clone(), stamp.clone());
    }
    merged
}

/// Record a fetch from `uplink_id` at the current time.
#[must_use]
pub fn attach_uplink_metadata(
    manifest: &Manifest,
    uplink_id: &str,
    etag: Option<&str>,
) -> Manifest {
    attach_uplink_metadata_at(
        manifest,
        uplink_id,
        etag,
        chrono::Utc::now().timestamp_millis(),
    )
}

/// Record a fetch from `uplink_id` at `fetched` (epoch milliseconds).
#[must_use]
pub fn attach_uplink_metadata_at(
    manifest: &Manifest,
    uplink_id: &str,
    etag: Option<&str>,
    fetched: i64,
) -> Manifest {
    let mut updated = manifest.clone();
    updated.uplinks.insert(
        uplink_id.to_string(),
        UplinkMeta {
            etag: etag.map(String::from),
            fetched,
        },
    );
    updated
}
