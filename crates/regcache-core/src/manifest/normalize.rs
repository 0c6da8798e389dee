//! Manifest construction and repair.
//!
//! [`normalize`] is the only way loosely typed JSON becomes a [`Manifest`].
//! Coercion rules:
//!
//! | field                                   | accepted         | otherwise                 |
//! |-----------------------------------------|------------------|---------------------------|
//! | `versions`, `dist-tags`, `_distfiles`,  | object           | empty mapping             |
//! | `_attachments`, `_uplinks`, `time`      |                  |                           |
//! | `_rev`                                  | string           | [`DEFAULT_REVISION`]      |
//! | `_id`                                   | string           | value of `name`           |
//! | `name`                                  | string           | empty string              |
//! | `users`                                 | object           | empty mapping             |
//! | `readme`                                | string           | absent                    |
//! | entry of `versions` / `_uplinks`        | object           | entry dropped             |
//! | entry of `time`                         | string           | entry dropped             |
//! | entry of `users`                        | bool             | entry dropped             |
//!
//! Dist-tags are then repaired by [`normalize_dist_tags`].

use super::model::{Manifest, PackageVersion, UplinkMeta, DEFAULT_REVISION, LATEST_TAG};
use super::version;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// A blank manifest for a package that is about to be published for the first time.
#[must_use]
pub fn new_manifest(name: &str) -> Manifest {
    Manifest {
        name: name.to_string(),
        id: name.to_string(),
        revision: String::new(),
        ..Manifest::default()
    }
}

/// Build a [`Manifest`] from arbitrary JSON, repairing whatever is malformed.
///
/// Never fails. Unknown top-level fields are kept in [`Manifest::extra`].
#[must_use]
pub fn normalize(value: Value) -> Manifest {
    let mut fields: IndexMap<String, Value> = match value {
        Value::Object(map) => map.into_iter().collect(),
        other => {
            debug!(kind = json_kind(&other), "Manifest is not an object, starting blank");
            IndexMap::new()
        }
    };

    let name = take_string(&mut fields, "name").unwrap_or_default();
    let id = take_string(&mut fields, "_id").unwrap_or_else(|| name.clone());
    let revision =
        take_string(&mut fields, "_rev").unwrap_or_else(|| DEFAULT_REVISION.to_string());

    let versions: IndexMap<String, PackageVersion> =
        typed_entries(&name, "versions", take_object(&mut fields, "versions"));
    let uplinks: IndexMap<String, UplinkMeta> =
        typed_entries(&name, "_uplinks", take_object(&mut fields, "_uplinks"));

    let time = take_object(&mut fields, "time")
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(stamp) => Some((key, stamp)),
            _ => None,
        })
        .collect();

    let users = take_object(&mut fields, "users")
        .into_iter()
        .filter_map(|(user, value)| value.as_bool().map(|flag| (user, flag)))
        .collect();

    let dist_tags = normalize_dist_tags(take_object(&mut fields, "dist-tags"), &versions);
    let dist_files = take_object(&mut fields, "_distfiles");
    let attachments = take_object(&mut fields, "_attachments");
    let readme = take_string(&mut fields, "readme");

    Manifest {
        name,
        id,
        revision,
        versions,
        time,
        dist_tags,
        users,
        uplinks,
        dist_files,
        attachments,
        readme,
        extra: fields,
    }
}

impl From<Value> for Manifest {
    fn from(value: Value) -> Self {
        normalize(value)
    }
}

/// Repair raw dist-tags into a tag -> version mapping.
///
/// - a list collapses to its highest valid version, or is removed if it has none
/// - a string that is not a valid version is removed
/// - any other value is removed
/// - a missing `latest` is filled with the highest version in `versions`
#[must_use]
pub fn normalize_dist_tags(
    raw: IndexMap<String, Value>,
    versions: &IndexMap<String, PackageVersion>,
) -> IndexMap<String, String> {
    let mut tags = IndexMap::new();

    for (tag, value) in raw {
        match value {
            Value::String(target) if version::is_valid(&target) => {
                tags.insert(tag, target);
            }
            Value::Array(items) => {
                if let Some(best) = version::highest(items.iter().filter_map(Value::as_str)) {
                    tags.insert(tag, best.to_string());
                } else {
                    debug!(tag = %tag, "Dropping dist-tag list without a valid version");
                }
            }
            other => {
                debug!(tag = %tag, value = %other, "Dropping invalid dist-tag");
            }
        }
    }

    if !tags.contains_key(LATEST_TAG) {
        if let Some(best) = version::highest(versions.keys().map(String::as_str)) {
            tags.insert(LATEST_TAG.to_string(), best.to_string());
        }
    }

    tags
}

/// Compute the revision that follows `current`: `"<n+1>-<16 hex chars>"`.
///
/// An unparsable counter counts as 0. The random suffix makes collisions
/// unlikely; callers still compare-and-swap on the whole token.
#[must_use]
pub fn next_revision(current: &str) -> String {
    let counter = current
        .split('-')
        .next()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .unwrap_or(0);
    format!("{}-{:016x}", counter.saturating_add(1), rand::random::<u64>())
}

fn take_string(fields: &mut IndexMap<String, Value>, key: &str) -> Option<String> {
    match fields.shift_remove(key) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}

fn take_object(fields: &mut IndexMap<String, Value>, key: &str) -> IndexMap<String, Value> {
    match fields.shift_remove(key) {
        Some(Value::Object(map)) => map.into_iter().collect(),
        Some(other) => {
            debug!(field = key, kind = json_kind(&other), "Replacing non-object field");
            IndexMap::new()
        }
        None => IndexMap::new(),
    }
}

fn typed_entries<T: DeserializeOwned>(
    name: &str,
    field: &str,
    raw: IndexMap<String, Value>,
) -> IndexMap<String, T> {
    raw.into_iter()
        .filter_map(|(key, value)| {
            if !value.is_object() {
                debug!(name = %name, field, key = %key, "Dropping non-object entry");
                return None;
            }
            match serde_json::from_value(value) {
                Ok(entry) => Some((key, entry)),
                Err(e) => {
                    debug!(name = %name, field, key = %key, error = %e, "Dropping unreadable entry");
                    None
                }
            }
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
