//! Typed manifest records.
//!
//! Field names on the wire (`dist-tags`, `_rev`, `_attachments`, ...) are the
//! contract existing registry clients rely on; the serde renames below must
//! not change.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Revision stamped on manifests that never had one.
pub const DEFAULT_REVISION: &str = "0-0000000000000000";

/// The `latest` dist-tag.
pub const LATEST_TAG: &str = "latest";

/// Full metadata record for one package.
///
/// Deserialization goes through [`super::normalize::normalize`], so a
/// `Manifest` obtained from JSON always has valid structural fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct Manifest {
    pub name: String,

    #[serde(rename = "_id")]
    pub id: String,

    #[serde(rename = "_rev")]
    pub revision: String,

    pub versions: IndexMap<String, PackageVersion>,

    pub time: IndexMap<String, String>,

    #[serde(rename = "dist-tags")]
    pub dist_tags: IndexMap<String, String>,

    pub users: IndexMap<String, bool>,

    #[serde(rename = "_uplinks", skip_serializing_if = "IndexMap::is_empty")]
    pub uplinks: IndexMap<String, UplinkMeta>,

    #[serde(rename = "_distfiles", skip_serializing_if = "IndexMap::is_empty")]
    pub dist_files: IndexMap<String, Value>,

    #[serde(rename = "_attachments", skip_serializing_if = "IndexMap::is_empty")]
    pub attachments: IndexMap<String, Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    /// Top-level fields this crate does not model.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Manifest {
    /// The version record a dist-tag points at, if both exist.
    #[must_use]
    pub fn tagged_version(&self, tag: &str) -> Option<&PackageVersion> {
        self.dist_tags
            .get(tag)
            .and_then(|version| self.versions.get(version))
    }

    /// Version string behind `latest`.
    #[must_use]
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get(LATEST_TAG).map(String::as_str)
    }
}

/// Per-uplink fetch bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Epoch milliseconds of the last successful fetch.
    #[serde(default)]
    pub fetched: i64,
}

/// One published release.
///
/// Only the fields the engine reads are typed. Type mismatches in them are
/// dropped rather than rejected; everything else is kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVersion {
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// String or `{name, email, url}` object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainers: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,

    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub readme_filename: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PackageVersion {
    /// Readme with surrounding whitespace removed, if anything is left.
    #[must_use]
    pub fn non_blank_readme(&self) -> Option<&str> {
        non_blank(self.readme.as_deref())
    }
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}
