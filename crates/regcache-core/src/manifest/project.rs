//! Client-facing views of a manifest.
//!
//! [`project`] is the sanitization boundary: every manifest returned to a
//! client goes through it.

use super::model::{Manifest, PackageVersion};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Top-level fields a client may see (wire names).
pub const CLIENT_FIELDS: [&str; 8] = [
    "_rev",
    "name",
    "versions",
    "dist-tags",
    "readme",
    "time",
    "_id",
    "users",
];

/// Reduce a manifest to [`CLIENT_FIELDS`], plus `_uplinks` when asked.
#[must_use]
pub fn project(manifest: Manifest, keep_uplink_data: bool) -> Manifest {
    Manifest {
        name: manifest.name,
        id: manifest.id,
        revision: manifest.revision,
        versions: manifest.versions,
        time: manifest.time,
        dist_tags: manifest.dist_tags,
        users: manifest.users,
        uplinks: if keep_uplink_data {
            manifest.uplinks
        } else {
            IndexMap::new()
        },
        dist_files: IndexMap::new(),
        attachments: IndexMap::new(),
        readme: manifest.readme,
        extra: IndexMap::new(),
    }
}

/// A person attached to a release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Contributor {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Contributor {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(name) => Some(Self {
                name: name.clone(),
                ..Self::default()
            }),
            Value::Object(fields) => {
                let text = |key: &str| fields.get(key).and_then(Value::as_str).map(String::from);
                Some(Self {
                    name: text("name").unwrap_or_default(),
                    email: text("email"),
                    url: text("url"),
                })
            }
            _ => None,
        }
    }
}

/// Coerce the many shapes of `author`/`maintainers`/`contributors` into a list.
///
/// `null` gives an empty list, a string becomes `[{name}]`, a single object
/// becomes a one-element list.
#[must_use]
pub fn normalize_contributors(value: Option<&Value>) -> Vec<Contributor> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(Contributor::from_value).collect(),
        Some(other) => Contributor::from_value(other).into_iter().collect(),
    }
}

/// `time` section of a [`SearchEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTime {
    pub modified: String,
}

/// Compact record handed to the search index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "dist-tags")]
    pub dist_tags: IndexMap<String, String>,
    pub maintainers: Vec<Contributor>,
    pub author: Option<Value>,
    pub repository: Option<Value>,
    #[serde(rename = "readmeFilename")]
    pub readme_filename: Option<String>,
    pub homepage: Option<String>,
    pub keywords: Option<Value>,
    pub bugs: Option<Value>,
    pub license: Option<Value>,
    pub time: SearchTime,
    pub versions: IndexMap<String, String>,
}

/// Build the search record from the `latest`-tagged version.
///
/// `None` when `latest` is missing or points at an unknown version.
#[must_use]
pub fn search_projection(manifest: &Manifest, modified: &str) -> Option<SearchEntry> {
    let latest = manifest.latest()?;
    let version = manifest.versions.get(latest)?;

    Some(SearchEntry {
        name: manifest.name.clone(),
        description: version.description.clone(),
        dist_tags: manifest.dist_tags.clone(),
        maintainers: maintainers_of(version),
        author: version.author.clone(),
        repository: version.repository.clone(),
        readme_filename: version.readme_filename.clone(),
        homepage: version.homepage.clone(),
        keywords: version.keywords.clone(),
        bugs: version.bugs.clone(),
        license: version.license.clone(),
        time: SearchTime {
            modified: modified.to_string(),
        },
        versions: IndexMap::from([(latest.to_string(), "latest".to_string())]),
    })
}

fn maintainers_of(version: &PackageVersion) -> Vec<Contributor> {
    match version.maintainers.as_ref() {
        Some(list) if !list.is_null() => normalize_contributors(Some(list)),
        _ => normalize_contributors(version.author.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::model::UplinkMeta;
    use crate::manifest::normalize::normalize;
    use serde_json::json;

    fn sample() -> Manifest {
        normalize(json!({
            "name": "a",
            "_rev": "2-abc",
            "versions": {"1.0.0": {
                "name": "a",
                "description": "the a package",
                "author": "Ada <ada@example.com>",
                "license": "MIT",
                "readmeFilename": "README.md",
                "keywords": ["x"]
            }},
            "dist-tags": {"latest": "1.0.0"},
            "_uplinks": {"npmjs": {"etag": "e1", "fetched": 100}},
            "_distfiles": {"a-1.0.0.tgz": {"url": "https://example.com"}},
            "_attachments": {"a-1.0.0.tgz": {"shasum": "abc"}},
            "_internal": 1
        }))
    }

    #[test]
    fn test_project_drops_internal_fields() {
        let projected = project(sample(), false);
        let value = serde_json::to_value(&projected).unwrap();
        let object = value.as_object().unwrap();

        assert!(!object.contains_key("_internal"));
        assert!(!object.contains_key("_uplinks"));
        assert!(!object.contains_key("_distfiles"));
        assert!(!object.contains_key("_attachments"));
        for key in object.keys() {
            assert!(CLIENT_FIELDS.contains(&key.as_str()), "unexpected field {key}");
        }
        assert_eq!(projected.revision, "2-abc");
        assert_eq!(projected.versions.len(), 1);
    }

    #[test]
    fn test_project_keeps_uplinks_when_asked() {
        let projected = project(sample(), true);
        assert_eq!(
            projected.uplinks.get("npmjs"),
            Some(&UplinkMeta {
                etag: Some("e1".to_string()),
                fetched: 100
            })
        );
        assert!(projected.extra.is_empty());
        assert!(projected.attachments.is_empty());
    }

    #[test]
    fn test_normalize_contributors() {
        assert!(normalize_contributors(None).is_empty());
        assert!(normalize_contributors(Some(&Value::Null)).is_empty());

        let from_string = normalize_contributors(Some(&json!("Ada")));
        assert_eq!(from_string.len(), 1);
        assert_eq!(from_string[0].name, "Ada");

        let from_object = normalize_contributors(Some(&json!({"name": "Bob", "email": "b@x.io"})));
        assert_eq!(from_object[0].email.as_deref(), Some("b@x.io"));

        let from_list = normalize_contributors(Some(&json!(["Ada", {"name": "Bob"}, 3])));
        assert_eq!(from_list.len(), 2);
        assert_eq!(from_list[1].name, "Bob");
    }

    #[test]
    fn test_search_projection_falls_back_to_author() {
        let entry = search_projection(&sample(), "2024-01-01T00:00:00.000Z").unwrap();

        assert_eq!(entry.name, "a");
        assert_eq!(entry.description.as_deref(), Some("the a package"));
        assert_eq!(entry.maintainers.len(), 1);
        assert_eq!(entry.maintainers[0].name, "Ada <ada@example.com>");
        assert_eq!(entry.versions.get("1.0.0").map(String::as_str), Some("latest"));
        assert_eq!(entry.time.modified, "2024-01-01T00:00:00.000Z");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["readmeFilename"], "README.md");
        assert_eq!(value["dist-tags"]["latest"], "1.0.0");
    }

    #[test]
    fn test_search_projection_prefers_maintainers() {
        let manifest = normalize(json!({
            "name": "a",
            "versions": {"1.0.0": {
                "author": "Ada",
                "maintainers": [{"name": "Bob"}, {"name": "Cy"}]
            }},
            "dist-tags": {"latest": "1.0.0"}
        }));
        let entry = search_projection(&manifest, "now").unwrap();
        let names: Vec<&str> = entry.maintainers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Cy"]);
    }

    #[test]
    fn test_search_projection_without_latest() {
        let manifest = normalize(json!({"name": "a"}));
        assert!(search_projection(&manifest, "now").is_none());
    }
}
