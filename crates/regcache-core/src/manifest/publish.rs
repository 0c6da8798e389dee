//! Shape checks for inbound write bodies.

use serde_json::Value;

/// Whether a publish body is malformed.
///
/// A publish must carry exactly one entry in `versions` and exactly one in
/// `_attachments`. A missing body is not judged here.
#[must_use]
pub fn is_malformed_publish(payload: Option<&Value>) -> bool {
    let Some(payload) = payload else {
        return false;
    };
    !has_single_entry(payload.get("_attachments")) || !has_single_entry(payload.get("versions"))
}

/// Whether a write body is a publish at all (as opposed to a tag, star or
/// unpublish body, which carry no `versions`).
#[must_use]
pub fn is_publishable(payload: &Value) -> bool {
    payload.get("versions").is_some()
}

fn has_single_entry(field: Option<&Value>) -> bool {
    field
        .and_then(Value::as_object)
        .is_some_and(|object| object.len() == 1)
}
