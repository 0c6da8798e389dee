use super::{print_json, read_json};
use miette::Result;
use regcache_core::manifest::{is_malformed_publish, is_publishable};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Publish body check result for JSON output.
#[derive(Serialize)]
struct ValidationResult {
    ok: bool,
    publishable: bool,
    malformed: bool,
    versions: Vec<String>,
    attachments: Vec<String>,
}

/// Run the validate-publish command.
///
/// Exits with status 1 when the body would be rejected.
pub fn run(file: &Path, json: bool) -> Result<()> {
    let body = read_json(file)?;

    let publishable = is_publishable(&body);
    let malformed = is_malformed_publish(Some(&body));
    let result = ValidationResult {
        ok: publishable && !malformed,
        publishable,
        malformed,
        versions: keys(&body, "versions"),
        attachments: keys(&body, "_attachments"),
    };

    if json {
        print_json(&result)?;
    } else if result.ok {
        println!("ok: publishes {}", result.versions.join(", "));
    } else if !publishable {
        eprintln!("error: body has no `versions`, not a publish");
    } else {
        eprintln!(
            "error: a publish needs exactly one version and one attachment (got {} and {})",
            result.versions.len(),
            result.attachments.len()
        );
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn keys(body: &Value, field: &str) -> Vec<String> {
    body.get(field)
        .and_then(Value::as_object)
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}
