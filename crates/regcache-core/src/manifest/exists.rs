//! Publish-time existence checks and the publish pipeline.
//!
//! Storage and uplink synchronization are collaborators reached through
//! [`PackageStore`] and [`UplinkSync`]. The checks here only interpret what
//! those return.

use super::error::RegistryError;
use super::model::Manifest;
use super::normalize::{new_manifest, next_revision, normalize};
use super::publish::is_malformed_publish;
use super::readme::{latest_readme, strip_readme};
use super::tags::set_tag;
use crate::config::Config;
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Local manifest storage.
#[async_trait]
pub trait PackageStore: Send + Sync {
    /// Load a manifest. Absence is reported as a 404 [`RegistryError`].
    async fn get_manifest(&self, name: &str) -> Result<Manifest, RegistryError>;

    /// Persist a newly published package.
    async fn add_package(&self, name: &str, manifest: Manifest) -> Result<(), RegistryError>;
}

/// Options for [`UplinkSync::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Query uplinks at all; `false` only consults local data.
    pub uplinks_look: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { uplinks_look: true }
    }
}

/// What a synchronization produced.
#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    /// The package as known after syncing, if it exists anywhere.
    pub manifest: Option<Manifest>,

    /// One slot per uplink, in configuration order; `None` means it answered.
    pub uplink_errors: Vec<Option<RegistryError>>,
}

/// Fetches a package from every configured uplink.
#[async_trait]
pub trait UplinkSync: Send + Sync {
    async fn sync(
        &self,
        name: &str,
        etag: Option<&str>,
        options: SyncOptions,
    ) -> Result<SyncOutcome, RegistryError>;
}

/// Succeeds only if the local store does not know `name`.
pub async fn check_local(name: &str, store: &dyn PackageStore) -> Result<(), RegistryError> {
    match store.get_manifest(name).await {
        Ok(_) => Err(RegistryError::conflict(name)),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Succeeds only if no uplink knows `name`.
///
/// An uplink answering with anything but 404 decides the outcome: accepted when
/// offline publishing is allowed, `ServiceUnavailable` otherwise. Uplinks after
/// the first such error are not looked at.
pub async fn check_remote(
    name: &str,
    allow_offline_publish: bool,
    sync: &dyn UplinkSync,
) -> Result<(), RegistryError> {
    let outcome = match sync.sync(name, None, SyncOptions::default()).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_not_found() => SyncOutcome::default(),
        Err(e) => return Err(e),
    };

    if outcome.manifest.is_some() {
        return Err(RegistryError::conflict(name));
    }

    for error in outcome.uplink_errors.iter().flatten() {
        if error.is_not_found() {
            continue;
        }
        if allow_offline_publish {
            warn!(name = %name, error = %error, "Uplink unreachable, publishing offline");
            return Ok(());
        }
        return Err(RegistryError::service_unavailable(name));
    }

    Ok(())
}

/// Hand a prepared manifest to the store.
pub async fn publish_package(
    name: &str,
    manifest: Manifest,
    store: &dyn PackageStore,
) -> Result<(), RegistryError> {
    store.add_package(name, manifest).await
}

/// Validate, check and store a first publish of `name`.
///
/// Returns the manifest that was handed to the store.
pub async fn add_package(
    name: &str,
    payload: Value,
    store: &dyn PackageStore,
    sync: &dyn UplinkSync,
    config: &Config,
) -> Result<Manifest, RegistryError> {
    if is_malformed_publish(Some(&payload)) {
        return Err(RegistryError::bad_request(format!(
            "publish of {name} must carry exactly one version and one attachment"
        )));
    }

    check_local(name, store).await?;
    check_remote(name, config.allow_offline_publish, sync).await?;

    let manifest = prepare_publish(name, payload)?;
    debug!(name = %name, rev = %manifest.revision, "Storing new package");
    publish_package(name, manifest.clone(), store).await?;

    info!(name = %name, versions = manifest.versions.len(), "Published package");
    Ok(manifest)
}

/// Turn a publish body into the manifest stored for a new package.
///
/// The readme moves from the version to the manifest, tags pointing at the
/// published version are applied, and the revision is advanced. Fails when
/// no readable version is left after normalization.
pub fn prepare_publish(name: &str, payload: Value) -> Result<Manifest, RegistryError> {
    let incoming = normalize(payload);
    if incoming.versions.is_empty() {
        return Err(RegistryError::bad_request(format!(
            "publish of {name} carries no readable version"
        )));
    }

    let readme = latest_readme(&incoming);
    let now = chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut manifest = new_manifest(name);
    if !readme.is_empty() {
        manifest.readme = Some(readme);
    }

    for (key, version) in incoming.versions {
        if let Some(stripped) = strip_readme(Some(version)) {
            manifest.versions.insert(key.clone(), stripped);
        }
        manifest.time.insert(key, now.clone());
    }

    for (tag, target) in &incoming.dist_tags {
        if manifest.versions.contains_key(target) {
            set_tag(&mut manifest, target, tag);
        }
    }

    manifest.time.insert("created".to_string(), now.clone());
    manifest.time.insert("modified".to_string(), now);
    manifest.attachments = incoming.attachments;
    manifest.revision = next_revision(&manifest.revision);
    Ok(manifest)
}
