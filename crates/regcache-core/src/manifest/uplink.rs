//! Upstream registries and the fan-out synchronizer.

use super::error::{status, RegistryError};
use super::exists::{PackageStore, SyncOptions, SyncOutcome, UplinkSync};
use super::merge::{attach_uplink_metadata, merge, merge_time};
use super::model::{Manifest, DEFAULT_REVISION};
use super::normalize::{new_manifest, normalize};
use crate::config::{Config, UplinkConfig};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::header::{ACCEPT, ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A manifest fetched from an uplink.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub manifest: Manifest,
    pub etag: Option<String>,
}

/// One upstream registry.
#[async_trait]
pub trait Uplink: Send + Sync {
    /// Key used for this uplink in `_uplinks`.
    fn id(&self) -> &str;

    /// Fetch a manifest. `Ok(None)` means the cached copy (matching `etag`) is
    /// still current.
    async fn fetch(&self, name: &str, etag: Option<&str>)
        -> Result<Option<Fetched>, RegistryError>;
}

/// Uplink speaking the npm registry HTTP protocol.
#[derive(Debug, Clone)]
pub struct HttpUplink {
    id: String,
    base_url: Url,
    http: Client,
}

impl HttpUplink {
    /// Create an uplink from its configuration.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be created.
    pub fn new(config: &UplinkConfig) -> Result<Self, RegistryError> {
        // Trailing slash so `join` appends instead of replacing the last segment
        let url = if config.url.ends_with('/') {
            config.url.clone()
        } else {
            format!("{}/", config.url)
        };
        let base_url = Url::parse(&url).map_err(|e| {
            RegistryError::uplink(
                status::INTERNAL_ERROR,
                format!("Invalid uplink URL '{}': {e}", config.url),
            )
        })?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("regcache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RegistryError::uplink(
                    status::INTERNAL_ERROR,
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            id: config.id.clone(),
            base_url,
            http,
        })
    }

    fn manifest_url(&self, name: &str) -> Result<Url, RegistryError> {
        // Scoped packages keep the scope and name in one path segment
        let encoded_name = if name.starts_with('@') {
            name.replace('/', "%2F")
        } else {
            name.to_string()
        };

        self.base_url.join(&encoded_name).map_err(|e| {
            RegistryError::uplink(
                status::BAD_REQUEST,
                format!("Failed to build URL for '{name}': {e}"),
            )
        })
    }
}

#[async_trait]
impl Uplink for HttpUplink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(
        &self,
        name: &str,
        etag: Option<&str>,
    ) -> Result<Option<Fetched>, RegistryError> {
        let url = self.manifest_url(name)?;

        let mut request = self.http.get(url.as_str()).header(ACCEPT, "application/json");
        if let Some(etag) = etag {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_MODIFIED => return Ok(None),
            StatusCode::NOT_FOUND => return Err(RegistryError::not_found(name)),
            code if !code.is_success() => {
                return Err(RegistryError::uplink(
                    code.as_u16(),
                    format!("Uplink {} returned status {code} for '{name}'", self.id),
                ));
            }
            _ => {}
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body: serde_json::Value = response.json().await?;

        Ok(Some(Fetched {
            manifest: normalize(body),
            etag,
        }))
    }
}

/// Queries every uplink concurrently and folds the answers into the cached
/// manifest.
#[derive(Clone, Default)]
pub struct FanoutSync {
    uplinks: Vec<Arc<dyn Uplink>>,
    store: Option<Arc<dyn PackageStore>>,
}

impl FanoutSync {
    #[must_use]
    pub fn new(uplinks: Vec<Arc<dyn Uplink>>) -> Self {
        Self {
            uplinks,
            store: None,
        }
    }

    /// Build HTTP uplinks for every configured registry.
    pub fn from_config(config: &Config) -> Result<Self, RegistryError> {
        let uplinks = config
            .uplinks
            .iter()
            .map(|uplink| HttpUplink::new(uplink).map(|u| Arc::new(u) as Arc<dyn Uplink>))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(uplinks))
    }

    /// Start from the manifest held by `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn PackageStore>) -> Self {
        self.store = Some(store);
        self
    }

    async fn cached(&self, name: &str) -> Result<Option<Manifest>, RegistryError> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        match store.get_manifest(name).await {
            Ok(manifest) => Ok(Some(manifest)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UplinkSync for FanoutSync {
    async fn sync(
        &self,
        name: &str,
        etag: Option<&str>,
        options: SyncOptions,
    ) -> Result<SyncOutcome, RegistryError> {
        let mut manifest = self.cached(name).await?;

        if !options.uplinks_look || self.uplinks.is_empty() {
            return Ok(SyncOutcome {
                manifest,
                uplink_errors: Vec::new(),
            });
        }

        let tasks = self.uplinks.iter().map(|uplink| {
            let uplink = Arc::clone(uplink);
            let name = name.to_string();
            let etag = manifest
                .as_ref()
                .and_then(|m| m.uplinks.get(uplink.id()))
                .and_then(|meta| meta.etag.clone())
                .or_else(|| etag.map(String::from));
            tokio::spawn(async move { uplink.fetch(&name, etag.as_deref()).await })
        });
        let results = join_all(tasks).await;

        let mut uplink_errors = Vec::with_capacity(results.len());
        for (uplink, joined) in self.uplinks.iter().zip(results) {
            let result = joined.unwrap_or_else(|e| {
                Err(RegistryError::uplink(
                    status::INTERNAL_ERROR,
                    format!("uplink task failed: {e}"),
                ))
            });

            match result {
                Ok(Some(fetched)) => {
                    debug!(name = %name, uplink = %uplink.id(), "Merging uplink manifest");
                    let base = manifest.take().unwrap_or_else(|| blank(name));
                    let mut merged = merge(&base, &fetched.manifest);
                    merged.time = merge_time(&base.time, &fetched.manifest.time);
                    manifest = Some(attach_uplink_metadata(
                        &merged,
                        uplink.id(),
                        fetched.etag.as_deref(),
                    ));
                    uplink_errors.push(None);
                }
                Ok(None) => {
                    debug!(name = %name, uplink = %uplink.id(), "Uplink manifest not modified");
                    if let Some(current) = manifest.take() {
                        let etag = current
                            .uplinks
                            .get(uplink.id())
                            .and_then(|meta| meta.etag.clone());
                        manifest = Some(attach_uplink_metadata(
                            &current,
                            uplink.id(),
                            etag.as_deref(),
                        ));
                    }
                    uplink_errors.push(None);
                }
                Err(e) => {
                    if e.is_not_found() {
                        debug!(name = %name, uplink = %uplink.id(), "Package not on uplink");
                    } else {
                        warn!(name = %name, uplink = %uplink.id(), error = %e, "Uplink failed");
                    }
                    uplink_errors.push(Some(e));
                }
            }
        }

        Ok(SyncOutcome {
            manifest,
            uplink_errors,
        })
    }
}

fn blank(name: &str) -> Manifest {
    let mut manifest = new_manifest(name);
    manifest.revision = DEFAULT_REVISION.to_string();
    manifest
}
