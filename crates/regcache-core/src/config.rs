use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable that forces offline publishing on or off.
pub const ALLOW_OFFLINE_PUBLISH_ENV: &str = "REGCACHE_ALLOW_OFFLINE_PUBLISH";

/// Default per-request timeout for uplinks, in seconds.
pub const DEFAULT_UPLINK_TIMEOUT_SECS: u64 = 30;

/// Default connect timeout for uplinks, in seconds.
pub const DEFAULT_UPLINK_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Runtime configuration for the registry cache core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Accept a publish even when an uplink could not confirm the name is free.
    pub allow_offline_publish: bool,

    /// Keep `_uplinks` bookkeeping in manifests returned to clients.
    pub keep_uplink_data: bool,

    /// Upstream registries, in lookup order.
    pub uplinks: Vec<UplinkConfig>,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

/// One upstream registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkConfig {
    /// Identifier used as the key in `_uplinks`.
    pub id: String,

    /// Base URL of the registry.
    pub url: String,

    /// Overall request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_UPLINK_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_UPLINK_CONNECT_TIMEOUT_SECS
}

impl UplinkConfig {
    #[must_use]
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            timeout_secs: DEFAULT_UPLINK_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_UPLINK_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Set both timeouts, in seconds.
    #[must_use]
    pub fn with_timeouts(mut self, connect_secs: u64, total_secs: u64) -> Self {
        self.connect_timeout_secs = connect_secs;
        self.timeout_secs = total_secs;
        self
    }
}

impl Config {
    /// Load configuration from a JSON file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config.with_env_overrides())
    }

    /// Apply `REGCACHE_ALLOW_OFFLINE_PUBLISH` if it is set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(ALLOW_OFFLINE_PUBLISH_ENV) {
            self.allow_offline_publish = parse_flag(&value);
        }
        self
    }

    /// Set offline publishing.
    #[must_use]
    pub fn with_allow_offline_publish(mut self, allow: bool) -> Self {
        self.allow_offline_publish = allow;
        self
    }

    /// Set whether `_uplinks` survives projection.
    #[must_use]
    pub fn with_keep_uplink_data(mut self, keep: bool) -> Self {
        self.keep_uplink_data = keep;
        self
    }

    /// Append an uplink.
    #[must_use]
    pub fn with_uplink(mut self, uplink: UplinkConfig) -> Self {
        self.uplinks.push(uplink);
        self
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.allow_offline_publish);
        assert!(!config.keep_uplink_data);
        assert!(config.uplinks.is_empty());
    }

    #[test]
    #[serial]
    fn test_load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"keep_uplink_data": true, "uplinks": [{{"id": "npmjs", "url": "https://registry.npmjs.org/"}}]}}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.keep_uplink_data);
        assert_eq!(config.uplinks.len(), 1);
        assert_eq!(config.uplinks[0].id, "npmjs");
        assert_eq!(config.uplinks[0].timeout_secs, DEFAULT_UPLINK_TIMEOUT_SECS);
        assert_eq!(
            config.uplinks[0].connect_timeout_secs,
            DEFAULT_UPLINK_CONNECT_TIMEOUT_SECS
        );
    }

    #[test]
    #[serial]
    fn test_uplink_timeouts_from_file() {
        let file = config_file(
            r#"{"uplinks": [{"id": "slow", "url": "http://x/", "timeout_secs": 90, "connect_timeout_secs": 12}]}"#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(
            config.uplinks[0],
            UplinkConfig::new("slow", "http://x/").with_timeouts(12, 90)
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/regcache.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    #[serial]
    fn test_env_override_wins_over_file() {
        let file = config_file(r#"{"allow_offline_publish": false}"#);

        std::env::set_var(ALLOW_OFFLINE_PUBLISH_ENV, "yes");
        let config = Config::load(file.path()).unwrap();
        assert!(config.allow_offline_publish);

        std::env::remove_var(ALLOW_OFFLINE_PUBLISH_ENV);
        let config = Config::load(file.path()).unwrap();
        assert!(!config.allow_offline_publish);
    }

    #[test]
    #[serial]
    fn test_env_override_can_disable() {
        let file = config_file(r#"{"allow_offline_publish": true}"#);

        std::env::set_var(ALLOW_OFFLINE_PUBLISH_ENV, "0");
        let config = Config::default().with_allow_offline_publish(true);
        assert!(!config.with_env_overrides().allow_offline_publish);
        assert!(!Config::load(file.path()).unwrap().allow_offline_publish);

        // Clean up
        std::env::remove_var(ALLOW_OFFLINE_PUBLISH_ENV);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_allow_offline_publish(true)
            .with_keep_uplink_data(true)
            .with_uplink(UplinkConfig::new("npmjs", "https://registry.npmjs.org/"))
            .with_verbosity(2)
            .with_json_logs(true);
        assert!(config.allow_offline_publish);
        assert!(config.keep_uplink_data);
        assert_eq!(config.uplinks[0].url, "https://registry.npmjs.org/");
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
    }
}
