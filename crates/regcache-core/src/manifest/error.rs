//! Registry error type shared by the checks and the collaborator traits.

use std::fmt;

/// Registry error codes.
pub mod codes {
    pub const PACKAGE_EXISTS: &str = "PACKAGE_EXISTS";
    pub const UPLINK_OFFLINE_PUBLISH: &str = "UPLINK_OFFLINE_PUBLISH";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PUBLISH_MALFORMED: &str = "PUBLISH_MALFORMED";
    pub const UPLINK_ERROR: &str = "UPLINK_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const BAD_DATA: &str = "BAD_DATA";
}

/// HTTP-like status codes carried by [`RegistryError`].
pub mod status {
    pub const BAD_REQUEST: u16 = 400;
    pub const NOT_FOUND: u16 = 404;
    pub const CONFLICT: u16 = 409;
    pub const INTERNAL_ERROR: u16 = 500;
    pub const BAD_GATEWAY: u16 = 502;
    pub const SERVICE_UNAVAILABLE: u16 = 503;
}

/// Error reported by the store, an uplink, or one of the existence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    status: u16,
    code: &'static str,
    message: String,
}

impl RegistryError {
    /// Create a new error with the given status, code and message.
    #[must_use]
    pub fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP-like status.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is the one status that does not block a publish.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status == status::NOT_FOUND
    }

    /// The package name is already taken.
    #[must_use]
    pub fn conflict(name: &str) -> Self {
        Self::new(
            status::CONFLICT,
            codes::PACKAGE_EXISTS,
            format!("this package is already present: {name}"),
        )
    }

    /// An uplink is unreachable and offline publishing is disabled.
    #[must_use]
    pub fn service_unavailable(name: &str) -> Self {
        Self::new(
            status::SERVICE_UNAVAILABLE,
            codes::UPLINK_OFFLINE_PUBLISH,
            format!("one of the uplinks is down, refusing to publish {name}"),
        )
    }

    /// Package not found.
    #[must_use]
    pub fn not_found(name: &str) -> Self {
        Self::new(
            status::NOT_FOUND,
            codes::NOT_FOUND,
            format!("no such package available: {name}"),
        )
    }

    /// Malformed publish body.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(status::BAD_REQUEST, codes::PUBLISH_MALFORMED, msg)
    }

    /// Uplink failure with the status the uplink answered with.
    pub fn uplink(status: u16, msg: impl Into<String>) -> Self {
        Self::new(status, codes::UPLINK_ERROR, msg)
    }

    /// Storage failure.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::new(status::INTERNAL_ERROR, codes::STORE_ERROR, msg)
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for RegistryError {}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(code) = e.status() {
            Self::uplink(code.as_u16(), e.to_string())
        } else if e.is_decode() {
            Self::new(
                status::BAD_GATEWAY,
                codes::BAD_DATA,
                format!("Invalid JSON: {e}"),
            )
        } else if e.is_timeout() {
            Self::uplink(
                status::SERVICE_UNAVAILABLE,
                format!("Request timed out: {e}"),
            )
        } else if e.is_connect() {
            Self::uplink(
                status::SERVICE_UNAVAILABLE,
                format!("Connection failed: {e}"),
            )
        } else {
            Self::uplink(status::SERVICE_UNAVAILABLE, e.to_string())
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(
            status::BAD_GATEWAY,
            codes::BAD_DATA,
            format!("Invalid JSON: {e}"),
        )
    }
}
