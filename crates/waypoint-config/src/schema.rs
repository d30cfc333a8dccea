//! Configuration section types.
//!
//! Every section rejects unknown keys and fills missing keys with defaults,
//! so a file only needs to mention what it changes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use waypoint_telemetry::{LogConfig, LogFormat};

/// Logging section.
///
/// # Example
///
/// ```
/// use waypoint_config::LoggingSection;
///
/// let section = LoggingSection::default();
/// assert_eq!(section.level, "info");
/// assert_eq!(section.to_log_config().service_name, "waypoint");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info" or "waypoint=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Service name logged at start-up.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Include file and line in each event.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            service_name: default_service_name(),
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts the section into a [`LogConfig`] for `init_logging`.
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            format: self.format,
            include_location: self.include_location,
            service_name: self.service_name.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "waypoint".to_string()
}

/// Global throttle section.
///
/// Disabled unless the file turns it on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ThrottleSection {
    /// Install a global throttle.
    #[serde(default)]
    pub enabled: bool,

    /// Requests allowed per client per window.
    #[serde(default = "default_throttle_limit")]
    pub limit: u64,

    /// Window length in milliseconds.
    #[serde(default = "default_throttle_window_ms")]
    pub window_ms: u64,

    /// Number of clients tracked before the least recent is evicted.
    #[serde(default = "default_throttle_capacity")]
    pub capacity: usize,
}

impl Default for ThrottleSection {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: default_throttle_limit(),
            window_ms: default_throttle_window_ms(),
            capacity: default_throttle_capacity(),
        }
    }
}

fn default_throttle_limit() -> u64 {
    100
}

fn default_throttle_window_ms() -> u64 {
    60_000
}

fn default_throttle_capacity() -> usize {
    100_000
}

/// Global CORS section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    /// Install global CORS middleware.
    #[serde(default)]
    pub enabled: bool,

    /// Allowed origins. `"*"` allows any.
    #[serde(default = "default_cors_origins")]
    pub origins: Vec<String>,

    /// Allowed methods.
    #[serde(default = "default_cors_methods")]
    pub methods: Vec<String>,

    /// Allowed request headers.
    #[serde(default = "default_cors_headers")]
    pub headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    #[serde(default)]
    pub credentials: bool,

    /// Preflight cache duration in seconds.
    #[serde(default = "default_cors_max_age")]
    pub max_age_secs: u64,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: default_cors_origins(),
            methods: default_cors_methods(),
            headers: default_cors_headers(),
            credentials: false,
            max_age_secs: default_cors_max_age(),
        }
    }
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_methods() -> Vec<String> {
    ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Authorization".to_string()]
}

fn default_cors_max_age() -> u64 {
    86_400
}

/// Initial response-init applied before any middleware.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponseSection {
    /// Default status for every response.
    #[serde(default)]
    pub status: Option<u16>,

    /// Default headers for every response.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Documentation endpoint metadata.
///
/// Recorded for external document generators; nothing is served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocsSection {
    /// Path the document would be served at.
    #[serde(default = "default_docs_path")]
    pub path: String,

    /// Document title.
    #[serde(default = "default_docs_title")]
    pub title: String,

    /// API version.
    #[serde(default = "default_docs_version")]
    pub version: String,
}

impl Default for DocsSection {
    fn default() -> Self {
        Self {
            path: default_docs_path(),
            title: default_docs_title(),
            version: default_docs_version(),
        }
    }
}

fn default_docs_path() -> String {
    "/docs".to_string()
}

fn default_docs_title() -> String {
    "API".to_string()
}

fn default_docs_version() -> String {
    "1.0.0".to_string()
}

fn default_true() -> bool {
    true
}
