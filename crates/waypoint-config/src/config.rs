//! Main configuration type.
//!
//! This module provides the top-level [`WaypointConfig`] struct and its builder.

use http::{HeaderName, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use waypoint_telemetry::{create_env_filter, LogFormat};

use crate::{ConfigError, CorsSection, DocsSection, LoggingSection, ResponseSection, ThrottleSection};

/// Complete Waypoint application configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use waypoint_config::WaypointConfig;
///
/// let config = WaypointConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(!config.throttle.enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct WaypointConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,

    /// Global throttle.
    #[serde(default)]
    pub throttle: ThrottleSection,

    /// Global CORS.
    #[serde(default)]
    pub cors: CorsSection,

    /// Initial response-init.
    #[serde(default)]
    pub response: ResponseSection,

    /// Documentation metadata, if a docs endpoint is wanted.
    #[serde(default)]
    pub docs: Option<DocsSection>,
}

impl WaypointConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> WaypointConfigBuilder {
        WaypointConfigBuilder::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a valid filter directive
    /// - The throttle is enabled with a zero limit or window
    /// - A CORS method is not a valid HTTP method
    /// - The default status or a default header is not valid HTTP
    /// - The docs path does not start with `/`
    pub fn validate(&self) -> Result<(), ConfigError> {
        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        if self.throttle.enabled {
            if self.throttle.limit == 0 {
                return Err(ConfigError::invalid_value(
                    "throttle.limit",
                    "must be greater than zero",
                ));
            }
            if self.throttle.window_ms == 0 {
                return Err(ConfigError::invalid_value(
                    "throttle.window_ms",
                    "must be greater than zero",
                ));
            }
        }

        if self.cors.enabled {
            if self.cors.origins.is_empty() {
                return Err(ConfigError::invalid_value(
                    "cors.origins",
                    "at least one origin is required",
                ));
            }
            for method in &self.cors.methods {
                if Method::from_bytes(method.as_bytes()).is_err() {
                    return Err(ConfigError::invalid_value(
                        "cors.methods",
                        format!("invalid HTTP method: {method}"),
                    ));
                }
            }
        }

        if let Some(status) = self.response.status {
            if StatusCode::from_u16(status).is_err() {
                return Err(ConfigError::invalid_value(
                    "response.status",
                    format!("invalid status code: {status}"),
                ));
            }
        }

        for (name, value) in &self.response.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::invalid_value(
                    "response.headers",
                    format!("invalid header name: {name}"),
                ));
            }
            if HeaderValue::from_str(value).is_err() {
                return Err(ConfigError::invalid_value(
                    "response.headers",
                    format!("invalid value for header {name}"),
                ));
            }
        }

        if let Some(docs) = &self.docs {
            if !docs.path.starts_with('/') {
                return Err(ConfigError::invalid_value(
                    "docs.path",
                    format!("must start with '/': {}", docs.path),
                ));
            }
        }

        Ok(())
    }

    /// Development preset: pretty debug logging, permissive CORS.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config.cors.enabled = true;

        config
    }

    /// Production preset: JSON logging, global throttle on.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.throttle.enabled = true;

        config
    }
}

/// Builder for [`WaypointConfig`].
#[derive(Debug, Default)]
pub struct WaypointConfigBuilder {
    logging: Option<LoggingSection>,
    throttle: Option<ThrottleSection>,
    cors: Option<CorsSection>,
    response: Option<ResponseSection>,
    docs: Option<DocsSection>,
}

impl WaypointConfigBuilder {
    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the throttle section.
    #[must_use]
    pub fn throttle(mut self, throttle: ThrottleSection) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Set the CORS section.
    #[must_use]
    pub fn cors(mut self, cors: CorsSection) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Set the response section.
    #[must_use]
    pub fn response(mut self, response: ResponseSection) -> Self {
        self.response = Some(response);
        self
    }

    /// Set the docs section.
    #[must_use]
    pub fn docs(mut self, docs: DocsSection) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> WaypointConfig {
        WaypointConfig {
            logging: self.logging.unwrap_or_default(),
            throttle: self.throttle.unwrap_or_default(),
            cors: self.cors.unwrap_or_default(),
            response: self.response.unwrap_or_default(),
            docs: self.docs,
        }
    }

    /// Build and validate the configuration.
    pub fn build_validated(self) -> Result<WaypointConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = WaypointConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.docs.is_none());
    }

    #[test]
    fn test_builder_sections() {
        let config = WaypointConfig::builder()
            .throttle(ThrottleSection {
                enabled: true,
                limit: 10,
                ..Default::default()
            })
            .docs(DocsSection::default())
            .build();

        assert_eq!(config.throttle.limit, 10);
        assert_eq!(config.docs.unwrap().path, "/docs");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_zero_throttle_limit() {
        let result = WaypointConfig::builder()
            .throttle(ThrottleSection {
                enabled: true,
                limit: 0,
                ..Default::default()
            })
            .build_validated();

        assert!(result.unwrap_err().to_string().contains("throttle.limit"));
    }

    #[test]
    fn test_disabled_throttle_not_checked() {
        let result = WaypointConfig::builder()
            .throttle(ThrottleSection {
                enabled: false,
                window_ms: 0,
                ..Default::default()
            })
            .build_validated();

        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_bad_log_level() {
        let config = WaypointConfig::builder()
            .logging(LoggingSection {
                level: "waypoint=shouting".to_string(),
                ..Default::default()
            })
            .build();

        assert!(config.validate().unwrap_err().to_string().contains("logging.level"));
    }

    #[test]
    fn test_validate_bad_cors_method() {
        let config = WaypointConfig::builder()
            .cors(CorsSection {
                enabled: true,
                methods: vec!["GET".to_string(), "NOT A METHOD".to_string()],
                ..Default::default()
            })
            .build();

        assert!(config.validate().unwrap_err().to_string().contains("cors.methods"));
    }

    #[test]
    fn test_validate_response_section() {
        let mut config = WaypointConfig::default();
        config.response.status = Some(42);
        assert!(config.validate().unwrap_err().to_string().contains("response.status"));

        let mut config = WaypointConfig::default();
        config
            .response
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(config.validate().unwrap_err().to_string().contains("response.headers"));
    }

    #[test]
    fn test_validate_docs_path() {
        let config = WaypointConfig::builder()
            .docs(DocsSection {
                path: "docs".to_string(),
                ..Default::default()
            })
            .build();

        assert!(config.validate().unwrap_err().to_string().contains("docs.path"));
    }

    #[test]
    fn test_presets() {
        let dev = WaypointConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.cors.enabled);

        let prod = WaypointConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(prod.throttle.enabled);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip_sections() {
        let config = WaypointConfig::production();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[logging]"));
        assert!(toml_str.contains("[throttle]"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<WaypointConfig, _> = toml::from_str("[server]\nhttp_addr = \"0.0.0.0:80\"");
        assert!(result.is_err());
    }
}
