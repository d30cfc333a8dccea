//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, `.env` and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use waypoint_telemetry::LogFormat;

use crate::{ConfigError, DocsSection, WaypointConfig};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use waypoint_config::ConfigLoader;
///
/// # fn main() -> Result<(), waypoint_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("waypoint.toml")?
///     .with_env_prefix("WAYPOINT")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: WaypointConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: WaypointConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is what `new()` does, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = WaypointConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use waypoint_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = WaypointConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = WaypointConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// ```
    /// use waypoint_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [throttle]
    ///     enabled = true
    ///     limit = 20
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.throttle.limit, 20);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the format `PREFIX__SECTION__KEY`, for example
    /// `WAYPOINT__THROTTLE__LIMIT=50` or `WAYPOINT__CORS__ORIGINS=https://a.example,https://b.example`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load a `.env` file from the current directory or its parents.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Dotenv` if a file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Finalize: apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<WaypointConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> WaypointConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<WaypointConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Shares the prefix but not the separator, e.g. WAYPOINTS_HOME.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = value
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::env_parse_error(key, "expected 'json', 'pretty' or 'compact'"))?;
            }
            ["LOGGING", "SERVICE_NAME"] => config.logging.service_name = value.to_string(),
            ["LOGGING", "INCLUDE_LOCATION"] => {
                config.logging.include_location = parse_bool_var(key, value)?;
            }

            ["THROTTLE", "ENABLED"] => config.throttle.enabled = parse_bool_var(key, value)?,
            ["THROTTLE", "LIMIT"] => config.throttle.limit = parse_int_var(key, value)?,
            ["THROTTLE", "WINDOW_MS"] => config.throttle.window_ms = parse_int_var(key, value)?,
            ["THROTTLE", "CAPACITY"] => config.throttle.capacity = parse_int_var(key, value)?,

            ["CORS", "ENABLED"] => config.cors.enabled = parse_bool_var(key, value)?,
            ["CORS", "ORIGINS"] => config.cors.origins = parse_list(value),
            ["CORS", "METHODS"] => config.cors.methods = parse_list(value),
            ["CORS", "HEADERS"] => config.cors.headers = parse_list(value),
            ["CORS", "CREDENTIALS"] => config.cors.credentials = parse_bool_var(key, value)?,
            ["CORS", "MAX_AGE_SECS"] => config.cors.max_age_secs = parse_int_var(key, value)?,

            ["RESPONSE", "STATUS"] => {
                config.response.status = if value.is_empty() {
                    None
                } else {
                    Some(parse_int_var(key, value)?)
                };
            }
            ["RESPONSE", "HEADERS", name] => {
                config
                    .response
                    .headers
                    .insert(name.to_lowercase().replace('_', "-"), value.to_string());
            }

            ["DOCS", "PATH"] => docs_mut(config).path = value.to_string(),
            ["DOCS", "TITLE"] => docs_mut(config).title = value.to_string(),
            ["DOCS", "VERSION"] => docs_mut(config).version = value.to_string(),

            _ => {}
        }

        Ok(())
    }
}

fn docs_mut(config: &mut WaypointConfig) -> &mut DocsSection {
    config.docs.get_or_insert_with(DocsSection::default)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn parse_int_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
