//! Programmatic application configuration.

use http::{HeaderName, HeaderValue, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use waypoint_config::{ConfigError, WaypointConfig};
use waypoint_core::ResponseInit;
use waypoint_middleware::stages::{Cors, Throttle};
use waypoint_middleware::{Middleware, SharedMiddleware};

/// Where an external generator should serve API documentation.
///
/// Waypoint does not generate the document itself; it only records where it
/// belongs and exposes the route metadata through [`App::routes`](crate::App::routes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsConfig {
    /// Path of the documentation route.
    pub path: String,
    /// Document title.
    pub title: String,
    /// Document version.
    pub version: String,
}

/// Application-wide dispatch settings.
#[derive(Clone, Default)]
pub struct AppConfig {
    /// The accumulator every request starts from, e.g. default headers.
    pub response_init: ResponseInit,
    /// Global middleware, run before controller and method middleware.
    pub middleware: Vec<SharedMiddleware>,
    /// Documentation endpoint settings.
    pub docs: Option<DocsConfig>,
}

impl AppConfig {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Builds the dispatch settings described by a file configuration.
    ///
    /// Response defaults become the initial accumulator; a configured status
    /// applies when neither the route nor its hook sets one. Enabled CORS and
    /// throttle sections become global middleware, CORS first so its
    /// headers are already present when the throttle rejects a request.
    pub fn from_config(config: &WaypointConfig) -> Result<Self, ConfigError> {
        let mut init = ResponseInit::new();

        if let Some(code) = config.response.status {
            let status = StatusCode::from_u16(code)
                .map_err(|e| ConfigError::invalid_value("response.status", e.to_string()))?;
            init = init.status(status);
        }

        for (name, value) in &config.response.headers {
            let field = format!("response.headers.{name}");
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::invalid_value(field.clone(), e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ConfigError::invalid_value(field, e.to_string()))?;
            init = init.header(header, value);
        }

        let mut builder = Self::builder().response_init(init);

        if config.cors.enabled {
            let methods = config
                .cors
                .methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.as_bytes())
                        .map_err(|e| ConfigError::invalid_value("cors.methods", e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let cors = Cors::builder()
                .allow_origins(config.cors.origins.iter().cloned())
                .allow_methods(methods)
                .allow_headers(config.cors.headers.iter().cloned())
                .allow_credentials(config.cors.credentials)
                .max_age(Duration::from_secs(config.cors.max_age_secs))
                .build();
            builder = builder.middleware(cors);
        }

        if config.throttle.enabled {
            let throttle = Throttle::builder()
                .limit(config.throttle.limit)
                .window_ms(config.throttle.window_ms)
                .capacity(config.throttle.capacity)
                .build();
            builder = builder.middleware(throttle);
        }

        if let Some(docs) = &config.docs {
            builder = builder.docs(DocsConfig {
                path: docs.path.clone(),
                title: docs.title.clone(),
                version: docs.version.clone(),
            });
        }

        Ok(builder.build())
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("response_init", &self.response_init)
            .field("middleware", &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>())
            .field("docs", &self.docs)
            .finish()
    }
}

/// Builder for [`AppConfig`].
#[derive(Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Sets the initial accumulator.
    #[must_use]
    pub fn response_init(mut self, init: ResponseInit) -> Self {
        self.config.response_init = init;
        self
    }

    /// Appends a global middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.middleware_shared(Arc::new(middleware))
    }

    /// Appends an already shared global middleware.
    #[must_use]
    pub fn middleware_shared(mut self, middleware: SharedMiddleware) -> Self {
        self.config.middleware.push(middleware);
        self
    }

    /// Sets the documentation endpoint.
    #[must_use]
    pub fn docs(mut self, docs: DocsConfig) -> Self {
        self.config.docs = Some(docs);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_config::{CorsSection, DocsSection, ResponseSection, ThrottleSection};

    #[test]
    fn test_default_config_is_empty() {
        let config = AppConfig::default();
        assert!(config.response_init.is_empty());
        assert!(config.middleware.is_empty());
        assert!(config.docs.is_none());
    }

    #[test]
    fn test_from_default_file_config() {
        let config = AppConfig::from_config(&WaypointConfig::default()).unwrap();
        assert!(config.response_init.is_empty());
        assert!(config.middleware.is_empty());
    }

    #[test]
    fn test_from_config_builds_middleware_in_order() {
        let file = WaypointConfig::builder()
            .cors(CorsSection {
                enabled: true,
                ..CorsSection::default()
            })
            .throttle(ThrottleSection {
                enabled: true,
                limit: 5,
                ..ThrottleSection::default()
            })
            .response(ResponseSection {
                status: Some(202),
                headers: [("x-powered-by".to_string(), "waypoint".to_string())].into(),
            })
            .docs(DocsSection::default())
            .build();

        let config = AppConfig::from_config(&file).unwrap();
        let names: Vec<_> = config.middleware.iter().map(|m| m.name()).collect();
        assert_eq!(names, ["cors", "throttle"]);
        assert_eq!(config.response_init.status_code(), Some(StatusCode::ACCEPTED));
        assert_eq!(config.response_init.headers()["x-powered-by"], "waypoint");
        assert_eq!(config.docs.unwrap().path, "/docs");
    }

    #[test]
    fn test_from_config_rejects_bad_header() {
        let file = WaypointConfig::builder()
            .response(ResponseSection {
                status: None,
                headers: [("bad header".to_string(), "x".to_string())].into(),
            })
            .build();

        let err = AppConfig::from_config(&file).unwrap_err();
        assert!(err.to_string().contains("response.headers.bad header"));
    }
}
