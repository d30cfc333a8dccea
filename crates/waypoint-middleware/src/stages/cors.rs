//! CORS (Cross-Origin Resource Sharing) middleware.
//!
//! Contributes the `Access-Control-Allow-*` headers to the accumulator when
//! the request's origin is allowed. Requests from other origins pass through
//! without CORS headers, so the browser blocks them.
//!
//! | Header | Value |
//! |--------|-------|
//! | `Access-Control-Allow-Origin` | the request origin, or `*` without one |
//! | `Access-Control-Allow-Methods` | configured methods joined with `", "` |
//! | `Access-Control-Allow-Headers` | configured headers joined with `", "` |
//! | `Access-Control-Max-Age` | seconds |
//! | `Access-Control-Allow-Credentials` | `true`, only when enabled |
//!
//! ## Example
//!
//! ```
//! use waypoint_middleware::stages::Cors;
//!
//! let cors = Cors::builder()
//!     .allow_origin("https://app.example.com")
//!     .allow_credentials(true)
//!     .build();
//! assert!(cors.is_origin_allowed(Some("https://app.example.com")));
//! assert!(!cors.is_origin_allowed(Some("https://evil.example.com")));
//! ```

use crate::middleware::{Middleware, MiddlewareResult};
use http::{HeaderValue, Method};
use std::collections::HashSet;
use std::time::Duration;
use waypoint_core::{BoxFuture, IncomingRequest, ResponseInit, WaypointError};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
    /// `Origin` header.
    pub const ORIGIN: &str = "origin";
}

/// Represents the set of allowed origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Allow any origin (wildcard `*`).
    Any,
    /// Allow specific origins.
    List(HashSet<String>),
}

impl AllowedOrigins {
    /// Builds the set from configured strings, where `*` means any.
    pub fn from_list<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: HashSet<String> = origins.into_iter().map(Into::into).collect();
        if set.contains("*") {
            Self::Any
        } else {
            Self::List(set)
        }
    }

    /// Checks if a request with this origin (or none) is allowed.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::Any, _) => true,
            (Self::List(origins), Some(origin)) => origins.contains(origin),
            (Self::List(_), None) => false,
        }
    }
}

/// CORS middleware.
#[derive(Debug, Clone)]
pub struct Cors {
    allowed_origins: AllowedOrigins,
    allowed_methods: Vec<Method>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    max_age: Duration,
}

impl Default for Cors {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::Any,
            allowed_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: false,
            max_age: Duration::from_secs(86400),
        }
    }
}

impl Cors {
    /// Creates a new CORS builder.
    #[must_use]
    pub fn builder() -> CorsBuilder {
        CorsBuilder::default()
    }

    /// Checks whether CORS headers are emitted for this origin.
    #[must_use]
    pub fn is_origin_allowed(&self, origin: Option<&str>) -> bool {
        self.allowed_origins.is_allowed(origin)
    }

    /// The fragment contributed for a request with `origin`.
    pub fn fragment(&self, origin: Option<&str>) -> Result<Option<ResponseInit>, WaypointError> {
        if !self.is_origin_allowed(origin) {
            return Ok(None);
        }

        let methods = self
            .allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let mut init = ResponseInit::new()
            .try_header(headers::ALLOW_ORIGIN, origin.unwrap_or("*"))?
            .try_header(headers::ALLOW_METHODS, &methods)?
            .try_header(headers::ALLOW_HEADERS, &self.allowed_headers.join(", "))?
            .header(headers::MAX_AGE, HeaderValue::from(self.max_age.as_secs()));

        if self.allow_credentials {
            init = init.header(headers::ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        }

        Ok(Some(init))
    }
}

impl Middleware for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn handle<'a>(
        &'a self,
        request: &'a IncomingRequest,
        _init: &'a ResponseInit,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move { self.fragment(request.header(headers::ORIGIN)) })
    }
}

/// Builder for [`Cors`].
///
/// Starts from the defaults: any origin, `GET, POST, PUT, DELETE, OPTIONS`,
/// `Content-Type, Authorization`, no credentials, one day max age.
#[derive(Debug, Clone, Default)]
pub struct CorsBuilder {
    config: Cors,
    origins: Option<HashSet<String>>,
}

impl CorsBuilder {
    /// Allows any origin.
    #[must_use]
    pub fn allow_any_origin(mut self) -> Self {
        self.origins = None;
        self.config.allowed_origins = AllowedOrigins::Any;
        self
    }

    /// Adds an allowed origin, switching off the wildcard default.
    #[must_use]
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.get_or_insert_with(HashSet::new).insert(origin.into());
        self
    }

    /// Adds several allowed origins. `*` allows any.
    #[must_use]
    pub fn allow_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self.origins.get_or_insert_with(HashSet::new);
        set.extend(origins.into_iter().map(Into::into));
        self
    }

    /// Replaces the allowed methods.
    #[must_use]
    pub fn allow_methods<I>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        self.config.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Replaces the allowed request headers.
    #[must_use]
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.allowed_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether credentials are allowed.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.config.allow_credentials = allow;
        self
    }

    /// Sets the preflight cache duration.
    #[must_use]
    pub fn max_age(mut self, duration: Duration) -> Self {
        self.config.max_age = duration;
        self
    }

    /// Builds the CORS middleware.
    #[must_use]
    pub fn build(mut self) -> Cors {
        if let Some(origins) = self.origins {
            self.config.allowed_origins = AllowedOrigins::from_list(origins);
        }
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn request_with_origin(origin: Option<&str>) -> IncomingRequest {
        let mut builder = http::Request::get("/api/users");
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        IncomingRequest::from_parts(builder.body(()).unwrap().into_parts().0, Bytes::new())
    }

    #[test]
    fn test_defaults_allow_any_origin() {
        let init = Cors::default().fragment(None).unwrap().unwrap();
        let map = init.headers();
        assert_eq!(map[headers::ALLOW_ORIGIN], "*");
        assert_eq!(map[headers::ALLOW_METHODS], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(map[headers::ALLOW_HEADERS], "Content-Type, Authorization");
        assert_eq!(map[headers::MAX_AGE], "86400");
        assert!(!map.contains_key(headers::ALLOW_CREDENTIALS));
    }

    #[test]
    fn test_any_origin_echoes_request_origin() {
        let init = Cors::default().fragment(Some("https://a.example")).unwrap().unwrap();
        assert_eq!(init.headers()[headers::ALLOW_ORIGIN], "https://a.example");
    }

    #[test]
    fn test_list_rejects_unknown_and_missing_origin() {
        let cors = Cors::builder().allow_origin("https://a.example").build();
        assert!(cors.fragment(Some("https://b.example")).unwrap().is_none());
        assert!(cors.fragment(None).unwrap().is_none());
        assert!(cors.fragment(Some("https://a.example")).unwrap().is_some());
    }

    #[test]
    fn test_wildcard_in_list_means_any() {
        let cors = Cors::builder().allow_origins(["https://a.example", "*"]).build();
        assert!(cors.is_origin_allowed(Some("https://z.example")));
    }

    #[test]
    fn test_credentials_and_custom_lists() {
        let cors = Cors::builder()
            .allow_methods([Method::GET, Method::PATCH])
            .allow_headers(["X-Api-Key"])
            .allow_credentials(true)
            .max_age(Duration::from_secs(600))
            .build();
        let init = cors.fragment(Some("https://a.example")).unwrap().unwrap();
        let map = init.headers();
        assert_eq!(map[headers::ALLOW_METHODS], "GET, PATCH");
        assert_eq!(map[headers::ALLOW_HEADERS], "X-Api-Key");
        assert_eq!(map[headers::ALLOW_CREDENTIALS], "true");
        assert_eq!(map[headers::MAX_AGE], "600");
    }

    #[tokio::test]
    async fn test_middleware_reads_origin_header() {
        let cors = Cors::builder().allow_origin("https://a.example").build();
        let init = ResponseInit::new();

        let allowed = cors.handle(&request_with_origin(Some("https://a.example")), &init).await;
        assert!(allowed.unwrap().is_some());

        let denied = cors.handle(&request_with_origin(Some("https://x.example")), &init).await;
        assert!(denied.unwrap().is_none());
    }
}
