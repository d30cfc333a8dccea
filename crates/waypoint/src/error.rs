//! Application construction errors.

use http::Method;
use thiserror::Error;
use waypoint_config::ConfigError;
use waypoint_router::InsertError;

/// Errors raised while building an [`App`](crate::App).
///
/// Dispatch itself never fails; these only surface at start-up.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A route could not be inserted into the route table.
    #[error("failed to register {method} {path}: {source}")]
    Route {
        /// Method of the rejected route.
        method: Method,
        /// Joined path of the rejected route.
        path: String,
        /// Why the table rejected it.
        #[source]
        source: InsertError,
    },

    /// The file configuration could not be turned into an [`AppConfig`](crate::AppConfig).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_error_display() {
        let err = LoadError::Route {
            method: Method::TRACE,
            path: "/users".to_string(),
            source: InsertError::UnsupportedMethod {
                method: Method::TRACE,
                path: "/users".to_string(),
            },
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to register TRACE /users"));
    }
}
