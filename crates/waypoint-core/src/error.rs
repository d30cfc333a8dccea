//! Error types for Waypoint.
//!
//! Every failure inside the dispatch pipeline is a [`WaypointError`]. The
//! dispatcher converts it into an HTTP response at a single recovery point,
//! so handlers, hooks and middleware simply return `Err(...)`.
//!
//! | Variant | Status | `error` field of the body |
//! |---------|--------|---------------------------|
//! | `NotFound` | 404 | `"<path> not found!"` |
//! | `MethodNotAllowed` | 405 | the request method |
//! | `Validation` | 400 | array of field issues |
//! | `Domain` | its own status | its message |
//! | `Unknown` | 500 | the message only |

use crate::schema::{ValidationError, ValidationIssue};
use http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

/// Result type alias using [`WaypointError`].
pub type WaypointResult<T> = Result<T, WaypointError>;

/// Standard error type for the dispatch pipeline.
///
/// # Example
///
/// ```
/// use waypoint_core::WaypointError;
/// use http::StatusCode;
///
/// fn find_user(id: &str) -> Result<String, WaypointError> {
///     if id != "1" {
///         return Err(WaypointError::domain(StatusCode::NOT_FOUND, "User not found"));
///     }
///     Ok("alice".to_string())
/// }
///
/// let err = find_user("2").unwrap_err();
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.body(), serde_json::json!({"error": "User not found"}));
/// ```
#[derive(Error, Debug)]
pub enum WaypointError {
    /// No registered path pattern matches the request path.
    #[error("{path} not found!")]
    NotFound {
        /// The request path.
        path: String,
    },

    /// The path matched but nothing is registered for the method.
    #[error("{method}")]
    MethodNotAllowed {
        /// The request method.
        method: String,
    },

    /// A declared schema rejected its input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An application error with an explicit status.
    #[error("{message}")]
    Domain {
        /// HTTP status to respond with.
        status: StatusCode,
        /// Message exposed to the client.
        message: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Unknown {
        /// Message exposed to the client.
        message: String,
        /// The underlying error, logged but never sent over the wire.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl WaypointError {
    /// Creates a not found error for `path`.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a method not allowed error.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            method: method.into(),
        }
    }

    /// Creates a domain error with an explicit status.
    #[must_use]
    pub fn domain(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Domain {
            status,
            message: message.into(),
        }
    }

    /// Creates an unknown error from a message.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a `429 Too Many Requests` domain error.
    #[must_use]
    pub fn too_many_requests() -> Self {
        Self::domain(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests")
    }

    /// Returns the HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Domain { status, .. } => *status,
            Self::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation issues, if this is a validation error.
    #[must_use]
    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Self::Validation(err) => Some(err.issues()),
            _ => None,
        }
    }

    /// Renders the client-facing error body, `{"error": ...}`.
    #[must_use]
    pub fn body(&self) -> Value {
        match self {
            Self::Validation(err) => json!({ "error": err.issues() }),
            other => json!({ "error": other.to_string() }),
        }
    }
}

impl From<anyhow::Error> for WaypointError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<WaypointError>() {
            Ok(inner) => inner,
            Err(err) => Self::Unknown {
                message: err.to_string(),
                source: Some(err),
            },
        }
    }
}

impl From<serde_json::Error> for WaypointError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown {
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}
