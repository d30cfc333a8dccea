//! Request logging middleware.
//!
//! Emits `"{method} {url}"` through `tracing` at a chosen level and
//! contributes nothing to the response.

use crate::middleware::{Middleware, MiddlewareResult};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use waypoint_core::{BoxFuture, IncomingRequest, ResponseInit};

/// Severity used by [`RequestLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    /// Verbose diagnostics.
    #[default]
    Debug,
    /// Routine events.
    Info,
    /// Unexpected but handled.
    Warn,
    /// Failures.
    Error,
}

/// An unrecognised log level name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid log level: {0}")]
pub struct InvalidLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = InvalidLogLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// Logs every request it sees. [`RequestLogger::default`] logs at `debug`.
///
/// ```
/// use waypoint_middleware::stages::{LogLevel, RequestLogger};
///
/// let logger: RequestLogger = "info".parse::<LogLevel>().map(RequestLogger::new).unwrap();
/// assert_eq!(logger.level(), LogLevel::Info);
/// assert!("loud".parse::<LogLevel>().is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogger {
    level: LogLevel,
}

impl RequestLogger {
    /// Creates a logger at `level`.
    #[must_use]
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    /// The configured level.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl Middleware for RequestLogger {
    fn name(&self) -> &'static str {
        "request_logger"
    }

    fn handle<'a>(
        &'a self,
        request: &'a IncomingRequest,
        _init: &'a ResponseInit,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin(async move {
            let method = request.method();
            let url = request.uri();
            match self.level {
                LogLevel::Debug => tracing::debug!("{method} {url}"),
                LogLevel::Info => tracing::info!("{method} {url}"),
                LogLevel::Warn => tracing::warn!("{method} {url}"),
                LogLevel::Error => tracing::error!("{method} {url}"),
            }
            Ok(None)
        })
    }
}
