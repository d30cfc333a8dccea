//! Structured logging for Waypoint.
//!
//! Every Waypoint crate logs through `tracing`. This crate installs the
//! subscriber that turns those events into output:
//!
//! - **Filter**: `RUST_LOG` when set, otherwise the configured directive
//! - **Format**: JSON for production, pretty or compact for development
//!
//! # Events emitted during dispatch
//!
//! | Level | Source | Message |
//! |-------|--------|---------|
//! | `debug` | dispatcher | route matched, handler finished |
//! | `debug` | middleware | middleware rejected request |
//! | `warn` | dispatcher | registry entry failed to hydrate |
//! | `error` | dispatcher | unhandled error turned into a 500 |
//! | configurable | `RequestLogger` | `"{method} {url}"` |
//!
//! # Example
//!
//! ```rust,ignore
//! use waypoint_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! ```

#![doc(html_root_url = "https://docs.rs/waypoint-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
