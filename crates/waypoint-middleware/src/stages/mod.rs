//! Built-in middleware stages.
//!
//! - [`throttle`] - Per-client request limits backed by an LRU cache
//! - [`cors`] - `Access-Control-Allow-*` headers for allowed origins
//! - [`logger`] - Logs the method and URL of every request

pub mod cors;
pub mod logger;
pub mod throttle;

pub use cors::{AllowedOrigins, Cors, CorsBuilder};
pub use logger::{InvalidLogLevel, LogLevel, RequestLogger};
pub use throttle::{Throttle, ThrottleBuilder, ThrottleKey};
