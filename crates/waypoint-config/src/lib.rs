//! Typed configuration for Waypoint applications.
//!
//! - TOML and JSON configuration files
//! - `.env` files via `dotenvy`
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults, then file, then env)
//!
//! # Example
//!
//! ```no_run
//! use waypoint_config::ConfigLoader;
//!
//! # fn main() -> Result<(), waypoint_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_dotenv()?
//!     .with_optional_file("waypoint.toml")?
//!     .with_env_prefix("WAYPOINT")
//!     .load()?;
//!
//! println!("throttle: {} per {} ms", config.throttle.limit, config.throttle.window_ms);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [throttle]
//! enabled = true
//! limit = 100
//! window_ms = 60000
//!
//! [cors]
//! enabled = true
//! origins = ["https://app.example.com"]
//! credentials = true
//!
//! [response.headers]
//! x-powered-by = "waypoint"
//!
//! [docs]
//! path = "/docs"
//! title = "Users API"
//! version = "1.0.0"
//! ```
//!
//! # Environment Variable Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WAYPOINT__LOGGING__LEVEL` | `logging.level` |
//! | `WAYPOINT__THROTTLE__LIMIT` | `throttle.limit` |
//! | `WAYPOINT__CORS__ORIGINS` | `cors.origins` (comma separated) |
//! | `WAYPOINT__RESPONSE__HEADERS__X_POWERED_BY` | `response.headers["x-powered-by"]` |
//! | `WAYPOINT__DOCS__TITLE` | `docs.title` |

#![doc(html_root_url = "https://docs.rs/waypoint-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{WaypointConfig, WaypointConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CorsSection, DocsSection, LoggingSection, ResponseSection, ThrottleSection};
pub use waypoint_telemetry::LogFormat;
