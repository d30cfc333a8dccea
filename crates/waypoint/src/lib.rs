//! # Waypoint
//!
//! **Controller-style routing and request dispatch**
//!
//! Waypoint turns a tree of modules and controllers into a single route
//! table and runs every request through a fixed, sequential pipeline:
//!
//! - **Routing** – Literal patterns beat parametric ones; ties go to the route registered first
//! - **Middleware** – Global, then controller, then method; failures become error responses
//! - **Request registry** – Lazily computed request-scoped values, stored once per application
//! - **Hooks** – Schemas for every input, `before`/`after` callbacks and documentation metadata
//! - **Dependency injection** – Controllers are built from the application container per request
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint::prelude::*;
//! use std::sync::Arc;
//!
//! struct Users;
//!
//! impl Injectable for Users {
//!     fn inject(_: &Container) -> Result<Self, InjectionError> {
//!         Ok(Users)
//!     }
//! }
//!
//! let users = Controller::<Users>::new("/users")
//!     .display_name("Users")
//!     .route(
//!         RouteDef::post("/", |_users: Arc<Users>, args: Arguments| async move {
//!             let body = args.value(0).cloned().unwrap_or_default();
//!             Ok::<_, WaypointError>(Json(body))
//!         })
//!         .status(http::StatusCode::CREATED)
//!         .hook(Hook::new().body(Schema::object([("name", Schema::string().min_length(3).required())])))
//!         .args([ParamSource::Body].into_iter().collect()),
//!     );
//!
//! let app = App::new(Module::new("app").prefix("/api").controller(users), AppConfig::default()).unwrap();
//!
//! # tokio_test::block_on(async {
//! let request = http::Request::post("/api/users")
//!     .header("content-type", "application/json")
//!     .body(r#"{"name":"ab"}"#.into())
//!     .unwrap();
//! let response = app.dispatch(request).await;
//! assert_eq!(response.status(), http::StatusCode::BAD_REQUEST);
//! # });
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → Routing → Global MW → Controller MW → Method MW → Registry → Before
//!                                                                         ↓
//! Response ← Build ← After ← Handler ← Arguments ←────────────────────────┘
//! ```
//!
//! Raw routes ([`Module::raw_route`]) leave after global middleware.

#![doc(html_root_url = "https://docs.rs/waypoint/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod dispatcher;
mod error;
mod loader;
mod module;
mod response;

pub use app::{root_container, App, MethodHandler, MethodHandlers, RouteSchemas, RouteSummary};
pub use config::{AppConfig, AppConfigBuilder, DocsConfig};
pub use error::LoadError;
pub use module::{Controller, Module, Provider, RawHandler, RequestRegistryEntry, RouteDef};

// Re-export core types
pub use waypoint_core as core;

// Re-export router types
pub use waypoint_router as router;

// Re-export extraction types
pub use waypoint_extract as extract;

// Re-export middleware types
pub use waypoint_middleware as middleware;

// Re-export configuration types
pub use waypoint_config as config_file;

// Re-export telemetry types
pub use waypoint_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use waypoint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{App, AppConfig, Controller, DocsConfig, Module, RequestRegistryEntry, RouteDef};

    pub use waypoint_core::{
        Container, Hook, HookOutcome, HookScope, IncomingRequest, Injectable, InjectionError, IntoReply, Json,
        Reply, ResponseInit, Schema, WaypointError,
    };

    // Re-export argument declarations
    pub use waypoint_extract::{Arguments, ParamList, ParamSource};

    // Re-export middleware
    pub use waypoint_middleware::stages::{Cors, LogLevel, RequestLogger, Throttle};
    pub use waypoint_middleware::{FnMiddleware, Middleware};

    // Re-export configuration and logging setup
    pub use waypoint_config::{ConfigLoader, WaypointConfig};
    pub use waypoint_telemetry::{init_logging, LogConfig};
}
