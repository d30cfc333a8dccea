//! # Waypoint Middleware
//!
//! Middleware composition for the Waypoint dispatch pipeline.
//!
//! Middleware runs in three layers, outermost first:
//!
//! ```text
//! global (AppConfig) → controller → method → handler
//! ```
//!
//! Each layer is a plain ordered list folded by [`run_middleware`]. Every
//! middleware may contribute a [`ResponseInit`] fragment, which is merged
//! onto the accumulator, or fail, which aborts the request with that error.
//!
//! ## Built-in stages
//!
//! | Stage | Purpose |
//! |-------|---------|
//! | [`Throttle`](stages::Throttle) | 429 once a client exceeds its per-window limit |
//! | [`Cors`](stages::Cors) | CORS headers for allowed origins |
//! | [`RequestLogger`](stages::RequestLogger) | logs `"{method} {url}"` |
//!
//! [`ResponseInit`]: waypoint_core::ResponseInit

#![doc(html_root_url = "https://docs.rs/waypoint-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod middleware;
pub mod stages;

pub use middleware::{
    apply_middleware, run_middleware, FnMiddleware, Middleware, MiddlewareResult, SharedMiddleware,
};
pub use waypoint_core::BoxFuture;
