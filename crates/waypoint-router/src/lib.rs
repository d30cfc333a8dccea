//! Path matching and route tables for Waypoint.
//!
//! This crate turns registered route paths into a [`RouteTable`] and answers
//! one question per request: which registered pattern best matches this
//! path, and what was registered under it for each HTTP method.
//!
//! # Matching Rules
//!
//! Every pattern is scored against the request path:
//!
//! | Score | [`Specificity`] | When |
//! |-------|-----------------|------|
//! | 2 | `Exact` | the request path equals the pattern text |
//! | 1 | `Parametric` | the pattern matches through `:param` / catch-all segments |
//! | 0 | `None` | no match |
//!
//! The highest score wins. Ties go to the pattern registered first.
//!
//! # Example
//!
//! ```rust
//! use waypoint_router::{join_path, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! let path = join_path(["/api", "/users", ":id"]);
//! table.insert(&path, &Method::GET, "getUser").unwrap();
//!
//! let found = table.find("/api/users/42").unwrap();
//! assert_eq!(found.methods.route(&Method::GET), Some(&"getUser"));
//! assert_eq!(found.params.get("id"), Some("42"));
//! assert!(found.methods.route(&Method::PUT).is_none());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod join;
mod method_router;
mod params;
mod pattern;
mod table;

pub use join::join_path;
pub use method_router::{MethodRouter, SUPPORTED_METHODS};
pub use params::Params;
pub use pattern::{PathPattern, PatternError, Specificity};
pub use table::{InsertError, RouteMatch, RouteTable};
