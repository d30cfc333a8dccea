//! # Waypoint Extract
//!
//! Argument resolution for the Waypoint dispatch pipeline.
//!
//! A handler declares, for each argument position, a [`ParamSource`]. At
//! dispatch time [`resolve_args`] runs the matching loader for every position
//! and validates the loaded value against the route's [`Hook`] schemas.
//!
//! | Source | Value | Schema |
//! |--------|-------|--------|
//! | `Body` | JSON, url-encoded or multipart body | `body` or `form_data` |
//! | `Query` | flattened query string | `query` |
//! | `Param(name)` | one path parameter | `path` (whole mapping) |
//! | `Params` | every path parameter | `path` |
//! | `Headers` | header mapping | `headers` |
//! | `Cookies` | cookie mapping | `cookies` |
//! | `Request` | the request itself | none |
//! | `Custom` | whatever the loader returns | up to the loader |
//!
//! [`Hook`]: waypoint_core::Hook

#![doc(html_root_url = "https://docs.rs/waypoint-extract/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cookie;
mod error;
mod form;
pub mod loaders;
mod purify;
mod resolve;
mod source;

pub use cookie::parse_cookies;
pub use error::ParamListError;
pub use form::{file_value, parse_multipart, parse_urlencoded, DEFAULT_MAX_FIELDS};
pub use purify::purify;
pub use resolve::{resolve_args, Argument, Arguments};
pub use source::{boxed, CustomLoader, ParamList, ParamSource};
