//! # Waypoint Core
//!
//! Core types shared by every stage of the Waypoint dispatch pipeline.
//!
//! - [`WaypointError`] - The error taxonomy and its HTTP mapping
//! - [`ResponseInit`] - The status and headers accumulator
//! - [`Schema`] - Declarative validation of JSON values
//! - [`Container`] - Dependency injection with parent scopes
//! - [`IncomingRequest`] - Request head plus a single-shot body
//! - [`Hook`] - Per-route schemas, callbacks and documentation metadata
//! - [`Reply`] - Handler results

#![doc(html_root_url = "https://docs.rs/waypoint-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod di;
mod error;
mod hook;
mod init;
mod reply;
mod request;
pub mod schema;

use std::future::Future;
use std::pin::Pin;

pub use di::{Container, Injectable, InjectionError};
pub use error::{WaypointError, WaypointResult};
pub use hook::{Hook, HookFn, HookInfo, HookOutcome, HookScope, ResponseSchemas, ResponseSpec};
pub use init::ResponseInit;
pub use reply::{IntoReply, Json, Reply};
pub use request::{IncomingRequest, Request, Response};
pub use schema::{IssueCode, PathSegment, Schema, ValidationError, ValidationIssue};

/// A boxed future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
