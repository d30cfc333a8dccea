//! The request carrier threaded through the pipeline.
//!
//! [`IncomingRequest`] splits an `http::Request` into its head and a
//! single-shot body slot. Cloning the carrier is cheap and every clone
//! shares the same body slot, so once one argument loader has read the body
//! no other loader, hook or handler can read it again.

use crate::error::WaypointError;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, CONTENT_TYPE};
use http::request::Parts;
use http::{Method, Uri};
use http_body_util::{BodyExt, Full};
use parking_lot::Mutex;
use std::sync::Arc;

/// The HTTP request type accepted by the dispatch entry points.
///
/// This is a standard `http::Request` with a `Full<Bytes>` body.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by the pipeline.
///
/// This is a standard `http::Response` with a `Full<Bytes>` body.
pub type Response = http::Response<Full<Bytes>>;

#[derive(Debug)]
struct Inner {
    head: Parts,
    body: Mutex<Option<Bytes>>,
}

/// A request head plus a body that can be taken once.
///
/// # Example
///
/// ```
/// use waypoint_core::IncomingRequest;
/// use bytes::Bytes;
///
/// let request = IncomingRequest::from_parts(
///     http::Request::post("/users?page=2").body(()).unwrap().into_parts().0,
///     Bytes::from_static(b"{}"),
/// );
///
/// assert_eq!(request.path(), "/users");
/// assert_eq!(request.query(), Some("page=2"));
/// assert_eq!(request.take_body().unwrap(), Bytes::from_static(b"{}"));
/// assert!(request.take_body().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    inner: Arc<Inner>,
}

impl IncomingRequest {
    /// Builds a carrier from a request head and a fully buffered body.
    #[must_use]
    pub fn from_parts(head: Parts, body: Bytes) -> Self {
        Self {
            inner: Arc::new(Inner {
                head,
                body: Mutex::new(Some(body)),
            }),
        }
    }

    /// Converts an `http::Request`, buffering its body.
    pub async fn from_http(request: Request) -> Self {
        let (head, body) = request.into_parts();
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };
        Self::from_parts(head, bytes)
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.head.method
    }

    /// The full request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.head.uri
    }

    /// The URI path, `/` when empty.
    #[must_use]
    pub fn path(&self) -> &str {
        let path = self.inner.head.uri.path();
        if path.is_empty() {
            "/"
        } else {
            path
        }
    }

    /// The raw query string, without the `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.inner.head.uri.query()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.head.headers
    }

    /// A header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header<K>(&self, name: K) -> Option<&str>
    where
        K: TryInto<HeaderName>,
    {
        let name = name.try_into().ok()?;
        self.inner.head.headers.get(name)?.to_str().ok()
    }

    /// The `content-type` header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.inner
            .head
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// The request head.
    #[must_use]
    pub fn head(&self) -> &Parts {
        &self.inner.head
    }

    /// Takes the body. Every later call fails.
    pub fn take_body(&self) -> Result<Bytes, WaypointError> {
        self.inner
            .body
            .lock()
            .take()
            .ok_or_else(|| WaypointError::unknown("Body is unusable: body has already been read"))
    }

    /// Returns `true` once the body has been taken.
    #[must_use]
    pub fn body_used(&self) -> bool {
        self.inner.body.lock().is_none()
    }
}
