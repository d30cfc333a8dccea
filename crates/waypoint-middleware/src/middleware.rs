//! Core middleware trait and the composer.
//!
//! A middleware sees the request and the response-init accumulated so far.
//! It either contributes a fragment (merged onto the accumulator), contributes
//! nothing, or fails. A failure aborts the whole dispatch and becomes the
//! error response, which is how rate limiting and auth checks reject a
//! request.
//!
//! # Example
//!
//! ```
//! use waypoint_middleware::{run_middleware, FnMiddleware, SharedMiddleware};
//! use waypoint_core::{IncomingRequest, ResponseInit};
//! use http::HeaderValue;
//! use std::sync::Arc;
//!
//! let powered_by: SharedMiddleware = Arc::new(FnMiddleware::new("powered-by", |_req, _init| async {
//!     Ok(Some(ResponseInit::new().header("x-powered-by", HeaderValue::from_static("waypoint"))))
//! }));
//!
//! # tokio_test::block_on(async {
//! let head = http::Request::get("/").body(()).unwrap().into_parts().0;
//! let request = IncomingRequest::from_parts(head, bytes::Bytes::new());
//! let init = run_middleware(&request, &[powered_by], ResponseInit::new()).await.unwrap();
//! assert_eq!(init.headers()["x-powered-by"], "waypoint");
//! # });
//! ```

use std::future::Future;
use std::sync::Arc;
use waypoint_core::{BoxFuture, IncomingRequest, ResponseInit, WaypointError};

/// The result of one middleware step.
pub type MiddlewareResult = Result<Option<ResponseInit>, WaypointError>;

/// A middleware shared between routes.
pub type SharedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// Implementations must be safe to call from many in-flight requests at
/// once. Any state they keep (counters, caches) needs its own
/// synchronization.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Inspects the request and optionally contributes a fragment.
    fn handle<'a>(
        &'a self,
        request: &'a IncomingRequest,
        init: &'a ResponseInit,
    ) -> BoxFuture<'a, MiddlewareResult>;
}

/// A middleware built from a closure.
///
/// The closure receives clones of the request and accumulator, so the
/// returned future owns everything it touches.
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F> {
    /// Creates a new function-based middleware.
    pub fn new<Fut>(name: &'static str, func: F) -> Self
    where
        F: Fn(IncomingRequest, ResponseInit) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MiddlewareResult> + Send + 'static,
    {
        Self { name, func }
    }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(IncomingRequest, ResponseInit) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MiddlewareResult> + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        request: &'a IncomingRequest,
        init: &'a ResponseInit,
    ) -> BoxFuture<'a, MiddlewareResult> {
        Box::pin((self.func)(request.clone(), init.clone()))
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Runs `middleware` in order, folding fragments onto `init`.
///
/// Stops at the first failure.
pub async fn run_middleware(
    request: &IncomingRequest,
    middleware: &[SharedMiddleware],
    init: ResponseInit,
) -> Result<ResponseInit, WaypointError> {
    let mut acc = init;
    apply_middleware(request, middleware, &mut acc).await?;
    Ok(acc)
}

/// Like [`run_middleware`], but folds into `acc` in place.
///
/// On failure `acc` still holds every fragment merged before the failing
/// middleware, so error responses can carry them.
pub async fn apply_middleware(
    request: &IncomingRequest,
    middleware: &[SharedMiddleware],
    acc: &mut ResponseInit,
) -> Result<(), WaypointError> {
    for stage in middleware {
        tracing::trace!(middleware = stage.name(), "running middleware");
        let outcome = stage.handle(request, acc).await;
        match outcome {
            Ok(Some(fragment)) => *acc = acc.merge(&fragment),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(middleware = stage.name(), error = %err, "middleware rejected request");
                return Err(err);
            }
        }
    }
    Ok(())
}
