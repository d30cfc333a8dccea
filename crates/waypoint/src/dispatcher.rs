//! The per-request state machine.
//!
//! ```text
//! routing -> global middleware -> route middleware -> registry hydration
//!         -> before hook -> argument resolution -> handler -> after hook
//!         -> response build
//! ```
//!
//! Raw routes leave after global middleware. Any failure jumps straight to
//! the error response, which carries the headers accumulated so far.

use crate::config::AppConfig;
use crate::loader::{RouteEntry, Routes, Target};
use crate::module::RequestRegistryEntry;
use crate::response::{build_response, error_response};
use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use std::sync::Arc;
use waypoint_core::{Container, HookOutcome, HookScope, IncomingRequest, Response, ResponseInit, WaypointError};
use waypoint_extract::resolve_args;
use waypoint_middleware::apply_middleware;
use waypoint_router::MethodRouter;

/// Dispatches requests against a built route table.
pub(crate) struct RequestDispatcher {
    routes: Routes,
    container: Arc<Container>,
    config: AppConfig,
}

impl RequestDispatcher {
    pub(crate) fn new(routes: Routes, container: Arc<Container>, config: AppConfig) -> Self {
        Self {
            routes,
            container,
            config,
        }
    }

    pub(crate) fn routes(&self) -> &Routes {
        &self.routes
    }

    pub(crate) fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the pipeline. Never fails: errors become responses.
    pub(crate) async fn dispatch(&self, request: IncomingRequest) -> Response {
        let mut init = self.config.response_init.clone();
        match self.run(&request, &mut init).await {
            Ok(response) => response,
            Err(err) => error_response(&err, init),
        }
    }

    async fn run(&self, request: &IncomingRequest, init: &mut ResponseInit) -> Result<Response, WaypointError> {
        let (entry, params) = {
            let path = request.path();
            let found = self.routes.find(path).ok_or_else(|| WaypointError::not_found(path))?;
            let Some(entry) = found.methods.route(request.method()) else {
                allow_header(&found.methods, init);
                return Err(WaypointError::method_not_allowed(request.method().as_str()));
            };
            (Arc::clone(entry), found.params)
        };

        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            route = %entry.path,
            "route matched"
        );

        apply_middleware(request, &self.config.middleware, init).await?;

        let (construct, invoke) = match &entry.target {
            Target::Raw(handler) => {
                let reply = handler(request.clone()).await?;
                let status = init.status_code().unwrap_or(StatusCode::OK);
                return Ok(build_response(reply, std::mem::take(init), status, "application/json"));
            }
            Target::Controller { construct, invoke, .. } => (construct, invoke),
        };

        apply_middleware(request, &entry.middleware, init).await?;

        self.hydrate(request, &entry.request_registry).await;

        let instance =
            construct(self.container.as_ref()).map_err(|e| WaypointError::from(anyhow::Error::new(e)))?;

        if entry.hook.has_before() {
            let scope = HookScope::new(Arc::clone(&instance), request.clone(), init.clone(), None);
            if let Some(response) = apply_outcome(entry.hook.run_before(scope).await?, init) {
                return Ok(response);
            }
        }

        let args = resolve_args(request, &params, &entry.hook, &entry.params).await?;
        let reply = invoke(Arc::clone(&instance), args).await?;

        if entry.hook.has_after() {
            let result = reply.as_json().cloned();
            let scope = HookScope::new(instance, request.clone(), init.clone(), result);
            if let Some(response) = apply_outcome(entry.hook.run_after(scope).await?, init) {
                return Ok(response);
            }
        }

        tracing::debug!(route = %entry.path, "handler finished");

        let status = success_status(&entry, init);
        Ok(build_response(reply, std::mem::take(init), status, entry.hook.content_type()))
    }

    /// Computes every inherited registry value the container does not hold yet.
    ///
    /// The check and the write are separate steps, so two concurrent first
    /// requests may both run a loader. The later write wins.
    async fn hydrate(&self, request: &IncomingRequest, entries: &[RequestRegistryEntry]) {
        for entry in entries {
            if self.container.contains_named(entry.token()) {
                continue;
            }
            match entry.load(request.clone()).await {
                Ok(value) => self.container.register_named_erased(entry.token(), value),
                Err(err) => {
                    tracing::warn!(token = entry.token(), error = %err, "registry entry failed to hydrate");
                }
            }
        }
    }
}

/// Lists the methods the matched path does answer to.
fn allow_header(methods: &MethodRouter<Arc<RouteEntry>>, init: &mut ResponseInit) {
    let allowed = methods
        .allowed_methods()
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allowed) {
        *init = std::mem::take(init).header(ALLOW, value);
    }
}

fn apply_outcome(outcome: HookOutcome, init: &mut ResponseInit) -> Option<Response> {
    match outcome {
        HookOutcome::Continue => None,
        HookOutcome::Merge(fragment) => {
            *init = init.merge(&fragment);
            None
        }
        HookOutcome::Respond(response) => Some(response),
    }
}

/// Route status, then hook status, then whatever the accumulator carries.
fn success_status(entry: &RouteEntry, init: &ResponseInit) -> StatusCode {
    entry
        .status
        .or_else(|| entry.hook.status_code())
        .or_else(|| init.status_code())
        .unwrap_or(StatusCode::OK)
}
