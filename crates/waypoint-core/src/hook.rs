//! Per-route hook configuration.
//!
//! A [`Hook`] is the declarative contract attached to a route: the schemas
//! used by the argument loaders, the documented responses, a default status,
//! documentation metadata and optional `before`/`after` callbacks.
//!
//! The request body is described by either `body` or `form_data`, never both.
//! Setting one clears the other.
//!
//! # Example
//!
//! ```
//! use waypoint_core::{Hook, HookOutcome, Schema};
//! use http::StatusCode;
//!
//! let hook = Hook::new()
//!     .status(StatusCode::CREATED)
//!     .body(Schema::object([("name", Schema::string().min_length(3).required())]))
//!     .response_for(StatusCode::CREATED, "Created user", Schema::any())
//!     .summary("create-user", "Create a user")
//!     .tag("users")
//!     .before(|_scope| async { Ok(HookOutcome::Continue) });
//!
//! assert_eq!(hook.status_code(), Some(StatusCode::CREATED));
//! assert!(hook.body_schema().is_some());
//! assert!(hook.has_before());
//! ```

use crate::error::WaypointError;
use crate::init::ResponseInit;
use crate::request::{IncomingRequest, Response};
use crate::schema::Schema;
use crate::BoxFuture;
use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What a lifecycle callback asks the dispatcher to do next.
#[derive(Debug)]
pub enum HookOutcome {
    /// Carry on with the accumulator unchanged.
    Continue,
    /// Merge this fragment into the accumulator and carry on.
    Merge(ResponseInit),
    /// Stop and return this response as is.
    Respond(Response),
}

impl From<ResponseInit> for HookOutcome {
    fn from(init: ResponseInit) -> Self {
        Self::Merge(init)
    }
}

impl From<Response> for HookOutcome {
    fn from(response: Response) -> Self {
        Self::Respond(response)
    }
}

/// Everything a lifecycle callback can see.
pub struct HookScope {
    instance: Arc<dyn Any + Send + Sync>,
    /// The request being dispatched.
    pub request: IncomingRequest,
    /// The accumulator so far.
    pub init: ResponseInit,
    /// The handler result. Always `None` for `before`.
    pub result: Option<Value>,
}

impl HookScope {
    /// Creates a scope bound to a controller instance.
    #[must_use]
    pub fn new(
        instance: Arc<dyn Any + Send + Sync>,
        request: IncomingRequest,
        init: ResponseInit,
        result: Option<Value>,
    ) -> Self {
        Self {
            instance,
            request,
            init,
            result,
        }
    }

    /// The controller instance the route was dispatched to, if it is a `C`.
    #[must_use]
    pub fn instance<C: Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        Arc::clone(&self.instance).downcast::<C>().ok()
    }
}

impl fmt::Debug for HookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookScope")
            .field("path", &self.request.path())
            .field("init", &self.init)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// A type-erased lifecycle callback.
pub type HookFn =
    Arc<dyn Fn(HookScope) -> BoxFuture<'static, Result<HookOutcome, WaypointError>> + Send + Sync>;

/// Documentation metadata for a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookInfo {
    /// Operation identifier.
    pub id: Option<String>,
    /// One-line summary.
    pub summary: Option<String>,
    /// Longer description.
    pub description: Option<String>,
    /// Grouping tags.
    pub tags: Vec<String>,
    /// Accepted request media types.
    pub consumes: Vec<String>,
    /// Produced response media types. The first entry becomes the content-type.
    pub produces: Vec<String>,
    /// Whether the operation is deprecated.
    pub deprecated: bool,
}

/// One documented response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSpec {
    /// Human readable description.
    pub description: Option<String>,
    /// Shape of the response body.
    pub schema: Schema,
}

/// Documented responses: one schema, or one per status code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseSchemas {
    /// A single schema for every status.
    Single(Schema),
    /// Schemas keyed by status code.
    ByStatus(BTreeMap<u16, ResponseSpec>),
}

/// Per-route declarative contract.
#[derive(Clone, Default)]
pub struct Hook {
    status: Option<StatusCode>,
    path: Option<Schema>,
    query: Option<Schema>,
    headers: Option<Schema>,
    cookies: Option<Schema>,
    body: Option<Schema>,
    form_data: Option<Schema>,
    response: Option<ResponseSchemas>,
    before: Option<HookFn>,
    after: Option<HookFn>,
    info: HookInfo,
    security: IndexMap<String, Vec<String>>,
}

fn erase<F, Fut, O>(callback: F) -> HookFn
where
    F: Fn(HookScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, WaypointError>> + Send + 'static,
    O: Into<HookOutcome>,
{
    Arc::new(move |scope| {
        let fut = callback(scope);
        Box::pin(async move { fut.await.map(Into::into) })
    })
}

impl Hook {
    /// An empty hook.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default success status.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Schema for the path parameter mapping.
    #[must_use]
    pub fn path(mut self, schema: Schema) -> Self {
        self.path = Some(schema);
        self
    }

    /// Schema for the flattened query mapping.
    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    /// Schema for the header mapping.
    #[must_use]
    pub fn headers(mut self, schema: Schema) -> Self {
        self.headers = Some(schema);
        self
    }

    /// Schema for the cookie mapping.
    #[must_use]
    pub fn cookies(mut self, schema: Schema) -> Self {
        self.cookies = Some(schema);
        self
    }

    /// Schema for a JSON body. Clears any form schema.
    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self.form_data = None;
        self
    }

    /// Schema for a form or multipart body. Clears any JSON body schema.
    #[must_use]
    pub fn form_data(mut self, schema: Schema) -> Self {
        self.form_data = Some(schema);
        self.body = None;
        self
    }

    /// Documents a single response schema.
    #[must_use]
    pub fn response(mut self, schema: Schema) -> Self {
        self.response = Some(ResponseSchemas::Single(schema));
        self
    }

    /// Documents the response for one status code.
    #[must_use]
    pub fn response_for(
        mut self,
        status: StatusCode,
        description: impl Into<String>,
        schema: Schema,
    ) -> Self {
        let spec = ResponseSpec {
            description: Some(description.into()),
            schema,
        };
        match &mut self.response {
            Some(ResponseSchemas::ByStatus(map)) => {
                map.insert(status.as_u16(), spec);
            }
            _ => {
                self.response = Some(ResponseSchemas::ByStatus(BTreeMap::from([(
                    status.as_u16(),
                    spec,
                )])));
            }
        }
        self
    }

    /// Runs before argument resolution.
    #[must_use]
    pub fn before<F, Fut, O>(mut self, callback: F) -> Self
    where
        F: Fn(HookScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, WaypointError>> + Send + 'static,
        O: Into<HookOutcome>,
    {
        self.before = Some(erase(callback));
        self
    }

    /// Runs after the handler, seeing its result.
    #[must_use]
    pub fn after<F, Fut, O>(mut self, callback: F) -> Self
    where
        F: Fn(HookScope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, WaypointError>> + Send + 'static,
        O: Into<HookOutcome>,
    {
        self.after = Some(erase(callback));
        self
    }

    /// Replaces the documentation metadata.
    #[must_use]
    pub fn info(mut self, info: HookInfo) -> Self {
        self.info = info;
        self
    }

    /// Sets the operation id and summary.
    #[must_use]
    pub fn summary(mut self, id: impl Into<String>, summary: impl Into<String>) -> Self {
        self.info.id = Some(id.into());
        self.info.summary = Some(summary.into());
        self
    }

    /// Adds a documentation tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.info.tags.push(tag.into());
        self
    }

    /// Adds a produced media type.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.info.produces.push(media_type.into());
        self
    }

    /// Adds an accepted media type.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.info.consumes.push(media_type.into());
        self
    }

    /// Marks the route deprecated.
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.info.deprecated = true;
        self
    }

    /// Requires a security scheme with the given scopes.
    #[must_use]
    pub fn security<I, S>(mut self, scheme: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security
            .insert(scheme.into(), scopes.into_iter().map(Into::into).collect());
        self
    }

    /// The default success status.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// The path parameter schema.
    #[must_use]
    pub fn path_schema(&self) -> Option<&Schema> {
        self.path.as_ref()
    }

    /// The query schema.
    #[must_use]
    pub fn query_schema(&self) -> Option<&Schema> {
        self.query.as_ref()
    }

    /// The header schema.
    #[must_use]
    pub fn headers_schema(&self) -> Option<&Schema> {
        self.headers.as_ref()
    }

    /// The cookie schema.
    #[must_use]
    pub fn cookies_schema(&self) -> Option<&Schema> {
        self.cookies.as_ref()
    }

    /// The JSON body schema.
    #[must_use]
    pub fn body_schema(&self) -> Option<&Schema> {
        self.body.as_ref()
    }

    /// The form body schema.
    #[must_use]
    pub fn form_data_schema(&self) -> Option<&Schema> {
        self.form_data.as_ref()
    }

    /// The documented responses.
    #[must_use]
    pub fn responses(&self) -> Option<&ResponseSchemas> {
        self.response.as_ref()
    }

    /// The documentation metadata.
    #[must_use]
    pub fn hook_info(&self) -> &HookInfo {
        &self.info
    }

    /// The security requirements.
    #[must_use]
    pub fn security_requirements(&self) -> &IndexMap<String, Vec<String>> {
        &self.security
    }

    /// The content-type for JSON-wrapped results.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.info
            .produces
            .first()
            .map_or("application/json", String::as_str)
    }

    /// Returns `true` if a `before` callback is set.
    #[must_use]
    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    /// Returns `true` if an `after` callback is set.
    #[must_use]
    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Runs the `before` callback, if any.
    pub async fn run_before(&self, scope: HookScope) -> Result<HookOutcome, WaypointError> {
        match &self.before {
            Some(callback) => callback(scope).await,
            None => Ok(HookOutcome::Continue),
        }
    }

    /// Runs the `after` callback, if any.
    pub async fn run_after(&self, scope: HookScope) -> Result<HookOutcome, WaypointError> {
        match &self.after {
            Some(callback) => callback(scope).await,
            None => Ok(HookOutcome::Continue),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("status", &self.status)
            .field("path", &self.path.is_some())
            .field("query", &self.query.is_some())
            .field("headers", &self.headers.is_some())
            .field("cookies", &self.cookies.is_some())
            .field("body", &self.body.is_some())
            .field("form_data", &self.form_data.is_some())
            .field("before", &self.has_before())
            .field("after", &self.has_after())
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::HeaderValue;

    fn scope() -> HookScope {
        let head = http::Request::get("/").body(()).unwrap().into_parts().0;
        HookScope::new(
            Arc::new(42_u32),
            IncomingRequest::from_parts(head, Bytes::new()),
            ResponseInit::new(),
            None,
        )
    }

    #[test]
    fn test_body_and_form_data_are_exclusive() {
        let hook = Hook::new().body(Schema::any()).form_data(Schema::any());
        assert!(hook.body_schema().is_none());
        assert!(hook.form_data_schema().is_some());

        let hook = hook.body(Schema::any());
        assert!(hook.body_schema().is_some());
        assert!(hook.form_data_schema().is_none());
    }

    #[test]
    fn test_content_type_defaults_to_json() {
        assert_eq!(Hook::new().content_type(), "application/json");
        let hook = Hook::new().produces("text/csv").produces("application/json");
        assert_eq!(hook.content_type(), "text/csv");
    }

    #[test]
    fn test_response_by_status_accumulates() {
        let hook = Hook::new()
            .response_for(StatusCode::OK, "ok", Schema::any())
            .response_for(StatusCode::NOT_FOUND, "missing", Schema::null());
        match hook.responses() {
            Some(ResponseSchemas::ByStatus(map)) => {
                assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![200, 404]);
            }
            other => panic!("unexpected responses: {other:?}"),
        }
    }

    #[test]
    fn test_security_requirements() {
        let hook = Hook::new().security("oauth", ["read", "write"]);
        assert_eq!(
            hook.security_requirements().get("oauth"),
            Some(&vec!["read".to_string(), "write".to_string()])
        );
    }

    #[tokio::test]
    async fn test_missing_callbacks_continue() {
        let hook = Hook::new();
        assert!(matches!(hook.run_before(scope()).await, Ok(HookOutcome::Continue)));
        assert!(matches!(hook.run_after(scope()).await, Ok(HookOutcome::Continue)));
    }

    #[tokio::test]
    async fn test_before_sees_instance_and_merges() {
        let hook = Hook::new().before(|scope: HookScope| async move {
            let value = scope.instance::<u32>().map_or(0, |v| *v);
            Ok(ResponseInit::new().header(
                "x-instance",
                HeaderValue::from_str(&value.to_string()).unwrap(),
            ))
        });

        match hook.run_before(scope()).await.unwrap() {
            HookOutcome::Merge(init) => assert_eq!(init.headers()["x-instance"], "42"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
