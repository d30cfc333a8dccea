//! The application and its dispatch entry points.

use crate::config::{AppConfig, DocsConfig};
use crate::dispatcher::RequestDispatcher;
use crate::error::LoadError;
use crate::loader::ModuleLoader;
use crate::module::Module;
use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use waypoint_core::{Container, HookInfo, IncomingRequest, Request, Response, ResponseSchemas, Schema};

static ROOT: OnceLock<Arc<Container>> = OnceLock::new();

/// The process-wide root container every application scope descends from.
pub fn root_container() -> &'static Arc<Container> {
    ROOT.get_or_init(|| Arc::new(Container::new()))
}

/// A loaded application.
///
/// Cloning is cheap: clones share the route table and the container.
///
/// # Example
///
/// ```rust
/// use waypoint::prelude::*;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let module = Module::new("app").raw_route(http::Method::GET, "/ping", |_req: IncomingRequest| async {
///     serde_json::json!({ "pong": true })
/// });
/// let app = App::new(module, AppConfig::default()).unwrap();
///
/// let request = http::Request::get("/ping").body(Default::default()).unwrap();
/// let response = app.dispatch(request).await;
/// assert_eq!(response.status(), http::StatusCode::OK);
/// # });
/// ```
#[derive(Clone)]
pub struct App {
    dispatcher: Arc<RequestDispatcher>,
}

impl App {
    /// Loads `module` into a fresh child of the [`root_container`].
    pub fn new(module: Module, config: AppConfig) -> Result<Self, LoadError> {
        Self::with_container(module, config, Arc::new(Container::child(root_container())))
    }

    /// Loads `module` into the given container.
    pub fn with_container(module: Module, config: AppConfig, container: Arc<Container>) -> Result<Self, LoadError> {
        let name = module.name().to_string();
        let routes = ModuleLoader::new(&container).load(module)?;
        tracing::info!(module = %name, patterns = routes.len(), "route table built");

        Ok(Self {
            dispatcher: Arc::new(RequestDispatcher::new(routes, container, config)),
        })
    }

    /// Dispatches an `http::Request`. Never fails: errors become responses.
    pub async fn dispatch(&self, request: Request) -> Response {
        self.dispatch_incoming(IncomingRequest::from_http(request).await).await
    }

    /// Dispatches an already buffered request.
    pub async fn dispatch_incoming(&self, request: IncomingRequest) -> Response {
        self.dispatcher.dispatch(request).await
    }

    /// One entry point per HTTP method.
    #[must_use]
    pub fn handlers(&self) -> MethodHandlers {
        let handler = |method: Method| MethodHandler {
            dispatcher: Arc::clone(&self.dispatcher),
            method,
        };
        MethodHandlers {
            get: handler(Method::GET),
            post: handler(Method::POST),
            put: handler(Method::PUT),
            patch: handler(Method::PATCH),
            delete: handler(Method::DELETE),
            head: handler(Method::HEAD),
            options: handler(Method::OPTIONS),
        }
    }

    /// The application container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        self.dispatcher.container()
    }

    /// The documentation endpoint settings, if configured.
    #[must_use]
    pub fn docs(&self) -> Option<&DocsConfig> {
        self.dispatcher.config().docs.as_ref()
    }

    /// Metadata for every registered route, in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteSummary> {
        let mut summaries = Vec::new();
        for (pattern, methods) in self.dispatcher.routes().iter() {
            for (method, entry) in methods.iter() {
                let hook = &entry.hook;
                let mut tags: Vec<String> = entry.controller.display_name.iter().cloned().collect();
                tags.extend(hook.hook_info().tags.iter().cloned());

                summaries.push(RouteSummary {
                    method: method.to_string(),
                    path: pattern.as_str().to_string(),
                    controller: entry.controller_name().map(str::to_string),
                    description: entry.controller.description.clone(),
                    tags,
                    status: entry.status.or_else(|| hook.status_code()).map_or(200, |s| s.as_u16()),
                    info: hook.hook_info().clone(),
                    schemas: RouteSchemas {
                        path: hook.path_schema().cloned(),
                        query: hook.query_schema().cloned(),
                        headers: hook.headers_schema().cloned(),
                        cookies: hook.cookies_schema().cloned(),
                        body: hook.body_schema().cloned(),
                        form_data: hook.form_data_schema().cloned(),
                        response: hook.responses().cloned(),
                    },
                    security: hook.security_requirements().clone(),
                });
            }
        }
        summaries
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("patterns", &self.dispatcher.routes().len())
            .field("config", self.dispatcher.config())
            .finish_non_exhaustive()
    }
}

/// A dispatch entry point bound to one HTTP method.
///
/// Mount it wherever the host framework expects a handler for that method.
#[derive(Clone)]
pub struct MethodHandler {
    dispatcher: Arc<RequestDispatcher>,
    method: Method,
}

impl MethodHandler {
    /// The method this handler is mounted for.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Dispatches `request`. Never fails: errors become responses.
    pub async fn call(&self, request: Request) -> Response {
        if request.method() != self.method {
            tracing::debug!(mounted = %self.method, received = %request.method(), "method handler received another method");
        }
        self.dispatcher.dispatch(IncomingRequest::from_http(request).await).await
    }
}

impl std::fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MethodHandler").field(&self.method).finish()
    }
}

/// The per-method entry points of an [`App`].
#[derive(Debug, Clone)]
pub struct MethodHandlers {
    /// `GET`
    pub get: MethodHandler,
    /// `POST`
    pub post: MethodHandler,
    /// `PUT`
    pub put: MethodHandler,
    /// `PATCH`
    pub patch: MethodHandler,
    /// `DELETE`
    pub delete: MethodHandler,
    /// `HEAD`
    pub head: MethodHandler,
    /// `OPTIONS`
    pub options: MethodHandler,
}

/// Declared input and output schemas of a route.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteSchemas {
    /// Path parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Schema>,
    /// Query string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Schema>,
    /// Headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Schema>,
    /// Cookies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Schema>,
    /// JSON body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Schema>,
    /// Form body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data: Option<Schema>,
    /// Documented responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseSchemas>,
}

/// Everything a documentation generator needs to know about one route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    /// HTTP method.
    pub method: String,
    /// Route pattern, e.g. `/users/:id`.
    pub path: String,
    /// Controller type name. `None` for raw routes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Controller description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Controller display name followed by the hook's tags.
    pub tags: Vec<String>,
    /// Success status.
    pub status: u16,
    /// Hook documentation metadata.
    pub info: HookInfo,
    /// Declared schemas.
    pub schemas: RouteSchemas,
    /// Security scheme to scopes.
    pub security: IndexMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Controller, RouteDef};
    use http::StatusCode;
    use serde_json::json;
    use waypoint_core::{Hook, Injectable, InjectionError};
    use waypoint_extract::Arguments;

    struct Docs;

    impl Injectable for Docs {
        fn inject(_: &Container) -> Result<Self, InjectionError> {
            Ok(Docs)
        }
    }

    fn module() -> Module {
        Module::new("root").prefix("/api").controller(
            Controller::<Docs>::new("/docs")
                .display_name("Docs")
                .description("Documentation")
                .route(
                    RouteDef::post("/", |_d: Arc<Docs>, _a: Arguments| async {})
                        .status(StatusCode::CREATED)
                        .hook(
                            Hook::new()
                                .body(Schema::object([("title", Schema::string().required())]))
                                .tag("writes")
                                .security("bearer", ["docs:write"]),
                        ),
                )
                .route(RouteDef::get("/", |_d: Arc<Docs>, _a: Arguments| async {})),
        )
    }

    #[test]
    fn test_route_summaries() {
        let app = App::with_container(module(), AppConfig::default(), Arc::new(Container::new())).unwrap();
        let routes = app.routes();
        assert_eq!(routes.len(), 2);

        let post = routes.iter().find(|r| r.method == "POST").unwrap();
        assert_eq!(post.path, "/api/docs");
        assert_eq!(post.status, 201);
        assert_eq!(post.tags, ["Docs", "writes"]);
        assert_eq!(post.description.as_deref(), Some("Documentation"));
        assert!(post.schemas.body.is_some());
        assert_eq!(post.security["bearer"], ["docs:write"]);

        let get = routes.iter().find(|r| r.method == "GET").unwrap();
        assert_eq!(get.status, 200);
        let rendered = serde_json::to_value(get).unwrap();
        assert_eq!(rendered["tags"], json!(["Docs"]));
        assert!(rendered["schemas"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_apps_get_separate_child_scopes() {
        let first = App::new(Module::new("a"), AppConfig::default()).unwrap();
        let second = App::new(Module::new("b"), AppConfig::default()).unwrap();

        first.container().register_named("token", Arc::new(1u8));
        assert!(first.container().contains_named("token"));
        assert!(!second.container().contains_named("token"));
    }

    #[tokio::test]
    async fn test_method_handlers_dispatch() {
        let app = App::with_container(module(), AppConfig::default(), Arc::new(Container::new())).unwrap();
        let handlers = app.handlers();
        assert_eq!(handlers.delete.method(), Method::DELETE);

        let request = http::Request::get("/api/docs").body(Default::default()).unwrap();
        let response = handlers.get.call(request).await;
        assert_eq!(response.status(), StatusCode::OK);

        let request = http::Request::delete("/api/docs").body(Default::default()).unwrap();
        let response = handlers.delete.call(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_docs_config_exposed() {
        let config = AppConfig::builder()
            .docs(DocsConfig {
                path: "/docs".into(),
                title: "API".into(),
                version: "1.0.0".into(),
            })
            .build();
        let app = App::with_container(Module::new("root"), config, Arc::new(Container::new())).unwrap();
        assert_eq!(app.docs().unwrap().title, "API");
    }
}
