//! Module, controller and route descriptors.
//!
//! Applications are described as a tree of [`Module`]s. A module carries a
//! path prefix, dependency providers, request-scoped registry entries, child
//! modules and [`Controller`]s. A controller carries its own prefix,
//! middleware and a list of [`RouteDef`]s.
//!
//! Descriptors are plain data. [`App::new`](crate::App::new) flattens them
//! into a route table once, at start-up.
//!
//! # Example
//!
//! ```rust
//! use waypoint::prelude::*;
//! use std::sync::Arc;
//!
//! struct Greeter;
//!
//! impl Injectable for Greeter {
//!     fn inject(_: &Container) -> Result<Self, InjectionError> {
//!         Ok(Greeter)
//!     }
//! }
//!
//! let users = Controller::<Greeter>::new("/hello")
//!     .display_name("Greeter")
//!     .route(
//!         RouteDef::get("/:name", |_c: Arc<Greeter>, args: Arguments| async move {
//!             let name: String = args.json(0)?;
//!             Ok::<_, WaypointError>(format!("hello {name}"))
//!         })
//!         .args([ParamSource::param("name")].into_iter().collect()),
//!     );
//!
//! let module = Module::new("app").prefix("/api").controller(users);
//! assert_eq!(module.name(), "app");
//! ```

use http::{Method, StatusCode};
use std::any::{type_name, Any};
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use waypoint_core::{
    BoxFuture, Container, Hook, IncomingRequest, Injectable, InjectionError, IntoReply, Reply,
    WaypointError,
};
use waypoint_extract::{Arguments, ParamList};
use waypoint_middleware::{Middleware, SharedMiddleware};

/// A resolved controller instance, type-erased.
pub(crate) type Instance = Arc<dyn Any + Send + Sync>;

pub(crate) type ReplyFuture = BoxFuture<'static, Result<Reply, WaypointError>>;

pub(crate) type ConstructFn = Arc<dyn Fn(&Container) -> Result<Instance, InjectionError> + Send + Sync>;

pub(crate) type InvokeFn = Arc<dyn Fn(Instance, Arguments) -> ReplyFuture + Send + Sync>;

/// A route handler that receives the raw request and bypasses controllers.
pub type RawHandler = Arc<dyn Fn(IncomingRequest) -> ReplyFuture + Send + Sync>;

type RegistryLoader =
    Arc<dyn Fn(IncomingRequest) -> BoxFuture<'static, Result<Instance, WaypointError>> + Send + Sync>;

type RegisterFn = Arc<dyn Fn(&Container) -> bool + Send + Sync>;

/// One controller method bound to an HTTP method and path.
///
/// The handler receives the controller instance and the resolved
/// [`Arguments`], and returns anything that implements [`IntoReply`].
pub struct RouteDef<C> {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) hook: Hook,
    pub(crate) status: Option<StatusCode>,
    pub(crate) params: ParamList,
    pub(crate) middleware: Vec<SharedMiddleware>,
    pub(crate) invoke: InvokeFn,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Injectable> RouteDef<C> {
    /// Creates a route for `method` on `path`.
    pub fn new<F, Fut, R>(method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        let handler = Arc::new(handler);
        let invoke: InvokeFn = Arc::new(move |instance: Instance, args: Arguments| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let controller = instance.downcast::<C>().map_err(|_| {
                    WaypointError::unknown(format!("controller is not a {}", type_name::<C>()))
                })?;
                handler(controller, args).await.into_reply()
            })
        });

        Self {
            method,
            path: path.into(),
            hook: Hook::default(),
            status: None,
            params: ParamList::new(),
            middleware: Vec::new(),
            invoke,
            _controller: PhantomData,
        }
    }

    /// A `GET` route.
    pub fn get<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::GET, path, handler)
    }

    /// A `POST` route.
    pub fn post<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::POST, path, handler)
    }

    /// A `PUT` route.
    pub fn put<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::PUT, path, handler)
    }

    /// A `PATCH` route.
    pub fn patch<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::PATCH, path, handler)
    }

    /// A `DELETE` route.
    pub fn delete<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::DELETE, path, handler)
    }

    /// A `HEAD` route.
    pub fn head<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::HEAD, path, handler)
    }

    /// An `OPTIONS` route.
    pub fn options<F, Fut, R>(path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::new(Method::OPTIONS, path, handler)
    }
}

impl<C> RouteDef<C> {
    /// Attaches the hook configuration.
    #[must_use]
    pub fn hook(mut self, hook: Hook) -> Self {
        self.hook = hook;
        self
    }

    /// Overrides the success status. Takes precedence over the hook's status.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Declares where each handler argument comes from.
    #[must_use]
    pub fn args(mut self, params: ParamList) -> Self {
        self.params = params;
        self
    }

    /// Appends method-scoped middleware. Runs after controller middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.middleware_shared(Arc::new(middleware))
    }

    /// Appends already shared method-scoped middleware.
    #[must_use]
    pub fn middleware_shared(mut self, middleware: SharedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }
}

impl<C> fmt::Debug for RouteDef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("status", &self.status)
            .field("params", &self.params.len())
            .field("middleware", &self.middleware.len())
            .finish_non_exhaustive()
    }
}

/// A controller route with its controller type erased.
pub(crate) struct ControllerRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) hook: Hook,
    pub(crate) status: Option<StatusCode>,
    pub(crate) params: ParamList,
    pub(crate) middleware: Vec<SharedMiddleware>,
    pub(crate) invoke: InvokeFn,
}

/// A controller: a prefix, shared middleware and a set of routes.
///
/// Instances are built through [`Injectable::inject`] for every request
/// that reaches one of its routes.
pub struct Controller<C> {
    prefix: String,
    display_name: Option<String>,
    description: Option<String>,
    middleware: Vec<SharedMiddleware>,
    routes: Vec<ControllerRoute>,
    _controller: PhantomData<fn() -> C>,
}

impl<C: Injectable> Controller<C> {
    /// Creates a controller mounted at `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            display_name: None,
            description: None,
            middleware: Vec::new(),
            routes: Vec::new(),
            _controller: PhantomData,
        }
    }

    /// Name used as the documentation tag for every route.
    #[must_use]
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Description of the controller's documentation tag.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends controller-scoped middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.middleware_shared(Arc::new(middleware))
    }

    /// Appends already shared controller-scoped middleware.
    #[must_use]
    pub fn middleware_shared(mut self, middleware: SharedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Adds a route.
    #[must_use]
    pub fn route(mut self, route: RouteDef<C>) -> Self {
        self.routes.push(ControllerRoute {
            method: route.method,
            path: route.path,
            hook: route.hook,
            status: route.status,
            params: route.params,
            middleware: route.middleware,
            invoke: route.invoke,
        });
        self
    }

    fn into_def(self) -> ControllerDef {
        let construct: ConstructFn =
            Arc::new(|container: &Container| C::inject(container).map(|c| Arc::new(c) as Instance));
        ControllerDef {
            name: type_name::<C>(),
            prefix: self.prefix,
            display_name: self.display_name,
            description: self.description,
            middleware: self.middleware,
            routes: self.routes,
            construct,
        }
    }
}

/// A controller with its type erased, as stored in a [`Module`].
pub(crate) struct ControllerDef {
    pub(crate) name: &'static str,
    pub(crate) prefix: String,
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) middleware: Vec<SharedMiddleware>,
    pub(crate) routes: Vec<ControllerRoute>,
    pub(crate) construct: ConstructFn,
}

/// A route served by a plain function.
pub(crate) struct RawRoute {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: RawHandler,
}

/// A dependency registered into the application container at load time.
#[derive(Clone)]
pub struct Provider {
    type_name: &'static str,
    register: RegisterFn,
}

impl Provider {
    /// Provides a ready instance.
    pub fn value<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            type_name: type_name::<T>(),
            register: Arc::new(move |container: &Container| {
                if container.contains::<T>() {
                    return false;
                }
                container.register(Arc::clone(&value));
                true
            }),
        }
    }

    /// Provides a factory, run on first resolution.
    pub fn factory<T, F>(factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        let factory = Arc::new(factory);
        Self {
            type_name: type_name::<T>(),
            register: Arc::new(move |container: &Container| {
                if container.contains::<T>() {
                    return false;
                }
                let factory = Arc::clone(&factory);
                container.register_factory(move |c: &Container| factory(c));
                true
            }),
        }
    }

    /// The provided type's name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Registers into `container` unless the type is already present.
    ///
    /// Returns `true` if this call registered it.
    pub(crate) fn register(&self, container: &Container) -> bool {
        (self.register)(container)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.type_name).finish()
    }
}

/// A request-scoped value computed lazily from the first request that needs it.
///
/// Every route below the declaring module inherits the entry. Before such a
/// route runs, the value is computed and stored under `token` in the
/// application container if it is not there yet. Controllers read it back
/// with [`Container::resolve_named`].
#[derive(Clone)]
pub struct RequestRegistryEntry {
    token: String,
    loader: RegistryLoader,
}

impl RequestRegistryEntry {
    /// Creates an entry whose loader produces a `T`.
    pub fn new<T, F, Fut>(token: impl Into<String>, loader: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, WaypointError>> + Send + 'static,
    {
        let loader = Arc::new(loader);
        Self {
            token: token.into(),
            loader: Arc::new(move |request: IncomingRequest| {
                let loader = Arc::clone(&loader);
                Box::pin(async move { loader(request).await.map(|value| Arc::new(value) as Instance) })
            }),
        }
    }

    /// The token the value is stored under.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    pub(crate) async fn load(&self, request: IncomingRequest) -> Result<Instance, WaypointError> {
        (self.loader)(request).await
    }
}

impl fmt::Debug for RequestRegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestRegistryEntry")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// A node of the application tree.
#[derive(Default)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) prefix: String,
    pub(crate) imports: Vec<Module>,
    pub(crate) controllers: Vec<ControllerDef>,
    pub(crate) raw_routes: Vec<RawRoute>,
    pub(crate) providers: Vec<Provider>,
    pub(crate) request_registry: Vec<RequestRegistryEntry>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the path prefix applied to everything below this module.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Adds a child module.
    #[must_use]
    pub fn import(mut self, module: Module) -> Self {
        self.imports.push(module);
        self
    }

    /// Adds a controller.
    #[must_use]
    pub fn controller<C: Injectable>(mut self, controller: Controller<C>) -> Self {
        self.controllers.push(controller.into_def());
        self
    }

    /// Adds a route served by a plain function of the request.
    ///
    /// Raw routes skip controller middleware, hooks, argument resolution and
    /// dependency injection. Global middleware still applies.
    #[must_use]
    pub fn raw_route<F, Fut, R>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(IncomingRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoReply + 'static,
    {
        let handler = Arc::new(handler);
        let handler: RawHandler = Arc::new(move |request: IncomingRequest| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(request).await.into_reply() })
        });
        self.raw_routes.push(RawRoute {
            method,
            path: path.into(),
            handler,
        });
        self
    }

    /// Provides a ready instance to the application container.
    #[must_use]
    pub fn provide<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.providers.push(Provider::value(value));
        self
    }

    /// Provides a factory to the application container.
    #[must_use]
    pub fn provide_factory<T, F>(mut self, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.providers.push(Provider::factory(factory));
        self
    }

    /// Declares a request-scoped registry entry.
    #[must_use]
    pub fn request_registry(mut self, entry: RequestRegistryEntry) -> Self {
        self.request_registry.push(entry);
        self
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("imports", &self.imports)
            .field("controllers", &self.controllers.iter().map(|c| c.name).collect::<Vec<_>>())
            .field("raw_routes", &self.raw_routes.len())
            .field("providers", &self.providers)
            .field("request_registry", &self.request_registry)
            .finish()
    }
}
