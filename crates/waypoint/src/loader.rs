//! Flattens a module tree into a route table.

use crate::error::LoadError;
use crate::module::{ConstructFn, ControllerDef, InvokeFn, Module, RawHandler, RawRoute, RequestRegistryEntry};
use http::{Method, StatusCode};
use std::sync::Arc;
use waypoint_core::{Container, Hook};
use waypoint_extract::ParamList;
use waypoint_middleware::SharedMiddleware;
use waypoint_router::{join_path, RouteTable};

/// What a route dispatches to.
pub(crate) enum Target {
    /// A controller method.
    Controller {
        name: &'static str,
        construct: ConstructFn,
        invoke: InvokeFn,
    },
    /// A plain function of the request.
    Raw(RawHandler),
}

/// Documentation details of the owning controller.
#[derive(Debug, Clone, Default)]
pub(crate) struct ControllerMeta {
    pub(crate) display_name: Option<String>,
    pub(crate) description: Option<String>,
}

/// One flattened route. Immutable once the table is built.
pub(crate) struct RouteEntry {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) target: Target,
    pub(crate) hook: Hook,
    pub(crate) status: Option<StatusCode>,
    pub(crate) params: ParamList,
    /// Controller middleware followed by method middleware.
    pub(crate) middleware: Vec<SharedMiddleware>,
    pub(crate) request_registry: Vec<RequestRegistryEntry>,
    pub(crate) controller: ControllerMeta,
}

impl RouteEntry {
    pub(crate) fn controller_name(&self) -> Option<&'static str> {
        match &self.target {
            Target::Controller { name, .. } => Some(*name),
            Target::Raw(_) => None,
        }
    }
}

pub(crate) type Routes = RouteTable<Arc<RouteEntry>>;

/// Walks modules depth first, threading the path prefix and the inherited
/// request registry down the tree.
///
/// A module's providers are registered before its imports are visited, and
/// a provider never replaces a type that is already registered, so the
/// provider closest to the root wins.
pub(crate) struct ModuleLoader<'a> {
    container: &'a Container,
    routes: Routes,
}

impl<'a> ModuleLoader<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self {
            container,
            routes: RouteTable::new(),
        }
    }

    pub(crate) fn load(mut self, module: Module) -> Result<Routes, LoadError> {
        self.visit(module, &[], &[])?;
        Ok(self.routes)
    }

    fn visit(
        &mut self,
        module: Module,
        prefixes: &[String],
        inherited: &[RequestRegistryEntry],
    ) -> Result<(), LoadError> {
        let Module {
            name,
            prefix,
            imports,
            controllers,
            raw_routes,
            providers,
            request_registry,
        } = module;

        let mut prefixes = prefixes.to_vec();
        prefixes.push(prefix);

        let mut registry = inherited.to_vec();
        registry.extend(request_registry);

        for provider in &providers {
            if provider.register(self.container) {
                tracing::debug!(module = %name, provider = provider.type_name(), "registered provider");
            }
        }

        for child in imports {
            self.visit(child, &prefixes, &registry)?;
        }

        for controller in controllers {
            self.add_controller(controller, &prefixes, &registry)?;
        }

        for raw in raw_routes {
            self.add_raw(raw, &prefixes, &registry)?;
        }

        Ok(())
    }

    fn add_controller(
        &mut self,
        controller: ControllerDef,
        prefixes: &[String],
        registry: &[RequestRegistryEntry],
    ) -> Result<(), LoadError> {
        let ControllerDef {
            name,
            prefix,
            display_name,
            description,
            middleware,
            routes,
            construct,
        } = controller;

        let meta = ControllerMeta {
            display_name,
            description,
        };

        for route in routes {
            let path = join_path(
                prefixes
                    .iter()
                    .map(String::as_str)
                    .chain([prefix.as_str(), route.path.as_str()]),
            );

            let mut stack = middleware.clone();
            stack.extend(route.middleware);

            self.insert(RouteEntry {
                method: route.method,
                path,
                target: Target::Controller {
                    name,
                    construct: Arc::clone(&construct),
                    invoke: route.invoke,
                },
                hook: route.hook,
                status: route.status,
                params: route.params,
                middleware: stack,
                request_registry: registry.to_vec(),
                controller: meta.clone(),
            })?;
        }

        Ok(())
    }

    fn add_raw(
        &mut self,
        raw: RawRoute,
        prefixes: &[String],
        registry: &[RequestRegistryEntry],
    ) -> Result<(), LoadError> {
        let path = join_path(prefixes.iter().map(String::as_str).chain([raw.path.as_str()]));
        self.insert(RouteEntry {
            method: raw.method,
            path,
            target: Target::Raw(raw.handler),
            hook: Hook::new(),
            status: None,
            params: ParamList::new(),
            middleware: Vec::new(),
            request_registry: registry.to_vec(),
            controller: ControllerMeta::default(),
        })
    }

    fn insert(&mut self, entry: RouteEntry) -> Result<(), LoadError> {
        let method = entry.method.clone();
        let path = entry.path.clone();

        let replaced = self
            .routes
            .insert(&path, &method, Arc::new(entry))
            .map_err(|source| LoadError::Route {
                method: method.clone(),
                path: path.clone(),
                source,
            })?;

        if replaced.is_some() {
            tracing::warn!(%method, %path, "route registered twice, keeping the later one");
        } else {
            tracing::debug!(%method, %path, "registered route");
        }
        Ok(())
    }
}
