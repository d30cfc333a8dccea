//! Dependency injection container.
//!
//! Services are registered by type (or by a string token for request-scoped
//! values) and resolved on first use. Every application owns a child
//! [`Container`] whose parent is a process-wide root, so services registered
//! on the root are visible to every application while application-level
//! registrations stay isolated.
//!
//! Controllers are not stored in the container. They implement
//! [`Injectable`] and are constructed from it when a route needs them.
//!
//! # Example
//!
//! ```rust
//! use waypoint_core::di::{Container, Injectable, InjectionError};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserController {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserController {
//!     fn inject(container: &Container) -> Result<Self, InjectionError> {
//!         Ok(Self { db: container.resolve_required()? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.register(Arc::new(Database { url: "postgres://localhost/db".into() }));
//!
//! let controller = UserController::inject(&container).unwrap();
//! assert_eq!(controller.db.url, "postgres://localhost/db");
//! ```

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Container) -> Result<Service, InjectionError> + Send + Sync>;

/// Error when a dependency cannot be resolved.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to inject {type_name}: {reason}")]
pub struct InjectionError {
    /// The type name or token that could not be resolved.
    pub type_name: String,
    /// The reason for the failure.
    pub reason: String,
}

impl InjectionError {
    /// Creates a new injection error for a missing service.
    pub fn not_registered<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>().to_string(),
            reason: "service not registered".to_string(),
        }
    }

    /// Creates a new injection error for a missing named token.
    pub fn token_not_registered(token: &str) -> Self {
        Self {
            type_name: format!("token '{token}'"),
            reason: "token not registered".to_string(),
        }
    }

    /// Creates a new injection error with a custom reason.
    pub fn custom<T>(reason: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>().to_string(),
            reason: reason.into(),
        }
    }
}

/// A type that can be constructed from a [`Container`].
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Builds an instance, resolving its dependencies from `container`.
    fn inject(container: &Container) -> Result<Self, InjectionError>;
}

/// A dependency injection container.
///
/// All methods take `&self`; the container is shared behind an `Arc`
/// between the application and its requests.
#[derive(Default)]
pub struct Container {
    parent: Option<Arc<Container>>,
    services: RwLock<HashMap<TypeId, Service>>,
    factories: RwLock<HashMap<TypeId, Factory>>,
    named: RwLock<HashMap<String, Service>>,
}

impl Container {
    /// Creates a new empty root container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty child scope of `parent`.
    ///
    /// Lookups that miss in the child fall through to the parent.
    #[must_use]
    pub fn child(parent: &Arc<Container>) -> Self {
        Self {
            parent: Some(Arc::clone(parent)),
            ..Self::default()
        }
    }

    /// Registers a service instance, replacing any earlier one of the same type.
    pub fn register<T: Send + Sync + 'static>(&self, service: Arc<T>) {
        self.services.write().insert(TypeId::of::<T>(), service);
    }

    /// Registers a factory that builds the service on first resolution.
    ///
    /// The built instance is cached in this container.
    pub fn register_factory<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        let erased: Factory = Arc::new(move |container| {
            factory(container).map(|service| Arc::new(service) as Service)
        });
        self.factories.write().insert(TypeId::of::<T>(), erased);
    }

    /// Resolves a service from this scope or its ancestors.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.try_resolve::<T>().ok().flatten()
    }

    /// Resolves a service or returns an error.
    ///
    /// Factory failures are reported with their own reason.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.try_resolve::<T>()?
            .ok_or_else(InjectionError::not_registered::<T>)
    }

    fn try_resolve<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, InjectionError> {
        let id = TypeId::of::<T>();

        if let Some(service) = self.services.read().get(&id) {
            return Ok(Arc::clone(service).downcast::<T>().ok());
        }

        let factory = self.factories.read().get(&id).cloned();
        if let Some(factory) = factory {
            let service = factory(self)?;
            // a concurrent resolution may have won; keep the first instance
            let stored = Arc::clone(
                self.services
                    .write()
                    .entry(id)
                    .or_insert(service),
            );
            return Ok(stored.downcast::<T>().ok());
        }

        match &self.parent {
            Some(parent) => parent.try_resolve::<T>(),
            None => Ok(None),
        }
    }

    /// Checks if a service or factory is registered in this scope or its ancestors.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.services.read().contains_key(&id)
            || self.factories.read().contains_key(&id)
            || self.parent.as_ref().is_some_and(|p| p.contains::<T>())
    }

    /// Registers a value under a string token.
    pub fn register_named<T: Send + Sync + 'static>(&self, token: impl Into<String>, value: Arc<T>) {
        self.named.write().insert(token.into(), value);
    }

    /// Registers an already type-erased value under a string token.
    pub fn register_named_erased(&self, token: impl Into<String>, value: Arc<dyn Any + Send + Sync>) {
        self.named.write().insert(token.into(), value);
    }

    /// Resolves a token-registered value of type `T`.
    ///
    /// Returns `None` if the token is missing or holds a different type.
    #[must_use]
    pub fn resolve_named<T: Send + Sync + 'static>(&self, token: &str) -> Option<Arc<T>> {
        let found = self.named.read().get(token).cloned();
        match found {
            Some(value) => value.downcast::<T>().ok(),
            None => self.parent.as_ref().and_then(|p| p.resolve_named(token)),
        }
    }

    /// Checks if a token is registered in this scope or its ancestors.
    #[must_use]
    pub fn contains_named(&self, token: &str) -> bool {
        self.named.read().contains_key(token)
            || self.parent.as_ref().is_some_and(|p| p.contains_named(token))
    }

    /// Returns the number of services and tokens registered in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.read().len() + self.named.read().len()
    }

    /// Returns `true` if nothing is registered in this scope.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.services.read().len())
            .field("factory_count", &self.factories.read().len())
            .field("named_count", &self.named.read().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct TestService {
        value: String,
    }

    impl TestService {
        fn new(value: &str) -> Self {
            Self {
                value: value.to_string(),
            }
        }
    }

    struct Controller {
        service: Arc<TestService>,
    }

    impl Injectable for Controller {
        fn inject(container: &Container) -> Result<Self, InjectionError> {
            Ok(Self {
                service: container.resolve_required()?,
            })
        }
    }

    #[test]
    fn test_container_new() {
        let container = Container::new();
        assert!(container.is_empty());
    }

    #[test]
    fn test_container_register_and_resolve() {
        let container = Container::new();
        container.register(Arc::new(TestService::new("hello")));

        let service: Arc<TestService> = container.resolve().unwrap();
        assert_eq!(service.value, "hello");
    }

    #[test]
    fn test_container_resolve_required_missing() {
        let container = Container::new();
        let err = container.resolve_required::<TestService>().unwrap_err();
        assert!(err.to_string().contains("TestService"));
        assert!(err.to_string().contains("not registered"));
    }

    #[test]
    fn test_child_falls_through_to_parent() {
        let root = Arc::new(Container::new());
        root.register(Arc::new(TestService::new("root")));

        let child = Container::child(&root);
        assert!(child.contains::<TestService>());
        assert_eq!(child.resolve::<TestService>().unwrap().value, "root");

        child.register(Arc::new(TestService::new("child")));
        assert_eq!(child.resolve::<TestService>().unwrap().value, "child");
        assert_eq!(root.resolve::<TestService>().unwrap().value, "root");
    }

    #[test]
    fn test_factory_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let container = Container::new();
        container.register_factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(TestService::new("built"))
        });

        assert!(container.contains::<TestService>());
        let first = container.resolve::<TestService>().unwrap();
        let second = container.resolve::<TestService>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_error_propagates() {
        let container = Container::new();
        container.register_factory::<TestService, _>(|_| {
            Err(InjectionError::custom::<TestService>("no config"))
        });

        let err = container.resolve_required::<TestService>().unwrap_err();
        assert_eq!(err.reason, "no config");
    }

    #[test]
    fn test_injectable() {
        let container = Container::new();
        assert!(Controller::inject(&container).is_err());

        container.register(Arc::new(TestService::new("svc")));
        let controller = Controller::inject(&container).unwrap();
        assert_eq!(controller.service.value, "svc");
    }

    #[test]
    fn test_named_tokens() {
        let root = Arc::new(Container::new());
        let child = Container::child(&root);
        assert!(!child.contains_named("user"));

        child.register_named("user", Arc::new(String::from("John Doe")));
        assert!(child.contains_named("user"));
        assert!(!root.contains_named("user"));
        assert_eq!(
            child.resolve_named::<String>("user").as_deref().map(String::as_str),
            Some("John Doe")
        );
        assert!(child.resolve_named::<u32>("user").is_none());
    }

    #[test]
    fn test_container_debug() {
        let container = Container::new();
        container.register(Arc::new(TestService::new("debug")));

        let debug = format!("{:?}", container);
        assert!(debug.contains("Container"));
        assert!(debug.contains("service_count"));
    }
}
