//! HTTP method dispatch for a single path.
//!
//! [`MethodRouter`] holds at most one value per supported HTTP method. The
//! value type is generic so the same router serves plain operation names in
//! tests and full route entries in the dispatcher.

use http::Method;

/// The methods a [`MethodRouter`] can hold, in registration-slot order.
pub const SUPPORTED_METHODS: [Method; 7] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
    Method::OPTIONS,
];

/// Maps HTTP methods to values for one route path.
///
/// # Example
///
/// ```rust
/// use waypoint_router::MethodRouter;
/// use http::Method;
///
/// let mut router = MethodRouter::new();
/// router.insert(&Method::GET, "listUsers").unwrap();
/// router.insert(&Method::POST, "createUser").unwrap();
///
/// assert_eq!(router.route(&Method::GET), Some(&"listUsers"));
/// assert_eq!(router.route(&Method::DELETE), None);
/// assert_eq!(router.allowed_methods(), [Method::GET, Method::POST]);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<T>,
    post: Option<T>,
    put: Option<T>,
    patch: Option<T>,
    delete: Option<T>,
    head: Option<T>,
    options: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            patch: None,
            delete: None,
            head: None,
            options: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates an empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `method` has a slot in a [`MethodRouter`].
    #[must_use]
    pub fn is_supported(method: &Method) -> bool {
        SUPPORTED_METHODS.contains(method)
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<T>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::PATCH => Some(&mut self.patch),
            Method::DELETE => Some(&mut self.delete),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            _ => None,
        }
    }

    /// Stores `value` for `method`, replacing any previous value.
    ///
    /// Returns `Err(value)` if the method is not supported, otherwise the
    /// replaced value, if any.
    pub fn insert(&mut self, method: &Method, value: T) -> Result<Option<T>, T> {
        match self.slot_mut(method) {
            Some(slot) => Ok(slot.replace(value)),
            None => Err(value),
        }
    }

    /// The value registered for `method`.
    #[must_use]
    pub fn route(&self, method: &Method) -> Option<&T> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            _ => None,
        }
    }

    /// Methods with a registered value, in slot order.
    ///
    /// Fills the `Allow` header of a 405 response.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.iter().map(|(method, _)| method).collect()
    }

    /// Iterates `(method, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Method, &T)> {
        [
            (Method::GET, self.get.as_ref()),
            (Method::POST, self.post.as_ref()),
            (Method::PUT, self.put.as_ref()),
            (Method::PATCH, self.patch.as_ref()),
            (Method::DELETE, self.delete.as_ref()),
            (Method::HEAD, self.head.as_ref()),
            (Method::OPTIONS, self.options.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, value)| value.map(|v| (method, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_methods() -> MethodRouter<&'static str> {
        let mut router = MethodRouter::new();
        for (method, name) in SUPPORTED_METHODS
            .iter()
            .zip(["get", "post", "put", "patch", "delete", "head", "options"])
        {
            router.insert(method, name).unwrap();
        }
        router
    }

    #[test]
    fn test_method_router_new() {
        let router: MethodRouter<&str> = MethodRouter::new();
        assert!(router.allowed_methods().is_empty());
        assert_eq!(router.iter().count(), 0);
    }

    #[test]
    fn test_method_router_every_supported_slot() {
        let router = all_methods();

        for method in SUPPORTED_METHODS {
            assert!(router.route(&method).is_some(), "missing {method}");
        }
        assert_eq!(router.route(&Method::TRACE), None);
    }

    #[test]
    fn test_method_router_insert_replaces() {
        let mut router = MethodRouter::new();
        assert_eq!(router.insert(&Method::GET, "first"), Ok(None));
        assert_eq!(router.insert(&Method::GET, "second"), Ok(Some("first")));
        assert_eq!(router.route(&Method::GET), Some(&"second"));
    }

    #[test]
    fn test_method_router_insert_unsupported() {
        let mut router = MethodRouter::new();
        assert_eq!(router.insert(&Method::CONNECT, "tunnel"), Err("tunnel"));
        assert!(!MethodRouter::<()>::is_supported(&Method::CONNECT));
    }

    #[test]
    fn test_method_router_allowed_methods_in_slot_order() {
        let mut router = MethodRouter::new();
        router.insert(&Method::DELETE, 1).unwrap();
        router.insert(&Method::GET, 2).unwrap();
        assert_eq!(router.allowed_methods(), vec![Method::GET, Method::DELETE]);

        let pairs: Vec<_> = router.iter().collect();
        assert_eq!(pairs, vec![(Method::GET, &2), (Method::DELETE, &1)]);
    }
}
