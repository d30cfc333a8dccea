//! The flattened route table.
//!
//! Patterns are kept in first-registration order. Lookup scores every
//! pattern against the request path and picks the highest score; equal
//! scores resolve to the pattern that was registered first. This makes
//! registration order part of the routing contract for ambiguous patterns
//! such as `/items/:id` and `/items/:slug`.

use crate::method_router::MethodRouter;
use crate::params::Params;
use crate::pattern::{PathPattern, PatternError, Specificity};
use http::Method;
use indexmap::IndexMap;

/// Error returned by [`RouteTable::insert`].
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    /// The path could not be compiled.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The method has no slot in a [`MethodRouter`].
    #[error("unsupported HTTP method {method} for route '{path}'")]
    UnsupportedMethod {
        /// The rejected method.
        method: Method,
        /// The route path.
        path: String,
    },
}

#[derive(Debug, Clone)]
struct RouteSlot<T> {
    pattern: PathPattern,
    methods: MethodRouter<T>,
}

/// The result of a successful path lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The winning pattern.
    pub pattern: &'a PathPattern,
    /// Values registered under the winning pattern.
    pub methods: &'a MethodRouter<T>,
    /// Parameters captured from the request path.
    pub params: Params,
    /// How the pattern matched.
    pub specificity: Specificity,
}

/// Path pattern to [`MethodRouter`] mapping.
///
/// # Example
///
/// ```rust
/// use waypoint_router::RouteTable;
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.insert("/user/:id", &Method::GET, "byId").unwrap();
/// table.insert("/user/profile", &Method::GET, "profile").unwrap();
///
/// let found = table.find("/user/profile").unwrap();
/// assert_eq!(found.methods.route(&Method::GET), Some(&"profile"));
///
/// let found = table.find("/user/7").unwrap();
/// assert_eq!(found.params.get("id"), Some("7"));
///
/// assert!(table.find("/post/7").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    routes: IndexMap<String, RouteSlot<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            routes: IndexMap::new(),
        }
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` for `method` on `path`.
    ///
    /// Re-registering the same path and method replaces the earlier value
    /// and returns it. The path keeps its original position.
    pub fn insert(&mut self, path: &str, method: &Method, value: T) -> Result<Option<T>, InsertError> {
        if !MethodRouter::<T>::is_supported(method) {
            return Err(InsertError::UnsupportedMethod {
                method: method.clone(),
                path: path.to_string(),
            });
        }

        if !self.routes.contains_key(path) {
            let pattern = PathPattern::parse(path)?;
            self.routes.insert(
                path.to_string(),
                RouteSlot {
                    pattern,
                    methods: MethodRouter::new(),
                },
            );
        }

        let slot = self
            .routes
            .get_mut(path)
            .map(|slot| slot.methods.insert(method, value));
        match slot {
            Some(Ok(previous)) => Ok(previous),
            _ => Err(InsertError::UnsupportedMethod {
                method: method.clone(),
                path: path.to_string(),
            }),
        }
    }

    /// Finds the most specific pattern matching `path`.
    ///
    /// Returns `None` when no pattern matches.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        let mut best: Option<(&RouteSlot<T>, Specificity)> = None;

        for slot in self.routes.values() {
            let specificity = slot.pattern.specificity(path);
            if specificity == Specificity::None {
                continue;
            }
            // strict comparison keeps the earliest registration on ties
            if best.map_or(true, |(_, top)| specificity > top) {
                best = Some((slot, specificity));
            }
        }

        let (slot, specificity) = best?;
        let params = slot.pattern.matches(path).unwrap_or_default();
        Some(RouteMatch {
            pattern: &slot.pattern,
            methods: &slot.methods,
            params,
            specificity,
        })
    }

    /// Iterates `(pattern, methods)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathPattern, &MethodRouter<T>)> {
        self.routes.values().map(|slot| (&slot.pattern, &slot.methods))
    }

    /// Number of distinct path patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
