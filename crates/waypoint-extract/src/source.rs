//! Parameter sources and argument lists.
//!
//! Each handler declares, per argument position, where the value comes from.
//! The set of built-in sources is closed; anything else goes through
//! [`ParamSource::Custom`].

use crate::error::ParamListError;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use waypoint_core::{BoxFuture, Hook, IncomingRequest, WaypointError};
use waypoint_router::Params;

/// A user-supplied argument loader.
pub type CustomLoader = Arc<
    dyn for<'a> Fn(
            &'a IncomingRequest,
            &'a Hook,
            &'a Params,
        ) -> BoxFuture<'a, Result<Option<Value>, WaypointError>>
        + Send
        + Sync,
>;

/// Where one handler argument comes from.
#[derive(Clone)]
pub enum ParamSource {
    /// The decoded request body (JSON, form or multipart).
    Body,
    /// The flattened query string.
    Query,
    /// One named path parameter.
    Param(String),
    /// Every path parameter.
    Params,
    /// The header mapping.
    Headers,
    /// The cookie mapping.
    Cookies,
    /// The request itself.
    Request,
    /// A custom loader.
    Custom(CustomLoader),
}

impl ParamSource {
    /// A single named path parameter.
    #[must_use]
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// Wraps a custom loader.
    ///
    /// The loader sees the request, the route hook and the path parameters.
    /// Returning `Ok(None)` yields an absent argument.
    #[must_use]
    pub fn custom<F>(loader: F) -> Self
    where
        F: for<'a> Fn(
                &'a IncomingRequest,
                &'a Hook,
                &'a Params,
            ) -> BoxFuture<'a, Result<Option<Value>, WaypointError>>
            + Send
            + Sync
            + 'static,
    {
        Self::Custom(Arc::new(loader))
    }

    /// Wraps a synchronous custom loader.
    #[must_use]
    pub fn custom_sync<F>(loader: F) -> Self
    where
        F: Fn(&IncomingRequest, &Hook, &Params) -> Result<Option<Value>, WaypointError>
            + Send
            + Sync
            + 'static,
    {
        Self::custom(move |request, hook, params| {
            let result = loader(request, hook, params);
            Box::pin(std::future::ready(result))
        })
    }

    /// Short name used in logs and route summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Param(_) => "param",
            Self::Params => "params",
            Self::Headers => "headers",
            Self::Cookies => "cookies",
            Self::Request => "request",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => f.debug_tuple("Param").field(name).finish(),
            other => f.write_str(match other {
                Self::Body => "Body",
                Self::Query => "Query",
                Self::Params => "Params",
                Self::Headers => "Headers",
                Self::Cookies => "Cookies",
                Self::Request => "Request",
                _ => "Custom",
            }),
        }
    }
}

/// The ordered argument sources of one handler.
///
/// Positions are dense from 0. A list built with [`ParamList::indexed`] is
/// checked for duplicates and gaps and sorted by position, so declaration
/// order does not matter.
#[derive(Debug, Clone, Default)]
pub struct ParamList {
    sources: Vec<ParamSource>,
}

impl ParamList {
    /// An empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from `(index, source)` pairs in any order.
    pub fn indexed<I>(pairs: I) -> Result<Self, ParamListError>
    where
        I: IntoIterator<Item = (usize, ParamSource)>,
    {
        let mut pairs: Vec<(usize, ParamSource)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(index, _)| *index);

        for (expected, (index, source)) in pairs.iter().enumerate() {
            if *index < expected {
                return Err(ParamListError::DuplicateIndex { index: *index });
            }
            if *index > expected {
                return Err(ParamListError::MissingIndex { index: expected });
            }
            if matches!(source, ParamSource::Param(name) if name.is_empty()) {
                return Err(ParamListError::EmptyParamName { index: *index });
            }
        }

        Ok(Self {
            sources: pairs.into_iter().map(|(_, source)| source).collect(),
        })
    }

    /// Appends the next positional source.
    pub fn push(mut self, source: ParamSource) -> Result<Self, ParamListError> {
        if matches!(&source, ParamSource::Param(name) if name.is_empty()) {
            return Err(ParamListError::EmptyParamName {
                index: self.sources.len(),
            });
        }
        self.sources.push(source);
        Ok(self)
    }

    /// The sources in argument order.
    pub fn iter(&self) -> impl Iterator<Item = &ParamSource> {
        self.sources.iter()
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if the handler takes no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns `true` if any argument reads the body.
    #[must_use]
    pub fn reads_body(&self) -> bool {
        self.sources.iter().any(|s| matches!(s, ParamSource::Body))
    }
}

impl FromIterator<ParamSource> for ParamList {
    fn from_iter<T: IntoIterator<Item = ParamSource>>(iter: T) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

/// Helper for boxing an async custom loader body.
pub fn boxed<'a, F>(future: F) -> BoxFuture<'a, Result<Option<Value>, WaypointError>>
where
    F: Future<Output = Result<Option<Value>, WaypointError>> + Send + 'a,
{
    Box::pin(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_sorts_by_position() {
        let list = ParamList::indexed([
            (2, ParamSource::Headers),
            (0, ParamSource::Body),
            (1, ParamSource::param("id")),
        ])
        .unwrap();

        let kinds: Vec<_> = list.iter().map(ParamSource::kind).collect();
        assert_eq!(kinds, vec!["body", "param", "headers"]);
        assert!(list.reads_body());
    }

    #[test]
    fn test_indexed_rejects_gap() {
        let err = ParamList::indexed([(0, ParamSource::Body), (2, ParamSource::Query)]).unwrap_err();
        assert_eq!(err, ParamListError::MissingIndex { index: 1 });

        let err = ParamList::indexed([(1, ParamSource::Body)]).unwrap_err();
        assert_eq!(err, ParamListError::MissingIndex { index: 0 });
    }

    #[test]
    fn test_indexed_rejects_duplicate() {
        let err = ParamList::indexed([
            (0, ParamSource::Body),
            (1, ParamSource::Query),
            (1, ParamSource::Cookies),
        ])
        .unwrap_err();
        assert_eq!(err, ParamListError::DuplicateIndex { index: 1 });
    }

    #[test]
    fn test_empty_param_name_rejected() {
        let err = ParamList::new().push(ParamSource::param("")).unwrap_err();
        assert_eq!(err, ParamListError::EmptyParamName { index: 0 });
    }

    #[test]
    fn test_debug_hides_loader() {
        let source = ParamSource::custom_sync(|_, _, _| Ok(None));
        assert_eq!(format!("{source:?}"), "Custom");
        assert_eq!(format!("{:?}", ParamSource::param("id")), "Param(\"id\")");
    }
}
