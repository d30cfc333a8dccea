//! The response-init accumulator.
//!
//! Middleware, hooks and configuration each contribute a partial
//! [`ResponseInit`] (a status hint and some headers). The dispatcher folds
//! them together with [`ResponseInit::merge`], which never mutates either
//! side and returns a new value.
//!
//! Merge rules:
//!
//! - a status in the fragment replaces the accumulated status
//! - headers merge key by key; a key present in the fragment replaces
//!   every value the accumulator held for that key
//! - keys only present in the accumulator are kept

use http::header::{HeaderMap, HeaderName, HeaderValue, IntoHeaderName};
use http::StatusCode;

/// A partial response: optional status plus headers.
///
/// # Example
///
/// ```
/// use waypoint_core::ResponseInit;
/// use http::{HeaderValue, StatusCode};
///
/// let base = ResponseInit::new().header("x-a", HeaderValue::from_static("1"));
/// let fragment = ResponseInit::new()
///     .status(StatusCode::ACCEPTED)
///     .header("x-a", HeaderValue::from_static("2"))
///     .header("x-b", HeaderValue::from_static("3"));
///
/// let merged = base.merge(&fragment);
/// assert_eq!(merged.status_code(), Some(StatusCode::ACCEPTED));
/// assert_eq!(merged.headers()["x-a"], "2");
/// assert_eq!(merged.headers()["x-b"], "3");
/// assert!(base.status_code().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseInit {
    status: Option<StatusCode>,
    headers: HeaderMap,
}

impl ResponseInit {
    /// An empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status hint.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a header, replacing earlier values for the same key.
    #[must_use]
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a header from strings.
    ///
    /// Invalid names or values are rejected with a
    /// [`WaypointError::Unknown`](crate::WaypointError::Unknown).
    pub fn try_header(self, name: &str, value: &str) -> Result<Self, crate::WaypointError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| crate::WaypointError::unknown(format!("invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| crate::WaypointError::unknown(format!("invalid header value for '{name}': {e}")))?;
        Ok(self.header(name, value))
    }

    /// The status hint, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    /// The accumulated headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns `true` if neither status nor headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.headers.is_empty()
    }

    /// Returns a new value with `fragment` merged over `self`.
    #[must_use]
    pub fn merge(&self, fragment: &ResponseInit) -> ResponseInit {
        let mut merged = self.clone();
        if let Some(status) = fragment.status {
            merged.status = Some(status);
        }
        for key in fragment.headers.keys() {
            merged.headers.remove(key);
            for value in fragment.headers.get_all(key) {
                merged.headers.append(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Splits into status hint and headers.
    #[must_use]
    pub fn into_parts(self) -> (Option<StatusCode>, HeaderMap) {
        (self.status, self.headers)
    }
}

impl From<HeaderMap> for ResponseInit {
    fn from(headers: HeaderMap) -> Self {
        Self {
            status: None,
            headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hv(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).unwrap()
    }

    #[test]
    fn test_merge_empty_fragment_is_identity() {
        let base = ResponseInit::new()
            .status(StatusCode::CREATED)
            .header("x-one", hv("1"));
        assert_eq!(base.merge(&ResponseInit::new()), base);
    }

    #[test]
    fn test_merge_disjoint_headers_is_union() {
        let a = ResponseInit::new().header("x-a", hv("a"));
        let b = ResponseInit::new().header("x-b", hv("b"));
        let merged = a.merge(&b);
        assert_eq!(merged.headers().len(), 2);
        assert_eq!(merged.headers()["x-a"], "a");
        assert_eq!(merged.headers()["x-b"], "b");
    }

    #[test]
    fn test_merge_same_key_later_wins() {
        let mut multi = HeaderMap::new();
        multi.append("vary", hv("origin"));
        multi.append("vary", hv("accept"));
        let base = ResponseInit::from(multi);
        let merged = base.merge(&ResponseInit::new().header("vary", hv("cookie")));

        let values: Vec<_> = merged.headers().get_all("vary").iter().collect();
        assert_eq!(values, vec![&hv("cookie")]);
    }

    #[test]
    fn test_merge_keeps_status_when_fragment_has_none() {
        let base = ResponseInit::new().status(StatusCode::ACCEPTED);
        let merged = base.merge(&ResponseInit::new().header("x", hv("1")));
        assert_eq!(merged.status_code(), Some(StatusCode::ACCEPTED));
    }

    #[test]
    fn test_try_header_rejects_invalid() {
        assert!(ResponseInit::new().try_header("x-ok", "fine").is_ok());
        assert!(ResponseInit::new().try_header("bad name", "v").is_err());
        assert!(ResponseInit::new().try_header("x-bad", "line\nbreak").is_err());
    }

    fn header_map() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("x-[a-e]", "[a-z0-9]{1,6}"), 0..6)
    }

    fn build(pairs: &[(String, String)]) -> ResponseInit {
        pairs.iter().fold(ResponseInit::new(), |init, (k, v)| {
            init.header(HeaderName::from_bytes(k.as_bytes()).unwrap(), hv(v))
        })
    }

    proptest! {
        #[test]
        fn prop_merge_with_empty_is_identity(pairs in header_map()) {
            let init = build(&pairs);
            prop_assert_eq!(init.merge(&ResponseInit::new()), init.clone());
            prop_assert_eq!(ResponseInit::new().merge(&init), init);
        }

        #[test]
        fn prop_fragment_keys_win(left in header_map(), right in header_map()) {
            let a = build(&left);
            let b = build(&right);
            let merged = a.merge(&b);

            for key in b.headers().keys() {
                prop_assert_eq!(merged.headers().get(key), b.headers().get(key));
            }
            for key in a.headers().keys() {
                if !b.headers().contains_key(key) {
                    prop_assert_eq!(merged.headers().get(key), a.headers().get(key));
                }
            }
        }
    }
}
