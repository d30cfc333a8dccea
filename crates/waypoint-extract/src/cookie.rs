//! Cookie header parsing.

use http::header::{HeaderMap, COOKIE};
use serde_json::{Map, Value};

/// Parses every `Cookie` header into a name to value mapping.
///
/// Pairs are split on `;` and the first `=`. Surrounding quotes are removed
/// from values. Pairs without `=` are ignored and later duplicates win.
///
/// ```rust
/// use waypoint_extract::parse_cookies;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(http::header::COOKIE, HeaderValue::from_static("session=abc123; theme=\"dark\""));
///
/// let cookies = parse_cookies(&headers);
/// assert_eq!(cookies["session"], "abc123");
/// assert_eq!(cookies["theme"], "dark");
/// ```
#[must_use]
pub fn parse_cookies(headers: &HeaderMap) -> Map<String, Value> {
    let mut cookies = Map::new();

    for header in headers.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };
        for cookie in header.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                let value = value.trim().trim_matches('"');
                cookies.insert(name.to_string(), Value::String(value.to_string()));
            }
        }
    }

    cookies
}
