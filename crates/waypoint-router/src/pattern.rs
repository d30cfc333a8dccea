//! Path pattern compilation and matching.
//!
//! A [`PathPattern`] is compiled once from a route path such as
//! `/users/:id` and then matched against concrete request paths.
//!
//! # Segment Syntax
//!
//! | Syntax | Kind | Matches |
//! |--------|------|---------|
//! | `users` | static | the literal segment (ASCII case-insensitive) |
//! | `:id`, `{id}`, `[id]` | parameter | exactly one non-empty segment |
//! | `*rest`, `[...rest]` | catch-all | one or more trailing segments |
//!
//! Matching tolerates a single trailing slash on the request path, so
//! `/users/` matches the pattern `/users`. Captured values are returned
//! verbatim; no percent-decoding is applied.

use crate::params::Params;
use thiserror::Error;

/// Errors raised while compiling a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A parameter segment has no name (`/users/:`).
    #[error("empty parameter name in pattern '{pattern}'")]
    EmptyParamName {
        /// The offending pattern.
        pattern: String,
    },

    /// A parameter name contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid parameter name '{name}' in pattern '{pattern}'")]
    InvalidParamName {
        /// The offending pattern.
        pattern: String,
        /// The rejected name.
        name: String,
    },

    /// The same parameter name appears twice.
    #[error("duplicate parameter '{name}' in pattern '{pattern}'")]
    DuplicateParam {
        /// The offending pattern.
        pattern: String,
        /// The repeated name.
        name: String,
    },

    /// A catch-all segment is followed by further segments.
    #[error("catch-all segment must be last in pattern '{pattern}'")]
    CatchAllNotLast {
        /// The offending pattern.
        pattern: String,
    },
}

/// How well a pattern matches a request path.
///
/// Ordered so that a higher variant is a better match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// The pattern does not match.
    None = 0,
    /// The pattern matches through parameter or catch-all segments.
    Parametric = 1,
    /// The request path is string-equal to the pattern.
    Exact = 2,
}

impl Specificity {
    /// Numeric score (0, 1 or 2).
    #[must_use]
    pub const fn score(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

/// A compiled route path.
///
/// # Example
///
/// ```rust
/// use waypoint_router::PathPattern;
///
/// let pattern = PathPattern::parse("/users/:id").unwrap();
/// let params = pattern.matches("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
///
/// assert!(pattern.matches("/users").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compiles a pattern.
    ///
    /// Empty segments (`//`) are ignored, so `/a//b` compiles like `/a/b`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (idx, part) in parts.iter().enumerate() {
            let segment = parse_segment(pattern, part)?;

            if let Segment::Param(name) | Segment::CatchAll(name) = &segment {
                let duplicate = segments.iter().any(|s| match s {
                    Segment::Param(n) | Segment::CatchAll(n) => n == name,
                    Segment::Static(_) => false,
                });
                if duplicate {
                    return Err(PatternError::DuplicateParam {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
            }

            if matches!(segment, Segment::CatchAll(_)) && idx + 1 != parts.len() {
                return Err(PatternError::CatchAllNotLast {
                    pattern: pattern.to_string(),
                });
            }

            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the pattern has no parameter or catch-all segments.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }

    /// Names of the parameters declared by this pattern, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// Matches a request path, returning captured parameters on success.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let trimmed = match path.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => path,
        };
        let rest = trimmed.strip_prefix('/')?;
        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        let mut params = Params::with_capacity(self.segments.len());
        let mut idx = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    let part = parts.get(idx)?;
                    if !part.eq_ignore_ascii_case(expected) {
                        return None;
                    }
                    idx += 1;
                }
                Segment::Param(name) => {
                    let part = parts.get(idx)?;
                    if part.is_empty() {
                        return None;
                    }
                    params.push(name.as_str(), *part);
                    idx += 1;
                }
                Segment::CatchAll(name) => {
                    let tail = parts.get(idx..)?;
                    if tail.is_empty() || tail.iter().any(|p| p.is_empty()) {
                        return None;
                    }
                    params.push(name.as_str(), tail.join("/"));
                    idx = parts.len();
                }
            }
        }

        (idx == parts.len()).then_some(params)
    }

    /// Scores this pattern against a request path.
    ///
    /// String equality with the registered pattern text wins over a
    /// parametric match.
    #[must_use]
    pub fn specificity(&self, path: &str) -> Specificity {
        if path == self.raw {
            Specificity::Exact
        } else if self.matches(path).is_some() {
            Specificity::Parametric
        } else {
            Specificity::None
        }
    }
}

fn parse_segment(pattern: &str, part: &str) -> Result<Segment, PatternError> {
    let (name, catch_all) = if let Some(name) = part
        .strip_prefix("[...")
        .and_then(|p| p.strip_suffix(']'))
    {
        (name, true)
    } else if let Some(name) = part.strip_prefix('*') {
        (name, true)
    } else if let Some(name) = part.strip_prefix(':') {
        (name, false)
    } else if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        (name, false)
    } else if let Some(name) = part.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
        (name, false)
    } else {
        return Ok(Segment::Static(part.to_string()));
    };

    if name.is_empty() {
        return Err(PatternError::EmptyParamName {
            pattern: pattern.to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(PatternError::InvalidParamName {
            pattern: pattern.to_string(),
            name: name.to_string(),
        });
    }

    Ok(if catch_all {
        Segment::CatchAll(name.to_string())
    } else {
        Segment::Param(name.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_pattern() {
        let pattern = PathPattern::parse("/api/users").unwrap();
        assert!(pattern.is_static());
        assert!(pattern.matches("/api/users").is_some());
        assert!(pattern.matches("/api/users/").is_some());
        assert!(pattern.matches("/api/posts").is_none());
        assert!(pattern.matches("/api/users/1").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/").is_some());
        assert!(pattern.matches("/x").is_none());
    }

    #[test]
    fn test_param_syntaxes() {
        for raw in ["/users/:id", "/users/{id}", "/users/[id]"] {
            let pattern = PathPattern::parse(raw).unwrap();
            let params = pattern.matches("/users/abc").unwrap();
            assert_eq!(params.get("id"), Some("abc"), "pattern {raw}");
            assert_eq!(pattern.param_names().collect::<Vec<_>>(), vec!["id"]);
        }
    }

    #[test]
    fn test_catch_all_syntaxes() {
        for raw in ["/files/*rest", "/files/[...rest]"] {
            let pattern = PathPattern::parse(raw).unwrap();
            let params = pattern.matches("/files/a/b/c.txt").unwrap();
            assert_eq!(params.get("rest"), Some("a/b/c.txt"));
            assert!(pattern.matches("/files").is_none());
        }
    }

    #[test]
    fn test_case_insensitive_static() {
        let pattern = PathPattern::parse("/Api/Users").unwrap();
        assert!(pattern.matches("/api/users").is_some());
    }

    #[test]
    fn test_param_value_is_not_decoded() {
        let pattern = PathPattern::parse("/tags/:name").unwrap();
        let params = pattern.matches("/tags/hello%20world").unwrap();
        assert_eq!(params.get("name"), Some("hello%20world"));
    }

    #[test]
    fn test_empty_segment_does_not_match_param() {
        let pattern = PathPattern::parse("/a/:id/b").unwrap();
        assert!(pattern.matches("/a//b").is_none());
    }

    #[test]
    fn test_specificity() {
        let literal = PathPattern::parse("/user/profile").unwrap();
        let param = PathPattern::parse("/user/:id").unwrap();

        assert_eq!(literal.specificity("/user/profile"), Specificity::Exact);
        assert_eq!(param.specificity("/user/profile"), Specificity::Parametric);
        assert_eq!(param.specificity("/post/1"), Specificity::None);
        assert!(Specificity::Exact > Specificity::Parametric);
        assert_eq!(Specificity::Exact.score(), 2);
    }

    #[test]
    fn test_trailing_slash_is_parametric_not_exact() {
        let pattern = PathPattern::parse("/users").unwrap();
        assert_eq!(pattern.specificity("/users/"), Specificity::Parametric);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            PathPattern::parse("/users/:"),
            Err(PatternError::EmptyParamName { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/users/:id-x"),
            Err(PatternError::InvalidParamName { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/a/:id/b/:id"),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            PathPattern::parse("/a/*rest/b"),
            Err(PatternError::CatchAllNotLast { .. })
        ));
    }
}
