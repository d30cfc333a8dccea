//! Prefix joining for nested modules and controllers.

/// Joins path fragments into a normalized route path.
///
/// Fragments are split on `/` and empty segments are dropped, wherever
/// they occur. The result always has exactly one leading slash
/// and no trailing slash, except for the root path `/`.
///
/// # Example
///
/// ```rust
/// use waypoint_router::join_path;
///
/// assert_eq!(join_path(["/api/", "", "/users", "/:id/"]), "/api/users/:id");
/// assert_eq!(join_path(["/api//v1", "users"]), "/api/v1/users");
/// assert_eq!(join_path(["/", "/"]), "/");
/// assert_eq!(join_path(Vec::<&str>::new()), "/");
/// ```
pub fn join_path<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::from("/");
    for part in parts {
        for segment in part.as_ref().split('/').filter(|segment| !segment.is_empty()) {
            if joined.len() > 1 {
                joined.push('/');
            }
            joined.push_str(segment);
        }
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_path_basic() {
        assert_eq!(join_path(["api", "users"]), "/api/users");
        assert_eq!(join_path(["/api", "/"]), "/api");
    }

    #[test]
    fn test_join_path_collapses_slashes() {
        assert_eq!(join_path(["//api//", "//v1"]), "/api/v1");
    }

    #[test]
    fn test_join_path_drops_inner_empty_segments() {
        assert_eq!(join_path(["a//b", "c"]), "/a/b/c");
        assert_eq!(join_path(["/api///v1/", "users//:id"]), "/api/v1/users/:id");
    }

    #[test]
    fn test_join_path_keeps_inner_segments() {
        assert_eq!(join_path(["/api/v1", "user/:id"]), "/api/v1/user/:id");
    }

    #[test]
    fn test_join_path_empty() {
        assert_eq!(join_path([""; 0]), "/");
        assert_eq!(join_path(["", ""]), "/");
    }
}
