//! Handler results.
//!
//! A handler either produces a JSON value, which the response builder wraps
//! with the accumulated status and headers, or a finished [`Response`], which
//! is returned exactly as it is.

use crate::error::WaypointError;
use crate::request::Response;
use serde::Serialize;
use serde_json::Value;

/// The tentative result of a handler or raw route.
#[derive(Debug)]
pub enum Reply {
    /// A value to serialize as the JSON body.
    Json(Value),
    /// A complete response, passed through untouched.
    Response(Response),
}

impl Reply {
    /// An empty JSON body (`null`).
    #[must_use]
    pub fn empty() -> Self {
        Self::Json(Value::Null)
    }

    /// The JSON value, if this is not a finished response.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Response(_) => None,
        }
    }

    /// Returns `true` if this is a finished response.
    #[must_use]
    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

/// Conversion of handler return values into a [`Reply`].
pub trait IntoReply {
    /// Performs the conversion.
    fn into_reply(self) -> Result<Reply, WaypointError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(self)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::Json(self))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::empty())
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::Json(Value::String(self)))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::Json(Value::String(self.to_owned())))
    }
}

/// Wraps any serializable value as a JSON reply.
///
/// ```
/// use waypoint_core::{IntoReply, Json};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { id: u32 }
///
/// let reply = Json(User { id: 7 }).into_reply().unwrap();
/// assert_eq!(reply.as_json(), Some(&serde_json::json!({"id": 7})));
/// ```
#[derive(Debug, Clone)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        Ok(Reply::Json(serde_json::to_value(self.0)?))
    }
}

impl<T: IntoReply> IntoReply for Result<T, WaypointError> {
    fn into_reply(self) -> Result<Reply, WaypointError> {
        self.and_then(IntoReply::into_reply)
    }
}
