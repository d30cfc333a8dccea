//! Built-in loaders for each [`ParamSource`](crate::ParamSource).
//!
//! Every loader validates its output against the matching hook schema when
//! one is declared.

use http::Method;
use serde_json::{Map, Value};
use waypoint_core::{Hook, IncomingRequest, Schema, WaypointError};
use waypoint_router::Params;

use crate::cookie::parse_cookies;
use crate::form::{parse_multipart, parse_urlencoded};

fn validate(schema: Option<&Schema>, value: Value) -> Result<Value, WaypointError> {
    match schema {
        Some(schema) => Ok(schema.parse(&value)?),
        None => Ok(value),
    }
}

/// Loads and validates the request body.
///
/// `GET` and `HEAD` requests never read the body. Other methods read it only
/// when the content type is JSON, url-encoded or multipart; any other body
/// yields `None`.
pub async fn load_body(
    request: &IncomingRequest,
    hook: &Hook,
) -> Result<Option<Value>, WaypointError> {
    if matches!(*request.method(), Method::GET | Method::HEAD) {
        return Ok(None);
    }

    let content_type = request.content_type().unwrap_or_default().to_owned();

    if content_type.contains("application/json") {
        let bytes = request.take_body()?;
        let body: Value = serde_json::from_slice(&bytes)?;
        return validate(hook.body_schema(), body).map(Some);
    }

    let form = if content_type.contains("application/x-www-form-urlencoded") {
        parse_urlencoded(&request.take_body()?)?
    } else if content_type.contains("multipart/form-data") {
        parse_multipart(&content_type, request.take_body()?).await?
    } else {
        return Ok(None);
    };

    validate(hook.form_data_schema(), Value::Object(form)).map(Some)
}

/// Flattens the query string. Repeated keys keep their last value.
pub fn load_query(request: &IncomingRequest, hook: &Hook) -> Result<Value, WaypointError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(request.query().unwrap_or_default())
            .map_err(|e| WaypointError::unknown(format!("invalid query string: {e}")))?;

    let query: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    validate(hook.query_schema(), Value::Object(query))
}

/// The path parameter mapping, validated against the path schema.
pub fn load_params(params: &Params, hook: &Hook) -> Result<Value, WaypointError> {
    let map: Map<String, Value> = params
        .iter()
        .map(|(k, v)| (k.to_owned(), Value::String(v.to_owned())))
        .collect();

    validate(hook.path_schema(), Value::Object(map))
}

/// One path parameter, after the whole mapping is validated.
pub fn load_param(
    name: &str,
    params: &Params,
    hook: &Hook,
) -> Result<Option<Value>, WaypointError> {
    match load_params(params, hook)? {
        Value::Object(mut map) => Ok(map.remove(name)),
        _ => Ok(None),
    }
}

/// The header mapping. Repeated headers are joined with `", "`.
pub fn load_headers(request: &IncomingRequest, hook: &Hook) -> Result<Value, WaypointError> {
    let mut map = Map::new();
    for name in request.headers().keys() {
        let joined = request
            .headers()
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        map.insert(name.as_str().to_owned(), Value::String(joined));
    }

    validate(hook.headers_schema(), Value::Object(map))
}

/// The cookie mapping.
pub fn load_cookies(request: &IncomingRequest, hook: &Hook) -> Result<Value, WaypointError> {
    let cookies = parse_cookies(request.headers());
    validate(hook.cookies_schema(), Value::Object(cookies))
}
