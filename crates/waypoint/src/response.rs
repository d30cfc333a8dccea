//! Turns dispatch results into finished responses.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use http_body_util::Full;
use serde_json::Value;
use waypoint_core::{Reply, Response, ResponseInit, WaypointError};

/// Wraps `body` as JSON over the accumulated `init`.
///
/// `status` and `content_type` replace whatever the accumulator carries.
/// A content type that is not a valid header value falls back to
/// `application/json`.
pub(crate) fn json_response(init: ResponseInit, status: StatusCode, content_type: &str, body: &Value) -> Response {
    let (_, mut headers) = init.into_parts();
    let content_type = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, content_type);

    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Builds the final response for a handler result.
///
/// A finished [`Reply::Response`] is returned untouched; the accumulator is
/// not applied to it.
pub(crate) fn build_response(reply: Reply, init: ResponseInit, status: StatusCode, content_type: &str) -> Response {
    match reply {
        Reply::Response(response) => response,
        Reply::Json(value) => json_response(init, status, content_type, &value),
    }
}

/// Renders an error with the headers accumulated before the failure.
pub(crate) fn error_response(err: &WaypointError, init: ResponseInit) -> Response {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(error = %err, status = status.as_u16(), "request failed");
    } else {
        tracing::debug!(error = %err, status = status.as_u16(), "request rejected");
    }
    json_response(init, status, "application/json", &err.body())
}
