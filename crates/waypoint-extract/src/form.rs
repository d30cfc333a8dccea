//! Form and multipart body decoding.
//!
//! Both encodings decode to a flat JSON object. Text fields pass through
//! [`purify`](crate::purify); uploaded files become an object with the file
//! metadata and base64 content. When a field name repeats, the last value
//! wins.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use std::io;
use waypoint_core::WaypointError;

use crate::purify::purify;

/// Default maximum number of multipart fields.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Decodes an `application/x-www-form-urlencoded` body.
///
/// ```
/// use waypoint_extract::parse_urlencoded;
/// use serde_json::json;
///
/// let form = parse_urlencoded(b"name=Ada&age=36&admin=false&skip=undefined").unwrap();
/// assert_eq!(serde_json::Value::Object(form), json!({"name": "Ada", "age": 36, "admin": false}));
/// ```
pub fn parse_urlencoded(body: &[u8]) -> Result<Map<String, Value>, WaypointError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| WaypointError::unknown(format!("Failed to parse body as FormData: {e}")))?;

    Ok(collect_fields(pairs))
}

fn collect_fields(pairs: impl IntoIterator<Item = (String, String)>) -> Map<String, Value> {
    let mut fields = Map::new();
    for (name, raw) in pairs {
        match purify(&raw) {
            Some(value) => {
                fields.insert(name, value);
            }
            None => {
                fields.remove(&name);
            }
        }
    }
    fields
}

/// Decodes a `multipart/form-data` body.
///
/// `content_type` must carry the boundary parameter.
pub async fn parse_multipart(
    content_type: &str,
    body: Bytes,
) -> Result<Map<String, Value>, WaypointError> {
    let boundary = multer::parse_boundary(content_type).map_err(|_| {
        WaypointError::unknown("Failed to parse body as FormData: missing or invalid boundary")
    })?;

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut fields = Map::new();
    let mut count = 0;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        count += 1;
        if count > DEFAULT_MAX_FIELDS {
            return Err(WaypointError::unknown(format!(
                "Failed to parse body as FormData: too many fields (max {DEFAULT_MAX_FIELDS})"
            )));
        }

        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if let Some(filename) = field.file_name().map(str::to_owned) {
            let content_type = field
                .content_type()
                .map_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string(), ToString::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;
            fields.insert(name, file_value(&filename, &content_type, &data));
            continue;
        }

        let text = field.text().await.map_err(multipart_error)?;
        match purify(&text) {
            Some(value) => {
                fields.insert(name, value);
            }
            None => {
                fields.remove(&name);
            }
        }
    }

    Ok(fields)
}

/// The JSON form of an uploaded file.
#[must_use]
pub fn file_value(filename: &str, content_type: &str, data: &[u8]) -> Value {
    json!({
        "filename": filename,
        "contentType": content_type,
        "size": data.len(),
        "data": STANDARD.encode(data),
    })
}

fn multipart_error(err: multer::Error) -> WaypointError {
    WaypointError::unknown(format!("Failed to parse body as FormData: {err}"))
}
