//! Coercion of form field strings.
//!
//! Form and multipart bodies carry every field as text. Before the form
//! schema sees them, each value is converted to the most specific JSON type
//! it looks like, trying in order:
//!
//! 1. `"undefined"` drops the field
//! 2. `"true"` and `"false"` become booleans
//! 3. strings of digits, `.`, `,`, `e` and `|` that parse as a finite number become numbers
//! 4. dates (`RFC 3339` or `YYYY-MM-DD`) become RFC 3339 UTC timestamps
//! 5. everything else stays a string

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};

/// Converts one form field, `None` meaning the field is dropped.
///
/// ```
/// use waypoint_extract::purify;
/// use serde_json::json;
///
/// assert_eq!(purify("true"), Some(json!(true)));
/// assert_eq!(purify("1e3"), Some(json!(1000)));
/// assert_eq!(purify("2024-01-15"), Some(json!("2024-01-15T00:00:00.000Z")));
/// assert_eq!(purify("hello"), Some(json!("hello")));
/// assert_eq!(purify("undefined"), None);
/// ```
#[must_use]
pub fn purify(input: &str) -> Option<Value> {
    match input {
        "undefined" => return None,
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    if let Some(number) = as_number(input) {
        return Some(number);
    }

    if let Some(date) = as_date(input) {
        return Some(Value::String(date));
    }

    Some(Value::String(input.to_owned()))
}

#[allow(clippy::cast_possible_truncation)]
fn as_number(input: &str) -> Option<Value> {
    let numeric_chars = !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | 'e' | '|'));
    if !numeric_chars {
        return None;
    }

    let parsed: f64 = input.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }

    if parsed.fract() == 0.0 && parsed.abs() < 9_007_199_254_740_992.0 {
        return Some(Value::Number(Number::from(parsed as i64)));
    }
    Number::from_f64(parsed).map(Value::Number)
}

fn as_date(input: &str) -> Option<String> {
    let instant = if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        parsed.with_timezone(&Utc)
    } else {
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
    };
    Some(instant.to_rfc3339_opts(SecondsFormat::Millis, true))
}
