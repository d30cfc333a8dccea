//! Declarative value schemas.
//!
//! A [`Schema`] describes the expected shape of a JSON value. Route hooks
//! attach schemas to the body, query, path parameters, headers, cookies
//! and form data of a request; the argument resolver runs
//! [`Schema::parse`] on the extracted value before the handler sees it.
//!
//! Parsing is not just a yes/no check:
//!
//! - every failing field is reported, not only the first one
//! - defaults are filled in for absent fields
//! - unknown object keys are stripped from the output
//! - `coerce()` schemas convert strings into numbers and booleans
//!
//! Fields are optional unless marked with [`Schema::required`].
//!
//! # Example
//!
//! ```
//! use waypoint_core::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::object([
//!     ("name", Schema::string().min_length(3).required()),
//!     ("age", Schema::integer().with_default(json!(18))),
//! ]);
//!
//! let parsed = schema.parse(&json!({"name": "Ada", "extra": true})).unwrap();
//! assert_eq!(parsed, json!({"name": "Ada", "age": 18}));
//!
//! let err = schema.parse(&json!({"name": "Al"})).unwrap_err();
//! assert_eq!(err.issues()[0].path_string(), "name");
//! ```

use indexmap::IndexMap;
use regex::Regex;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;

/// One step in the location of a validation issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// Classification of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// The value has the wrong type or is missing.
    InvalidType,
    /// Below a minimum (length, value or item count).
    TooSmall,
    /// Above a maximum (length, value or item count).
    TooBig,
    /// A string failed a format check (email, pattern).
    InvalidString,
    /// Anything else.
    Custom,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Classification of the failure.
    pub code: IssueCode,
    /// Location of the failing value, empty for the root.
    pub path: Vec<PathSegment>,
    /// Human-readable message.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(code: IssueCode, path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            code,
            path,
            message: message.into(),
        }
    }

    /// The path joined with `.`, e.g. `items.0.name`.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// The set of issues produced by a failed [`Schema::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (idx, issue) in self.issues.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            if issue.path.is_empty() {
                write!(f, "{sep}{}", issue.message)?;
            } else {
                write!(f, "{sep}{}: {}", issue.path_string(), issue.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    /// Wraps a list of issues.
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// A single issue at the root.
    pub fn single(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(code, Vec::new(), message)])
    }

    /// The issues, in discovery order.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Consumes the error, returning the issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }
}

/// A regular expression compiled once, when the schema is built.
///
/// Compares and serializes as its source text. A source that does not
/// compile is kept so that every parse reports it.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Option<Regex>,
}

impl Pattern {
    fn new(source: String) -> Self {
        let compiled = Regex::new(&source).ok();
        Self { source, compiled }
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the expression compiled.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.compiled.is_some()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

/// A string that should have been a number but did not parse as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NotANumber;

/// The type-specific part of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaKind {
    /// A string.
    String {
        /// Minimum length in characters.
        #[serde(skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        /// Regular expression the whole string must satisfy.
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<Pattern>,
        /// Whether the string must look like an email address.
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        email: bool,
    },
    /// A whole number.
    Integer {
        /// Inclusive lower bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Inclusive upper bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// Any number.
    Number {
        /// Inclusive lower bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Inclusive upper bound.
        #[serde(skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// `true` or `false`.
    Boolean,
    /// A homogeneous array.
    Array {
        /// Schema applied to every item.
        items: Box<Schema>,
        /// Minimum item count.
        #[serde(skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum item count.
        #[serde(skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// An object with known properties. Unknown keys are stripped.
    Object {
        /// Property schemas in declaration order.
        properties: IndexMap<String, Schema>,
    },
    /// Accepts anything.
    Any,
    /// Only `null`.
    Null,
}

/// A value schema.
///
/// Built with the constructor functions ([`Schema::string`],
/// [`Schema::object`], ...) and refined with chained modifiers.
/// Modifiers that do not apply to the schema's kind are ignored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(flatten)]
    kind: SchemaKind,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    coerce: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
            default: None,
            coerce: false,
            description: None,
        }
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String {
            min_length: None,
            max_length: None,
            pattern: None,
            email: false,
        })
    }

    /// An integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// A number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaKind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// An array schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self::of(SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// An object schema from `(name, schema)` pairs.
    pub fn object<'a, I>(properties: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Schema)>,
    {
        Self::of(SchemaKind::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.to_string(), schema))
                .collect(),
        })
    }

    /// A schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// A schema accepting only `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    /// Marks the value as required. A missing value fails with `Required`;
    /// an explicit `null` fails the type check like any other wrong type.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Value substituted when the input is absent.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Converts string inputs before type checking.
    ///
    /// Number and integer schemas parse the string; boolean schemas accept
    /// `"true"`/`"1"` and `"false"`/`"0"`; string schemas stringify numbers
    /// and booleans.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Attaches a description for documentation.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Minimum string length, in characters.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        if let SchemaKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(len);
        }
        self
    }

    /// Maximum string length, in characters.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        if let SchemaKind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(len);
        }
        self
    }

    /// Regular expression the string must match.
    #[must_use]
    pub fn pattern(mut self, regex: impl Into<String>) -> Self {
        if let SchemaKind::String { pattern, .. } = &mut self.kind {
            *pattern = Some(Pattern::new(regex.into()));
        }
        self
    }

    /// Requires an email-shaped string.
    #[must_use]
    pub fn email(mut self) -> Self {
        if let SchemaKind::String { email, .. } = &mut self.kind {
            *email = true;
        }
        self
    }

    /// Inclusive lower bound for numbers and integers.
    #[must_use]
    pub fn minimum(mut self, min: f64) -> Self {
        if let SchemaKind::Integer { minimum, .. } | SchemaKind::Number { minimum, .. } =
            &mut self.kind
        {
            *minimum = Some(min);
        }
        self
    }

    /// Inclusive upper bound for numbers and integers.
    #[must_use]
    pub fn maximum(mut self, max: f64) -> Self {
        if let SchemaKind::Integer { maximum, .. } | SchemaKind::Number { maximum, .. } =
            &mut self.kind
        {
            *maximum = Some(max);
        }
        self
    }

    /// Minimum array length.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let SchemaKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Maximum array length.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let SchemaKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// The type-specific part of the schema.
    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Whether the value is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The documentation description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Property schemas if this is an object schema.
    #[must_use]
    pub fn properties(&self) -> Option<&IndexMap<String, Schema>> {
        match &self.kind {
            SchemaKind::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Validates `value`, returning the normalized output.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint_core::Schema;
    /// use serde_json::json;
    ///
    /// let schema = Schema::number().coerce();
    /// assert_eq!(schema.parse(&json!("42")).unwrap(), json!(42.0));
    /// assert!(schema.parse(&json!("abc")).is_err());
    /// ```
    pub fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut path = Vec::new();
        let mut issues = Vec::new();
        let output = self.check(Some(value), &mut path, &mut issues);

        if issues.is_empty() {
            Ok(output.unwrap_or(Value::Null))
        } else {
            Err(ValidationError::new(issues))
        }
    }

    fn check(
        &self,
        value: Option<&Value>,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<ValidationIssue>,
    ) -> Option<Value> {
        let Some(value) = value else {
            if let Some(default) = &self.default {
                return Some(default.clone());
            }
            if self.required {
                issues.push(ValidationIssue::new(
                    IssueCode::InvalidType,
                    path.clone(),
                    "Required",
                ));
            }
            return None;
        };

        let value = if self.coerce {
            match self.coerce_value(value) {
                Ok(value) => value,
                Err(NotANumber) => {
                    issues.push(ValidationIssue::new(
                        IssueCode::InvalidType,
                        path.clone(),
                        "Expected number, received nan",
                    ));
                    return None;
                }
            }
        } else {
            Cow::Borrowed(value)
        };

        let mut fail = |code: IssueCode, message: String| {
            issues.push(ValidationIssue::new(code, path.clone(), message));
        };

        match &self.kind {
            SchemaKind::String {
                min_length,
                max_length,
                pattern,
                email,
            } => {
                let Some(s) = value.as_str() else {
                    fail(IssueCode::InvalidType, type_message("string", &value));
                    return None;
                };
                let len = s.chars().count();
                if let Some(min) = min_length.filter(|min| len < *min) {
                    fail(
                        IssueCode::TooSmall,
                        format!("String must contain at least {min} character(s)"),
                    );
                }
                if let Some(max) = max_length.filter(|max| len > *max) {
                    fail(
                        IssueCode::TooBig,
                        format!("String must contain at most {max} character(s)"),
                    );
                }
                if *email && !looks_like_email(s) {
                    fail(IssueCode::InvalidString, "Invalid email".to_string());
                }
                if let Some(pattern) = pattern {
                    match &pattern.compiled {
                        Some(re) if re.is_match(s) => {}
                        Some(_) => fail(IssueCode::InvalidString, "Invalid".to_string()),
                        None => fail(
                            IssueCode::Custom,
                            format!("Invalid regular expression: {}", pattern.source),
                        ),
                    }
                }
                Some(value.into_owned())
            }

            SchemaKind::Integer { minimum, maximum } | SchemaKind::Number { minimum, maximum } => {
                let integer = matches!(self.kind, SchemaKind::Integer { .. });
                let Some(n) = value.as_f64() else {
                    fail(IssueCode::InvalidType, type_message("number", &value));
                    return None;
                };
                if integer && n.fract() != 0.0 {
                    fail(
                        IssueCode::InvalidType,
                        "Expected integer, received float".to_string(),
                    );
                }
                if let Some(min) = minimum.filter(|min| n < *min) {
                    fail(
                        IssueCode::TooSmall,
                        format!("Number must be greater than or equal to {min}"),
                    );
                }
                if let Some(max) = maximum.filter(|max| n > *max) {
                    fail(
                        IssueCode::TooBig,
                        format!("Number must be less than or equal to {max}"),
                    );
                }
                Some(value.into_owned())
            }

            SchemaKind::Boolean => {
                if value.is_boolean() {
                    Some(value.into_owned())
                } else {
                    fail(IssueCode::InvalidType, type_message("boolean", &value));
                    None
                }
            }

            SchemaKind::Null => {
                if value.is_null() {
                    Some(Value::Null)
                } else {
                    fail(IssueCode::InvalidType, type_message("null", &value));
                    None
                }
            }

            SchemaKind::Any => Some(value.into_owned()),

            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(arr) = value.as_array() else {
                    fail(IssueCode::InvalidType, type_message("array", &value));
                    return None;
                };
                if let Some(min) = min_items.filter(|min| arr.len() < *min) {
                    fail(
                        IssueCode::TooSmall,
                        format!("Array must contain at least {min} element(s)"),
                    );
                }
                if let Some(max) = max_items.filter(|max| arr.len() > *max) {
                    fail(
                        IssueCode::TooBig,
                        format!("Array must contain at most {max} element(s)"),
                    );
                }

                let mut out = Vec::with_capacity(arr.len());
                for (idx, item) in arr.iter().enumerate() {
                    path.push(PathSegment::Index(idx));
                    out.push(items.check(Some(item), path, issues).unwrap_or(Value::Null));
                    path.pop();
                }
                Some(Value::Array(out))
            }

            SchemaKind::Object { properties } => {
                let Some(obj) = value.as_object() else {
                    fail(IssueCode::InvalidType, type_message("object", &value));
                    return None;
                };

                let mut out = Map::new();
                for (name, schema) in properties {
                    path.push(PathSegment::Key(name.clone()));
                    if let Some(v) = schema.check(obj.get(name), path, issues) {
                        out.insert(name.clone(), v);
                    }
                    path.pop();
                }
                Some(Value::Object(out))
            }
        }
    }

    fn coerce_float<'v>(s: &str) -> Result<Cow<'v, Value>, NotANumber> {
        s.trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(|n| Cow::Owned(Value::Number(n)))
            .ok_or(NotANumber)
    }

    fn coerce_value<'v>(&self, value: &'v Value) -> Result<Cow<'v, Value>, NotANumber> {
        let coerced = match (&self.kind, value) {
            (SchemaKind::Integer { .. }, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => Cow::Owned(Value::Number(n.into())),
                Err(_) => return Self::coerce_float(s),
            },
            (SchemaKind::Number { .. }, Value::String(s)) => return Self::coerce_float(s),
            (SchemaKind::Boolean, Value::String(s)) => match s.as_str() {
                "true" | "1" => Cow::Owned(Value::Bool(true)),
                "false" | "0" => Cow::Owned(Value::Bool(false)),
                _ => Cow::Borrowed(value),
            },
            (SchemaKind::String { .. }, Value::Number(n)) => Cow::Owned(Value::String(n.to_string())),
            (SchemaKind::String { .. }, Value::Bool(b)) => Cow::Owned(Value::String(b.to_string())),
            _ => Cow::Borrowed(value),
        };
        Ok(coerced)
    }
}

fn type_message(expected: &str, value: &Value) -> String {
    format!("Expected {expected}, received {}", value_type_name(value))
}

/// Returns a short name for the JSON type of `value`.
#[must_use]
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
