//! The argument resolver.
//!
//! Loaders run one after another in argument order. The body can only be
//! read once, so a later loader may depend on what an earlier one consumed.

use serde::de::DeserializeOwned;
use serde_json::Value;
use waypoint_core::{Hook, IncomingRequest, WaypointError};
use waypoint_router::Params;

use crate::loaders::{load_body, load_cookies, load_headers, load_param, load_params, load_query};
use crate::source::{ParamList, ParamSource};

/// One resolved handler argument.
#[derive(Debug, Clone)]
pub enum Argument {
    /// A loaded value.
    Value(Value),
    /// The request itself.
    Request(IncomingRequest),
    /// The loader produced nothing (no body, missing parameter).
    Absent,
}

impl Argument {
    fn from_option(value: Option<Value>) -> Self {
        value.map_or(Self::Absent, Self::Value)
    }
}

/// The dense, ordered arguments for one handler call.
///
/// # Example
///
/// ```rust
/// use waypoint_extract::{Argument, Arguments};
/// use serde_json::json;
///
/// let args = Arguments::from(vec![Argument::Value(json!({"page": 2})), Argument::Absent]);
/// let page: serde_json::Value = args.json(0).unwrap();
/// assert_eq!(page["page"], 2);
/// assert_eq!(args.json::<Option<String>>(1).unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Argument>,
}

impl Arguments {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The argument at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.values.get(index)
    }

    /// The JSON value at `index`, if it is one.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        match self.values.get(index) {
            Some(Argument::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The request, if the argument at `index` is the request.
    #[must_use]
    pub fn request(&self, index: usize) -> Option<&IncomingRequest> {
        match self.values.get(index) {
            Some(Argument::Request(request)) => Some(request),
            _ => None,
        }
    }

    /// Deserializes the argument at `index`.
    ///
    /// Absent arguments deserialize from `null`, so `Option<T>` targets
    /// receive `None`.
    pub fn json<T: DeserializeOwned>(&self, index: usize) -> Result<T, WaypointError> {
        match self.values.get(index) {
            Some(Argument::Value(value)) => Ok(T::deserialize(value)?),
            Some(Argument::Absent) => Ok(serde_json::from_value(Value::Null)?),
            Some(Argument::Request(_)) => Err(WaypointError::unknown(format!(
                "argument {index} is the request, not a value"
            ))),
            None => Err(WaypointError::unknown(format!(
                "argument {index} is out of range ({} resolved)",
                self.values.len()
            ))),
        }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates the arguments in order.
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.values.iter()
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(values: Vec<Argument>) -> Self {
        Self { values }
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Resolves every argument in `list`, in order.
///
/// The first failing loader aborts resolution with its error.
pub async fn resolve_args(
    request: &IncomingRequest,
    params: &Params,
    hook: &Hook,
    list: &ParamList,
) -> Result<Arguments, WaypointError> {
    let mut values = Vec::with_capacity(list.len());

    for source in list.iter() {
        let argument = match source {
            ParamSource::Body => Argument::from_option(load_body(request, hook).await?),
            ParamSource::Query => Argument::Value(load_query(request, hook)?),
            ParamSource::Param(name) => Argument::from_option(load_param(name, params, hook)?),
            ParamSource::Params => Argument::Value(load_params(params, hook)?),
            ParamSource::Headers => Argument::Value(load_headers(request, hook)?),
            ParamSource::Cookies => Argument::Value(load_cookies(request, hook)?),
            ParamSource::Request => Argument::Request(request.clone()),
            ParamSource::Custom(loader) => Argument::from_option(loader(request, hook, params).await?),
        };
        values.push(argument);
    }

    Ok(Arguments { values })
}
