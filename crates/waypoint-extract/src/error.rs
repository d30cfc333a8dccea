//! Registration-time errors.
//!
//! Problems found while a parameter list is being built. They describe a
//! mistake in how a route was declared, so they surface when the module is
//! loaded and never during dispatch.

use thiserror::Error;

/// An invalid parameter list.
///
/// # Example
///
/// ```rust
/// use waypoint_extract::{ParamList, ParamListError, ParamSource};
///
/// let err = ParamList::indexed([(0, ParamSource::Body), (0, ParamSource::Query)]).unwrap_err();
/// assert_eq!(err, ParamListError::DuplicateIndex { index: 0 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamListError {
    /// Two sources claim the same argument position.
    #[error("argument index {index} is declared more than once")]
    DuplicateIndex {
        /// The repeated index.
        index: usize,
    },

    /// The indices skip a position.
    #[error("argument index {index} is missing; indices must be dense from 0")]
    MissingIndex {
        /// The first absent index.
        index: usize,
    },

    /// A single-parameter source names no parameter.
    #[error("parameter source at index {index} has an empty name")]
    EmptyParamName {
        /// The offending index.
        index: usize,
    },
}
