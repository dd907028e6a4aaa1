//! Validation error type shared by every kernel crate.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant via `#[from]`, so a validation failure raised deep inside a
//! container keeps its kind all the way up to the run loop.

use thiserror::Error;

use crate::{AgentIndex, Equality, PropertyId, PropertyValue, ValueType};

/// Validation and lookup errors raised at the call that breaks a
/// precondition.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("property {0} is not defined")]
    UnknownProperty(PropertyId),

    #[error("value {got:?} is incompatible with type {expected}")]
    IncompatibleValue { expected: ValueType, got: PropertyValue },

    #[error("operator {op} needs ordered values but type {value_type} is not comparable")]
    NonComparable { op: Equality, value_type: ValueType },

    #[error("{0} is not a valid agent index")]
    InvalidIndex(AgentIndex),

    #[error("property definition error: {0}")]
    Definition(String),
}

/// Shorthand result type for validation in `abm-*` crates.
pub type CoreResult<T> = Result<T, CoreError>;
