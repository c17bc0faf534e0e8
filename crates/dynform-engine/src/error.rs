//! Error types for the form engine
//!
//! Field-level validation failures are never errors in this sense: they are
//! returned as data inside [`ValidationReport`]. Only schema loading and the
//! submission boundary fail with a `Result`.

use crate::orchestrator::ValidationReport;
use crate::submission::SubmissionError;
use thiserror::Error;

/// Schema could not be loaded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Raw input is not valid JSON
    #[error("malformed schema: {0}")]
    Malformed(String),

    /// Root has no `fields` sequence
    #[error("schema must contain a `fields` array")]
    MissingFields,

    /// A specific field broke a constraint
    #[error("field {index}{}: {violation}", .key.as_ref().map(|k| format!(" ({k})")).unwrap_or_default())]
    Field {
        /// 1-based position in `fields`
        index: usize,
        /// Field key, when it could be read
        key: Option<String>,
        /// Which constraint failed
        violation: SchemaViolation,
    },
}

impl SchemaError {
    pub(crate) fn field(index: usize, key: Option<&str>, violation: SchemaViolation) -> Self {
        Self::Field {
            index,
            key: key.map(str::to_string),
            violation,
        }
    }

    /// 1-based index of the offending field, if the error is field-specific
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Field { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Field { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Violated constraint, if the error is field-specific
    pub fn violation(&self) -> Option<&SchemaViolation> {
        match self {
            Self::Field { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// Constraint a field definition failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaViolation {
    #[error("field definition must be an object")]
    NotAnObject,

    #[error("missing `key`")]
    MissingKey,

    #[error("missing `label`")]
    MissingLabel,

    #[error("missing `field_type`")]
    MissingFieldType,

    #[error("unknown field_type `{0}`")]
    UnknownFieldType(String),

    #[error("`required` must be a boolean")]
    InvalidRequired,

    #[error("`options` must be an array of strings")]
    InvalidOptions,

    #[error("dropdown requires non-empty `options`")]
    MissingOptions,

    #[error("duplicate key `{0}`")]
    DuplicateKey(String),

    #[error("`{0}` must be a string")]
    NotAString(&'static str),

    #[error("invalid conditional_required: {0}")]
    InvalidConditional(String),

    #[error("conditional_required value must be a number or string")]
    InvalidOperand,

    #[error("conditional_required depends on itself")]
    SelfDependency,

    #[error("conditional_required depends on unknown field `{0}`")]
    UnknownDependency(String),

    #[error("invalid validation rules: {0}")]
    InvalidRules(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Submission could not be started or did not complete
#[derive(Error, Debug, Clone)]
pub enum SubmitError {
    /// Another submission for this form is still pending
    #[error("a submission is already in flight")]
    InFlight,

    /// Form has validation errors; the full map is attached
    #[error("form has {} invalid field(s)", .0.invalid_count())]
    Invalid(ValidationReport),

    /// Transport collaborator failed
    #[error(transparent)]
    Transport(#[from] SubmissionError),

    /// Result belongs to a submission the form no longer waits for
    #[error("stale submission result ignored")]
    Stale,

    /// Form instance has been torn down
    #[error("form instance closed")]
    Closed,
}

pub type SchemaResult<T> = Result<T, SchemaError>;
