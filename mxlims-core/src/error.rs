//! Error types for MXLIMS record handling

use crate::{EntityId, MxlimsType};
use std::fmt;
use thiserror::Error;

/// Category of a single validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    MissingField,
    OutOfRange,
    WrongType,
    InvalidEnumMember,
    ImmutableField,
    UnknownField,
    UnknownVariant,
    MissingDiscriminator,
    DisallowedTarget,
    CircularContainment,
    InvalidValue,
}

/// A single field-level validation failure.
///
/// `field` is a dotted path relative to the record being validated,
/// e.g. `results[0].transmission`. `$` stands for the record itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Value {value} for {field} is out of range: must be {bound}")]
    OutOfRange {
        field: String,
        value: String,
        bound: String,
    },

    #[error("Wrong type for {field}: {reason}")]
    WrongType { field: String, reason: String },

    #[error("Invalid enumeration member for {field}: {reason}")]
    InvalidEnumMember { field: String, reason: String },

    #[error("Field {field} is immutable")]
    ImmutableField { field: String },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    #[error("Unknown variant for {field}: {reason}")]
    UnknownVariant { field: String, reason: String },

    #[error("Missing discriminator for {field}: {reason}")]
    MissingDiscriminator { field: String, reason: String },

    #[error("Disallowed reference target for {field}: {reason}")]
    DisallowedTarget { field: String, reason: String },

    #[error("Circular containment detected in {field}: {id} contains itself")]
    CircularContainment { field: String, id: EntityId },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    /// The category of this failure.
    pub fn kind(&self) -> ViolationKind {
        match self {
            ValidationError::MissingField { .. } => ViolationKind::MissingField,
            ValidationError::OutOfRange { .. } => ViolationKind::OutOfRange,
            ValidationError::WrongType { .. } => ViolationKind::WrongType,
            ValidationError::InvalidEnumMember { .. } => ViolationKind::InvalidEnumMember,
            ValidationError::ImmutableField { .. } => ViolationKind::ImmutableField,
            ValidationError::UnknownField { .. } => ViolationKind::UnknownField,
            ValidationError::UnknownVariant { .. } => ViolationKind::UnknownVariant,
            ValidationError::MissingDiscriminator { .. } => ViolationKind::MissingDiscriminator,
            ValidationError::DisallowedTarget { .. } => ViolationKind::DisallowedTarget,
            ValidationError::CircularContainment { .. } => ViolationKind::CircularContainment,
            ValidationError::InvalidValue { .. } => ViolationKind::InvalidValue,
        }
    }

    /// Field path the failure refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::WrongType { field, .. }
            | ValidationError::InvalidEnumMember { field, .. }
            | ValidationError::ImmutableField { field }
            | ValidationError::UnknownField { field }
            | ValidationError::UnknownVariant { field, .. }
            | ValidationError::MissingDiscriminator { field, .. }
            | ValidationError::DisallowedTarget { field, .. }
            | ValidationError::CircularContainment { field, .. }
            | ValidationError::InvalidValue { field, .. } => field,
        }
    }
}

/// Every violation found while validating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    /// Name of the record type that was rejected.
    pub record: String,
    /// All violations, in discovery order. Never empty.
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new(record: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            record: record.into(),
            errors,
        }
    }

    pub fn single(record: impl Into<String>, error: ValidationError) -> Self {
        Self::new(record, vec![error])
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if any violation has the given kind.
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.errors.iter().any(|e| e.kind() == kind)
    }

    /// Check if any violation of the given kind refers to `field`.
    pub fn has(&self, field: &str, kind: ViolationKind) -> bool {
        self.errors
            .iter()
            .any(|e| e.kind() == kind && e.field() == field)
    }

    /// Violations referring to `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field() == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed validation with {} violation(s)",
            self.record,
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures while resolving a discriminated union member.
///
/// The message prefixes are stable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscriminatorError {
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: String },

    #[error("missing discriminator: neither mxlims_type nor target_type present, expected one of {expected:?}")]
    Missing { expected: Vec<MxlimsType> },

    #[error("unknown discriminator `{tag}`, expected one of {expected:?}")]
    Unknown {
        tag: String,
        expected: Vec<MxlimsType>,
    },

    #[error("disallowed reference target {target}, expected one of {expected:?}")]
    DisallowedTarget {
        target: MxlimsType,
        expected: Vec<MxlimsType>,
    },
}

/// Master error type for MXLIMS record operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MxlimsError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Discriminator error: {0}")]
    Discriminator(#[from] DiscriminatorError),

    #[error("JSON error: {0}")]
    Json(String),
}

impl MxlimsError {
    /// The validation report, if this is a validation failure.
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            MxlimsError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MxlimsError {
    fn from(err: serde_json::Error) -> Self {
        MxlimsError::Json(err.to_string())
    }
}

/// Result type alias for MXLIMS operations.
pub type MxlimsResult<T> = Result<T, MxlimsError>;

// =============================================================================
// TESTS
// =============================================================================
