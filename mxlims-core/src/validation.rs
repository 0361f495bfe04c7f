//! Constraint checking for MXLIMS records
//!
//! A [`Validator`] walks one record (and every record embedded in it) and
//! collects all violations with a dotted path to the offending field, so a
//! rejected record reports everything that is wrong with it at once.

use crate::error::{DiscriminatorError, ValidationError, ValidationErrors};
use crate::shape::Shape;
use crate::{EntityId, MxlimsRef, MxlimsType, NamespaceExtensions};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Allowed targets for relationships to a PreparedSample.
pub const PREPARED_SAMPLE_TARGETS: &[MxlimsType] =
    &[MxlimsType::PreparedSample, MxlimsType::MXSample];

/// Allowed targets for relationships to a LogisticalSample.
pub const LOGISTICAL_SAMPLE_TARGETS: &[MxlimsType] = &[MxlimsType::LogisticalSample];

/// Allowed targets for relationships to a Job.
pub const JOB_TARGETS: &[MxlimsType] = &[
    MxlimsType::Job,
    MxlimsType::MXExperiment,
    MxlimsType::MXProcessing,
];

/// Allowed targets for relationships to an MXSample.
pub const MX_SAMPLE_TARGETS: &[MxlimsType] = &[MxlimsType::MXSample];

/// Accumulates violations while checking a record tree.
#[derive(Debug)]
pub struct Validator {
    record: &'static str,
    path: Vec<String>,
    errors: Vec<ValidationError>,
    containment: Vec<EntityId>,
}

impl Validator {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            path: Vec::new(),
            errors: Vec::new(),
            containment: Vec::new(),
        }
    }

    /// Full dotted path for `field` at the current nesting level.
    pub fn path_for(&self, field: &str) -> String {
        match (self.path.is_empty(), field.is_empty()) {
            (true, _) => field.to_string(),
            (false, true) => self.path.join("."),
            (false, false) => format!("{}.{}", self.path.join("."), field),
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn missing(&mut self, field: &str) {
        let field = self.path_for(field);
        self.push(ValidationError::MissingField { field });
    }

    pub fn invalid(&mut self, field: &str, reason: impl Into<String>) {
        let field = self.path_for(field);
        self.push(ValidationError::InvalidValue {
            field,
            reason: reason.into(),
        });
    }

    pub fn wrong_type(&mut self, field: &str, reason: impl Into<String>) {
        let field = self.path_for(field);
        self.push(ValidationError::WrongType {
            field,
            reason: reason.into(),
        });
    }

    pub fn invalid_member(&mut self, field: &str, reason: impl Into<String>) {
        let field = self.path_for(field);
        self.push(ValidationError::InvalidEnumMember {
            field,
            reason: reason.into(),
        });
    }

    /// Record a collection member whose tag could not be resolved.
    pub fn discriminator(&mut self, field: &str, err: &DiscriminatorError) {
        let field = self.path_for(field);
        let reason = err.to_string();
        self.push(match err {
            DiscriminatorError::NotAnObject { .. } => ValidationError::WrongType { field, reason },
            DiscriminatorError::Missing { .. } => {
                ValidationError::MissingDiscriminator { field, reason }
            }
            DiscriminatorError::Unknown { .. } => ValidationError::UnknownVariant { field, reason },
            DiscriminatorError::DisallowedTarget { .. } => {
                ValidationError::DisallowedTarget { field, reason }
            }
        });
    }

    /// Check field `name` of `object` against `T`, if present.
    pub fn field<T: Shape>(&mut self, object: &Map<String, Value>, name: &str) {
        if let Some(value) = object.get(name) {
            T::check_shape(self, name, value);
        }
    }

    fn out_of_range(&mut self, field: &str, value: impl ToString, bound: String) {
        let field = self.path_for(field);
        self.push(ValidationError::OutOfRange {
            field,
            value: value.to_string(),
            bound,
        });
    }

    /// Inclusive range check; `None` passes.
    pub fn check_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(value) = value {
            if !(min..=max).contains(&value) {
                self.out_of_range(field, value, format!("between {} and {}", min, max));
            }
        }
    }

    /// Exclusive range check; `None` passes.
    pub fn check_open_range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) {
        if let Some(value) = value {
            if !(value > min && value < max) {
                self.out_of_range(field, value, format!("strictly between {} and {}", min, max));
            }
        }
    }

    /// `value >= min`; `None` passes.
    pub fn check_min(&mut self, field: &str, value: Option<f64>, min: f64) {
        if let Some(value) = value {
            if !(value >= min) {
                self.out_of_range(field, value, format!(">= {}", min));
            }
        }
    }

    /// `value > 0`; `None` passes.
    pub fn check_positive(&mut self, field: &str, value: Option<f64>) {
        if let Some(value) = value {
            if !(value > 0.0) {
                self.out_of_range(field, value, "> 0".to_string());
            }
        }
    }

    /// Counts that must be at least one when given.
    pub fn check_positive_count(&mut self, field: &str, value: Option<u32>) {
        if value == Some(0) {
            self.out_of_range(field, 0, "> 0".to_string());
        }
    }

    /// Ordered pair with `low <= high`.
    pub fn check_ordered<T: PartialOrd + ToString>(&mut self, field: &str, pair: &[T; 2]) {
        if pair[0] > pair[1] {
            self.out_of_range(
                field,
                format!("[{}, {}]", pair[0].to_string(), pair[1].to_string()),
                "an ordered [low, high] pair".to_string(),
            );
        }
    }

    pub fn check_non_blank(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.invalid(field, "must not be blank");
        }
    }

    /// Check that a reference targets one of `allowed`; `None` passes.
    pub fn check_target(&mut self, field: &str, reference: Option<&MxlimsRef>, allowed: &[MxlimsType]) {
        if let Some(reference) = reference {
            if !reference.targets_any(allowed) {
                let field = self.path_for(field);
                self.push(ValidationError::DisallowedTarget {
                    field,
                    reason: format!(
                        "{} is not one of {:?}",
                        reference.target_type, allowed
                    ),
                });
            }
        }
    }

    /// Every namespace extension must be a JSON object.
    pub fn check_namespace_extensions(&mut self, extensions: &NamespaceExtensions) {
        for (namespace, value) in extensions {
            if !value.is_object() {
                let field = self.path_for(&format!("namespace_extensions.{}", namespace));
                self.push(ValidationError::WrongType {
                    field,
                    reason: "namespace extension must be a JSON object".to_string(),
                });
            }
        }
    }

    /// Record a containment cycle through `id`.
    pub fn circular(&mut self, field: &str, index: Option<usize>, id: EntityId) {
        let field = self.path_for(&segment(field, index));
        self.push(ValidationError::CircularContainment { field, id });
    }

    /// Run `f` with `field` (optionally indexed) appended to the path.
    pub fn nested<F>(&mut self, field: &str, index: Option<usize>, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.path.push(segment(field, index));
        f(self);
        self.path.pop();
    }

    /// Run `f` with `id` on the containment stack.
    pub fn with_container<F>(&mut self, id: EntityId, f: F)
    where
        F: FnOnce(&mut Self),
    {
        self.containment.push(id);
        f(self);
        self.containment.pop();
    }

    /// Check if `id` encloses the record currently being checked.
    pub fn in_containment_path(&self, id: EntityId) -> bool {
        self.containment.contains(&id)
    }

    /// Top-level fields with at least one violation so far.
    pub fn failed_fields(&self) -> BTreeSet<String> {
        self.errors
            .iter()
            .map(|e| top_level_field(e.field()).to_string())
            .collect()
    }

    /// Consume the validator, returning every collected violation.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.into_errors())
        }
    }

    /// Consume the validator as a rejection of the record.
    pub fn into_errors(self) -> ValidationErrors {
        tracing::debug!(
            record = self.record,
            violations = self.errors.len(),
            "record failed validation"
        );
        ValidationErrors::new(self.record, self.errors)
    }
}

/// First segment of a dotted path: `results` for `results[0].scan_axis`.
fn top_level_field(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or(path)
}

fn segment(field: &str, index: Option<usize>) -> String {
    match index {
        Some(i) => format!("{}[{}]", field, i),
        None => field.to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
