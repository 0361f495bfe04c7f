//! Record traits shared by every MXLIMS type
//!
//! [`MxlimsRecord`] is the JSON codec and validation contract for all records,
//! entities and value types alike. [`MxlimsObject`] adds identity and extension
//! points for entities, and [`DatasetRecord`]/[`JobRecord`] expose the fields
//! every Dataset and Job specialization shares.

use crate::error::{MxlimsError, MxlimsResult, ValidationError, ValidationErrors};
use crate::validation::Validator;
use crate::{
    EntityId, Extensions, JobStatus, MxlimsRef, MxlimsType, NamespaceExtensions, Timestamp,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// JSON codec and validation contract for MXLIMS records.
pub trait MxlimsRecord: Serialize + DeserializeOwned {
    /// Record name used in error reports and schema titles.
    const RECORD_NAME: &'static str;

    /// JSON fields that must be present on input.
    const REQUIRED_FIELDS: &'static [&'static str] = &[];

    /// Fields that may only be set at construction.
    const FROZEN_FIELDS: &'static [&'static str] = &[];

    /// Collect every constraint violation into `v`.
    fn check(&self, v: &mut Validator);

    /// Check every constraint, reporting all violations.
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new(Self::RECORD_NAME);
        self.check(&mut v);
        v.finish()
    }

    /// Validate and return `self`.
    fn validated(self) -> MxlimsResult<Self> {
        self.validate()?;
        Ok(self)
    }

    /// Check the JSON type of every field present in `object`.
    fn check_fields(v: &mut Validator, object: &Map<String, Value>);

    /// Structural check of a JSON object: absent required fields, then the
    /// type of every field present.
    fn check_object(v: &mut Validator, object: &Map<String, Value>) {
        for field in Self::REQUIRED_FIELDS {
            if !object.contains_key(*field) {
                v.missing(field);
            }
        }
        Self::check_fields(v, object);
    }

    /// Decode and validate a record from a JSON value.
    ///
    /// The object is first checked structurally, reporting every missing
    /// field, wrong type and malformed collection member with its path.
    /// Constraints are then checked on every field that decoded, so one
    /// rejection lists all violations found.
    fn from_value(value: Value) -> MxlimsResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(ValidationErrors::single(
                Self::RECORD_NAME,
                ValidationError::WrongType {
                    field: "$".to_string(),
                    reason: format!("expected a JSON object, found {}", json_kind(&value)),
                },
            )
            .into());
        };

        let mut v = Validator::new(Self::RECORD_NAME);
        Self::check_object(&mut v, object);

        if v.error_count() > 0 {
            let failed = v.failed_fields();
            let partial: Map<String, Value> = object
                .iter()
                .filter(|(key, _)| !failed.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if let Ok(record) = serde_json::from_value::<Self>(Value::Object(partial)) {
                record.check(&mut v);
            }
            return Err(v.into_errors().into());
        }

        let record: Self = serde_json::from_value(value).map_err(|err| {
            tracing::debug!(record = Self::RECORD_NAME, error = %err, "record failed to decode");
            ValidationErrors::single(
                Self::RECORD_NAME,
                ValidationError::InvalidValue {
                    field: "$".to_string(),
                    reason: err.to_string(),
                },
            )
        })?;
        record.check(&mut v);
        v.finish()?;
        Ok(record)
    }

    /// Decode and validate a record from JSON text.
    fn from_json(json: &str) -> MxlimsResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    fn to_value(&self) -> MxlimsResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn to_json(&self) -> MxlimsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn to_json_pretty(&self) -> MxlimsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace one field by name.
    ///
    /// Frozen fields are rejected. The updated record is decoded and validated
    /// as a whole and only replaces `self` if that succeeds.
    fn assign(&mut self, field: &str, value: Value) -> MxlimsResult<()> {
        if Self::FROZEN_FIELDS.contains(&field) {
            tracing::debug!(record = Self::RECORD_NAME, field, "rejected frozen field assignment");
            return Err(ValidationErrors::single(
                Self::RECORD_NAME,
                ValidationError::ImmutableField {
                    field: field.to_string(),
                },
            )
            .into());
        }

        let mut current = self.to_value()?;
        let slot = current
            .as_object_mut()
            .and_then(|object| object.get_mut(field))
            .ok_or_else(|| {
                MxlimsError::from(ValidationErrors::single(
                    Self::RECORD_NAME,
                    ValidationError::UnknownField {
                        field: field.to_string(),
                    },
                ))
            })?;
        *slot = value;

        *self = Self::from_value(current)?;
        Ok(())
    }
}

/// Identity and extension points shared by all MXLIMS entities.
pub trait MxlimsObject: MxlimsRecord {
    /// Discriminator value of this entity type.
    const MXLIMS_TYPE: MxlimsType;

    /// Permanent unique identifier.
    fn uuid(&self) -> EntityId;

    fn extensions(&self) -> &Extensions;

    fn extensions_mut(&mut self) -> &mut Extensions;

    fn namespace_extensions(&self) -> &NamespaceExtensions;

    fn namespace_extensions_mut(&mut self) -> &mut NamespaceExtensions;

    /// Decode the extension record registered under `namespace`.
    fn namespace_extension<T: DeserializeOwned>(&self, namespace: &str) -> MxlimsResult<Option<T>> {
        match self.namespace_extensions().get(namespace) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Store an organisation-defined extension record under `namespace`.
    ///
    /// The extension must serialize to a JSON object.
    fn set_namespace_extension<T: Serialize>(
        &mut self,
        namespace: impl Into<String>,
        extension: &T,
    ) -> MxlimsResult<()> {
        let namespace = namespace.into();
        let value = serde_json::to_value(extension)?;
        if !value.is_object() {
            return Err(ValidationErrors::single(
                Self::RECORD_NAME,
                ValidationError::WrongType {
                    field: format!("namespace_extensions.{}", namespace),
                    reason: format!("expected a JSON object, found {}", json_kind(&value)),
                },
            )
            .into());
        }
        self.namespace_extensions_mut().insert(namespace, value);
        Ok(())
    }

    /// A reference to this entity.
    fn reference(&self) -> MxlimsRef {
        MxlimsRef::new(Self::MXLIMS_TYPE, self.uuid())
    }

    /// The Job that produced this entity, for Datasets.
    fn produced_by(&self) -> Option<&MxlimsRef> {
        None
    }
}

/// Fields shared by Dataset and its specializations.
pub trait DatasetRecord: MxlimsObject {
    /// Job that created this Dataset; back-link for `Job.results`.
    fn source(&self) -> Option<&MxlimsRef>;

    /// Role relative to the source Job, e.g. "Result" or "Intermediate".
    fn role(&self) -> Option<&str>;

    /// Overrides the Job's logistical sample.
    fn logistical_sample(&self) -> Option<&MxlimsRef>;

    /// Dataset this one was derived from when there is no source Job.
    fn derived_from_id(&self) -> Option<EntityId>;
}

/// Fields and lifecycle shared by Job and its specializations.
pub trait JobRecord: MxlimsObject {
    /// Union type of the `results` collection.
    type ResultItem: CollectionItem;

    /// Prepared sample acted upon; back-link for `PreparedSample.jobs`.
    fn sample(&self) -> Option<&MxlimsRef>;

    /// Sample location; back-link for `LogisticalSample.jobs`.
    fn logistical_sample(&self) -> Option<&MxlimsRef>;

    fn job_status(&self) -> Option<JobStatus>;

    fn start_time(&self) -> Option<Timestamp>;

    fn end_time(&self) -> Option<Timestamp>;

    fn results(&self) -> &[Self::ResultItem];

    fn set_job_status(&mut self, status: Option<JobStatus>);

    fn set_start_time(&mut self, at: Option<Timestamp>);

    fn set_end_time(&mut self, at: Option<Timestamp>);

    /// Record that the job started at `at`.
    fn mark_running(&mut self, at: Timestamp) {
        self.set_job_status(Some(JobStatus::Running));
        self.set_start_time(Some(at));
    }

    /// Record that the job ended at `at` with a terminal `status`.
    fn mark_finished(&mut self, status: JobStatus, at: Timestamp) -> MxlimsResult<()> {
        if !status.is_terminal() {
            return Err(ValidationErrors::single(
                Self::RECORD_NAME,
                ValidationError::InvalidValue {
                    field: "job_status".to_string(),
                    reason: format!("{} is not a terminal status", status),
                },
            )
            .into());
        }
        self.set_job_status(Some(status));
        self.set_end_time(Some(at));
        Ok(())
    }

    /// Embedded results whose `source` names a different record.
    ///
    /// Back-links are maintained by whoever builds the record graph; this
    /// reports where they disagree with this job.
    fn result_source_mismatches(&self) -> Vec<EntityId> {
        let own = self.reference();
        self.results()
            .iter()
            .filter_map(|item| match item.embedded_source() {
                Some(source) if *source != own => Some(item.uuid()),
                _ => None,
            })
            .collect()
    }
}

/// Members of a collection field: an embedded record or a reference.
pub trait CollectionItem {
    /// Types this union may embed or reference.
    const ALLOWED: &'static [MxlimsType];

    /// Identifier of the embedded or referenced record.
    fn uuid(&self) -> EntityId;

    /// Type of the embedded or referenced record.
    fn target_type(&self) -> MxlimsType;

    /// The reference, if this member is one.
    fn as_reference(&self) -> Option<&MxlimsRef>;

    /// A reference to this member, embedded or not.
    fn to_reference(&self) -> MxlimsRef {
        MxlimsRef::new(self.target_type(), self.uuid())
    }

    fn is_reference(&self) -> bool {
        self.as_reference().is_some()
    }

    /// Validate the member in place.
    fn check(&self, v: &mut Validator);

    /// `source` of an embedded Dataset member.
    fn embedded_source(&self) -> Option<&MxlimsRef>;
}

/// Validate every member of a collection field.
pub fn check_items<I: CollectionItem>(v: &mut Validator, field: &str, items: &[I]) {
    for (index, item) in items.iter().enumerate() {
        v.nested(field, Some(index), |v| item.check(v));
    }
}

/// Validate every record of a list of value records.
pub fn check_records<R: MxlimsRecord>(v: &mut Validator, field: &str, records: &[R]) {
    for (index, record) in records.iter().enumerate() {
        v.nested(field, Some(index), |v| record.check(v));
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// IMPL MACROS
// =============================================================================

/// Implement [`MxlimsObject`] (and [`DatasetRecord`] for `dataset`) for an
/// entity with `uuid`, `extensions` and `namespace_extensions` fields.
macro_rules! impl_mxlims_object {
    (@object $ty:ty, $kind:expr, { $($extra:tt)* }) => {
        impl $crate::record::MxlimsObject for $ty {
            const MXLIMS_TYPE: $crate::MxlimsType = $kind;

            fn uuid(&self) -> $crate::EntityId {
                self.uuid
            }

            fn extensions(&self) -> &$crate::Extensions {
                &self.extensions
            }

            fn extensions_mut(&mut self) -> &mut $crate::Extensions {
                &mut self.extensions
            }

            fn namespace_extensions(&self) -> &$crate::NamespaceExtensions {
                &self.namespace_extensions
            }

            fn namespace_extensions_mut(&mut self) -> &mut $crate::NamespaceExtensions {
                &mut self.namespace_extensions
            }

            $($extra)*
        }

        impl $ty {
            /// Replace the generated identifier.
            pub fn with_uuid(mut self, uuid: $crate::EntityId) -> Self {
                self.uuid = uuid;
                self
            }
        }
    };
    ($ty:ty, $kind:expr, dataset) => {
        $crate::record::impl_mxlims_object!(@object $ty, $kind, {
            fn produced_by(&self) -> Option<&$crate::MxlimsRef> {
                self.source.as_ref()
            }
        });

        impl $crate::record::DatasetRecord for $ty {
            fn source(&self) -> Option<&$crate::MxlimsRef> {
                self.source.as_ref()
            }

            fn role(&self) -> Option<&str> {
                self.role.as_deref()
            }

            fn logistical_sample(&self) -> Option<&$crate::MxlimsRef> {
                self.logistical_sample.as_ref()
            }

            fn derived_from_id(&self) -> Option<$crate::EntityId> {
                self.derived_from_id
            }
        }

        impl $ty {
            pub fn with_source(mut self, source: $crate::MxlimsRef) -> Self {
                self.source = Some(source);
                self
            }

            pub fn with_role(mut self, role: impl Into<String>) -> Self {
                self.role = Some(role.into());
                self
            }

            pub fn with_logistical_sample(mut self, logistical_sample: $crate::MxlimsRef) -> Self {
                self.logistical_sample = Some(logistical_sample);
                self
            }

            pub fn with_derived_from_id(mut self, derived_from_id: $crate::EntityId) -> Self {
                self.derived_from_id = Some(derived_from_id);
                self
            }
        }
    };
    ($ty:ty, $kind:expr) => {
        $crate::record::impl_mxlims_object!(@object $ty, $kind, {});
    };
}

/// Implement [`JobRecord`] for a Job type whose `results` hold `$item`.
macro_rules! impl_job_record {
    ($ty:ty, $item:ty) => {
        impl $crate::record::JobRecord for $ty {
            type ResultItem = $item;

            fn sample(&self) -> Option<&$crate::MxlimsRef> {
                self.sample.as_ref()
            }

            fn logistical_sample(&self) -> Option<&$crate::MxlimsRef> {
                self.logistical_sample.as_ref()
            }

            fn job_status(&self) -> Option<$crate::JobStatus> {
                self.job_status
            }

            fn start_time(&self) -> Option<$crate::Timestamp> {
                self.start_time
            }

            fn end_time(&self) -> Option<$crate::Timestamp> {
                self.end_time
            }

            fn results(&self) -> &[$item] {
                &self.results
            }

            fn set_job_status(&mut self, status: Option<$crate::JobStatus>) {
                self.job_status = status;
            }

            fn set_start_time(&mut self, at: Option<$crate::Timestamp>) {
                self.start_time = at;
            }

            fn set_end_time(&mut self, at: Option<$crate::Timestamp>) {
                self.end_time = at;
            }
        }

        impl $ty {
            pub fn with_sample(mut self, sample: $crate::MxlimsRef) -> Self {
                self.sample = Some(sample);
                self
            }

            pub fn with_logistical_sample(mut self, logistical_sample: $crate::MxlimsRef) -> Self {
                self.logistical_sample = Some(logistical_sample);
                self
            }
        }
    };
}

pub(crate) use impl_job_record;
pub(crate) use impl_mxlims_object;
