//! Data reduction calculations

use crate::discriminator::mxlims_tag;
use crate::entities::{check_job_fields, check_job_links, JOB_FROZEN};
use crate::items::{CollectionSweepItem, ReflectionSetItem};
use crate::record::{check_items, impl_job_record, impl_mxlims_object, MxlimsRecord};
use crate::validation::{Validator, MX_SAMPLE_TARGETS};
use crate::values::UnitCell;
use crate::{
    new_entity_id, EntityId, Extensions, JobStatus, MxlimsRef, MxlimsType, NamespaceExtensions,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`MXProcessing`].
    MXProcessingTag => MXProcessing
}

/// MX Crystallographic processing calculation, going from images to reflection sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct MXProcessing {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: MXProcessingTag,
    /// Permanent unique identifier string
    #[serde(default = "new_entity_id")]
    #[cfg_attr(feature = "json-schema", schema(value_type = String, format = "uuid"))]
    uuid: EntityId,
    /// Keyword-value extensions; use is accepted but discouraged
    #[serde(default)]
    #[cfg_attr(feature = "json-schema", schema(value_type = Object))]
    pub extensions: Extensions,
    /// Namespaced extension. Key is an organisation identifier (e.g. 'GPhL'),
    /// value is an extension record defined by this organisation.
    #[serde(default)]
    #[cfg_attr(feature = "json-schema", schema(value_type = Object))]
    pub namespace_extensions: NamespaceExtensions,
    /// MX Crystallographic sample relevant to Job.
    sample: Option<MxlimsRef>,
    /// Logistical Sample or Sample location relevant to Job.
    /// Overridden by Dataset.logistical_sample; return link for LogisticalSample.jobs
    logistical_sample: Option<MxlimsRef>,
    /// Templates with parameters for output datasets
    #[serde(default)]
    pub templates: Vec<ReflectionSetItem>,
    /// List of pre-existing Input data sets used for calculation, or references to them
    #[serde(default)]
    pub input_data: Vec<CollectionSweepItem>,
    /// Reference data sets, e.g. reference mtz file
    #[serde(default)]
    pub reference_data: Vec<ReflectionSetItem>,
    /// Datasets produced by Job (match Dataset.source)
    #[serde(default)]
    pub results: Vec<ReflectionSetItem>,
    /// Actual starting time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub start_time: Option<Timestamp>,
    /// Actual finishing time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub end_time: Option<Timestamp>,
    /// Status of job - enumerated
    pub job_status: Option<JobStatus>,
    /// Expected unit cell for processing.
    pub unit_cell: Option<UnitCell>,
    /// Name of expected space group, for processing. Names may include alternative settings.
    pub space_group_name: Option<String>,
}

impl MXProcessing {
    /// A new processing job with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: MXProcessingTag::MXProcessing,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            sample: None,
            logistical_sample: None,
            templates: Vec::new(),
            input_data: Vec::new(),
            reference_data: Vec::new(),
            results: Vec::new(),
            start_time: None,
            end_time: None,
            job_status: None,
            unit_cell: None,
            space_group_name: None,
        }
    }
}

impl Default for MXProcessing {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for MXProcessing {
    const RECORD_NAME: &'static str = "MXProcessing";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = JOB_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_job_fields::<MXProcessingTag>(v, object);
        v.field::<Vec<ReflectionSetItem>>(object, "templates");
        v.field::<Vec<CollectionSweepItem>>(object, "input_data");
        v.field::<Vec<ReflectionSetItem>>(object, "reference_data");
        v.field::<Vec<ReflectionSetItem>>(object, "results");
        v.field::<Option<UnitCell>>(object, "unit_cell");
        v.field::<Option<String>>(object, "space_group_name");
    }

    fn check(&self, v: &mut Validator) {
        check_job_links(v, self, MX_SAMPLE_TARGETS);
        check_items(v, "templates", &self.templates);
        check_items(v, "input_data", &self.input_data);
        check_items(v, "reference_data", &self.reference_data);
        check_items(v, "results", &self.results);
        if let Some(cell) = &self.unit_cell {
            v.nested("unit_cell", None, |v| cell.check(v));
        }
    }
}

impl_mxlims_object!(MXProcessing, MxlimsType::MXProcessing);
impl_job_record!(MXProcessing, ReflectionSetItem);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallography::{CollectionSweep, ReflectionSet};
    use crate::error::{MxlimsError, ViolationKind};
    use crate::record::{JobRecord, MxlimsObject};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn violations(err: MxlimsError) -> crate::ValidationErrors {
        err.validation().cloned().expect("validation error")
    }

    #[test]
    fn test_processing_consumes_sweeps_and_produces_reflections() {
        let mut processing = MXProcessing::new();
        let sweep = CollectionSweep::sweep("Omega", 0.0, 360.0, 0.2).unwrap();
        processing.input_data.push(sweep.reference().into());
        processing.results.push(
            ReflectionSet::new([-30, 30], [-30, 30], [0, 45], 500_000, 60_000)
                .with_source(processing.reference())
                .with_role("Result")
                .into(),
        );
        assert!(processing.validate().is_ok());
        assert!(processing.result_source_mismatches().is_empty());
    }

    #[test]
    fn test_input_data_rejects_reflection_sets() {
        let value = json!({
            "mxlims_type": "MXProcessing",
            "input_data": [{"target_type": "ReflectionSet", "uuid": new_entity_id().to_string()}],
        });
        let errors = violations(MXProcessing::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::DisallowedTarget));
    }

    #[test]
    fn test_results_embedded_missing_field() {
        let value = json!({
            "mxlims_type": "MXProcessing",
            "results": [{"mxlims_type": "ReflectionSet", "h_index_range": [0, 1]}],
        });
        let errors = violations(MXProcessing::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::MissingField));
    }

    #[test]
    fn test_lifecycle_timestamps_round_trip() {
        let mut processing = MXProcessing::new();
        processing.mark_running(Utc.with_ymd_and_hms(2024, 10, 18, 14, 5, 0).unwrap());
        processing
            .mark_finished(JobStatus::Failed, Utc.with_ymd_and_hms(2024, 10, 18, 14, 6, 30).unwrap())
            .unwrap();
        let value = processing.to_value().unwrap();
        assert_eq!(value["job_status"], json!("Failed"));
        assert_eq!(MXProcessing::from_value(value).unwrap(), processing);
    }

    #[test]
    fn test_space_group_is_mutable() {
        let mut processing = MXProcessing::new();
        processing.assign("space_group_name", json!("P 21 21 21")).unwrap();
        assert_eq!(processing.space_group_name.as_deref(), Some("P 21 21 21"));
        let errors = violations(processing.assign("mxlims_type", json!("MXExperiment")).unwrap_err());
        assert!(errors.has("mxlims_type", ViolationKind::ImmutableField));
    }
}
