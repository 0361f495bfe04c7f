//! Job entity

use super::{check_job_fields, check_job_links, JOB_FROZEN};
use crate::discriminator::mxlims_tag;
use crate::items::DatasetItem;
use crate::record::{check_items, impl_job_record, impl_mxlims_object, MxlimsRecord};
use crate::validation::{Validator, PREPARED_SAMPLE_TARGETS};
use crate::{
    new_entity_id, EntityId, Extensions, JobStatus, MxlimsRef, MxlimsType, NamespaceExtensions,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`Job`].
    JobTag => Job
}

/// Base class for MXLIMS Jobs - an experiment or calculation producing Datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Job {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: JobTag,
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
    /// Prepared sample relevant to Job. return link for PreparedSample.jobs
    sample: Option<MxlimsRef>,
    /// Logistical Sample or Sample location relevant to Job.
    /// Overridden by Dataset.logistical_sample; return link for LogisticalSample.jobs
    logistical_sample: Option<MxlimsRef>,
    /// Templates with parameters for output datasets - e.g. diffraction plan, processing plan
    #[serde(default)]
    pub templates: Vec<DatasetItem>,
    /// Input data sets (pre-existing), used for calculation
    #[serde(default)]
    pub input_data: Vec<DatasetItem>,
    /// Reference data sets, e.g. reference mtz file
    #[serde(default)]
    pub reference_data: Vec<DatasetItem>,
    /// Datasets produced by Job
    #[serde(default)]
    pub results: Vec<DatasetItem>,
    /// Actual starting time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub start_time: Option<Timestamp>,
    /// Actual finishing time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub end_time: Option<Timestamp>,
    /// Status of job - enumerated
    pub job_status: Option<JobStatus>,
}

impl Job {
    /// A new Job with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: JobTag::Job,
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
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for Job {
    const RECORD_NAME: &'static str = "Job";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = JOB_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_job_fields::<JobTag>(v, object);
        for field in ["templates", "input_data", "reference_data", "results"] {
            v.field::<Vec<DatasetItem>>(object, field);
        }
    }

    fn check(&self, v: &mut Validator) {
        check_job_links(v, self, PREPARED_SAMPLE_TARGETS);
        check_items(v, "templates", &self.templates);
        check_items(v, "input_data", &self.input_data);
        check_items(v, "reference_data", &self.reference_data);
        check_items(v, "results", &self.results);
    }
}

impl_mxlims_object!(Job, MxlimsType::Job);
impl_job_record!(Job, DatasetItem);
