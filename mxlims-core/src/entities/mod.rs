//! Generic MXLIMS entities
//!
//! Datasets, Jobs and the two sample kinds, usable by any LIMS without the
//! crystallography specializations.

mod dataset;
mod job;
mod sample;

pub use dataset::{Dataset, DatasetTag};
pub use job::{Job, JobTag};
pub use sample::{LogisticalSample, LogisticalSampleTag, PreparedSample, PreparedSampleTag};

use crate::record::{DatasetRecord, JobRecord};
use crate::shape::Shape;
use crate::validation::{Validator, JOB_TARGETS, LOGISTICAL_SAMPLE_TARGETS};
use crate::{
    EntityId, Extensions, JobStatus, MxlimsRef, MxlimsType, NamespaceExtensions, Timestamp,
};
use serde_json::{Map, Value};

/// Fields every entity freezes.
pub(crate) const OBJECT_FROZEN: &[&str] = &["mxlims_type", "uuid"];

/// Fields every Dataset freezes.
pub(crate) const DATASET_FROZEN: &[&str] = &[
    "mxlims_type",
    "uuid",
    "source",
    "role",
    "logistical_sample",
    "derived_from_id",
];

/// Fields every Job freezes.
pub(crate) const JOB_FROZEN: &[&str] = &["mxlims_type", "uuid", "sample", "logistical_sample"];

/// Check the extension points and back-links shared by all Datasets.
pub(crate) fn check_dataset_links<D: DatasetRecord>(v: &mut Validator, dataset: &D) {
    v.check_namespace_extensions(dataset.namespace_extensions());
    v.check_target("source", dataset.source(), JOB_TARGETS);
    v.check_target(
        "logistical_sample",
        DatasetRecord::logistical_sample(dataset),
        LOGISTICAL_SAMPLE_TARGETS,
    );
}

/// Check the extension points and back-links shared by all Jobs.
pub(crate) fn check_job_links<J: JobRecord>(v: &mut Validator, job: &J, sample_targets: &[MxlimsType]) {
    v.check_namespace_extensions(job.namespace_extensions());
    v.check_target("sample", job.sample(), sample_targets);
    v.check_target(
        "logistical_sample",
        JobRecord::logistical_sample(job),
        LOGISTICAL_SAMPLE_TARGETS,
    );
}

/// Check the JSON types of the identity and extension fields of an entity
/// tagged by `Tag`.
pub(crate) fn check_object_fields<Tag: Shape>(v: &mut Validator, object: &Map<String, Value>) {
    v.field::<Tag>(object, "mxlims_type");
    v.field::<EntityId>(object, "uuid");
    v.field::<Extensions>(object, "extensions");
    v.field::<NamespaceExtensions>(object, "namespace_extensions");
}

/// Check the JSON types of the fields shared by all Datasets.
pub(crate) fn check_dataset_fields<Tag: Shape>(v: &mut Validator, object: &Map<String, Value>) {
    check_object_fields::<Tag>(v, object);
    v.field::<Option<MxlimsRef>>(object, "source");
    v.field::<Option<String>>(object, "role");
    v.field::<Option<MxlimsRef>>(object, "logistical_sample");
    v.field::<Option<EntityId>>(object, "derived_from_id");
}

/// Check the JSON types of the fields shared by all Jobs.
pub(crate) fn check_job_fields<Tag: Shape>(v: &mut Validator, object: &Map<String, Value>) {
    check_object_fields::<Tag>(v, object);
    v.field::<Option<MxlimsRef>>(object, "sample");
    v.field::<Option<MxlimsRef>>(object, "logistical_sample");
    v.field::<Option<Timestamp>>(object, "start_time");
    v.field::<Option<Timestamp>>(object, "end_time");
    v.field::<Option<JobStatus>>(object, "job_status");
}
