//! Logistical and prepared sample entities

use super::{check_object_fields, OBJECT_FROZEN};
use crate::discriminator::mxlims_tag;
use crate::items::{DatasetItem, JobItem, LogisticalSampleItem};
use crate::record::{check_items, impl_mxlims_object, CollectionItem, MxlimsObject, MxlimsRecord};
use crate::validation::{Validator, LOGISTICAL_SAMPLE_TARGETS, PREPARED_SAMPLE_TARGETS};
use crate::{new_entity_id, EntityId, Extensions, MxlimsRef, MxlimsType, NamespaceExtensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`LogisticalSample`].
    LogisticalSampleTag => LogisticalSample
}

mxlims_tag! {
    /// Discriminator literal of [`PreparedSample`].
    PreparedSampleTag => PreparedSample
}

// ============================================================================
// LOGISTICAL SAMPLE
// ============================================================================

/// Base class for MXLIMS Logistical Samples
///
/// describing Sample containers and locations
/// (from Dewars and Plates to drops, pins and crystals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct LogisticalSample {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: LogisticalSampleTag,
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
    /// The sample preparation that applies to this LogisticalSample and all its contents
    pub sample: Option<MxlimsRef>,
    /// The LogisticalSample containing this one
    pub container: Option<MxlimsRef>,
    /// LogisticalSamples contained in this one
    #[serde(default)]
    pub contents: Vec<LogisticalSampleItem>,
    /// Jobs (templates, planned, initiated or completed) for this LogisticalSample
    #[serde(default)]
    pub jobs: Vec<JobItem>,
    /// Datasets (templates, planned, initiated or completed) for this LogisticalSample
    #[serde(default)]
    pub datasets: Vec<DatasetItem>,
}

impl LogisticalSample {
    /// A new LogisticalSample with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: LogisticalSampleTag::LogisticalSample,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            sample: None,
            container: None,
            contents: Vec::new(),
            jobs: Vec::new(),
            datasets: Vec::new(),
        }
    }

    /// Embed `child` in `contents`, pointing its `container` back here.
    pub fn contain(&mut self, mut child: LogisticalSample) {
        child.container = Some(self.reference());
        self.contents.push(child.into());
    }

    /// Identifiers of every embedded or referenced descendant, depth first.
    pub fn descendant_ids(&self) -> Vec<EntityId> {
        let mut ids = Vec::new();
        self.collect_descendants(&mut ids);
        ids
    }

    fn collect_descendants(&self, ids: &mut Vec<EntityId>) {
        for item in &self.contents {
            let id = item.uuid();
            // a cycle would recurse forever; validation reports it instead
            if id == self.uuid || ids.contains(&id) {
                continue;
            }
            ids.push(id);
            if let LogisticalSampleItem::LogisticalSample(child) = item {
                child.collect_descendants(ids);
            }
        }
    }
}

impl Default for LogisticalSample {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for LogisticalSample {
    const RECORD_NAME: &'static str = "LogisticalSample";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = OBJECT_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_object_fields::<LogisticalSampleTag>(v, object);
        v.field::<Option<MxlimsRef>>(object, "sample");
        v.field::<Option<MxlimsRef>>(object, "container");
        v.field::<Vec<LogisticalSampleItem>>(object, "contents");
        v.field::<Vec<JobItem>>(object, "jobs");
        v.field::<Vec<DatasetItem>>(object, "datasets");
    }

    fn check(&self, v: &mut Validator) {
        v.check_namespace_extensions(&self.namespace_extensions);
        v.check_target("sample", self.sample.as_ref(), PREPARED_SAMPLE_TARGETS);
        v.check_target("container", self.container.as_ref(), LOGISTICAL_SAMPLE_TARGETS);
        if self.container.map(|c| c.uuid) == Some(self.uuid) {
            v.circular("container", None, self.uuid);
        }

        v.with_container(self.uuid, |v| {
            for (index, item) in self.contents.iter().enumerate() {
                let id = item.uuid();
                if v.in_containment_path(id) {
                    v.circular("contents", Some(index), id);
                } else {
                    v.nested("contents", Some(index), |v| item.check(v));
                }
            }
        });

        check_items(v, "jobs", &self.jobs);
        check_items(v, "datasets", &self.datasets);
    }
}

impl_mxlims_object!(LogisticalSample, MxlimsType::LogisticalSample);

// ============================================================================
// PREPARED SAMPLE
// ============================================================================

/// Base class for MXLIMS Prepared Samples, describing sample content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct PreparedSample {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: PreparedSampleTag,
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
    /// LogisticalSamples with contents from this PreparedSample
    #[serde(default)]
    pub logistical_samples: Vec<LogisticalSampleItem>,
    /// Jobs (templates, planned, initiated or completed) for this PreparedSample
    #[serde(default)]
    pub jobs: Vec<JobItem>,
}

impl PreparedSample {
    /// A new PreparedSample with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: PreparedSampleTag::PreparedSample,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            logistical_samples: Vec::new(),
            jobs: Vec::new(),
        }
    }
}

impl Default for PreparedSample {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for PreparedSample {
    const RECORD_NAME: &'static str = "PreparedSample";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = OBJECT_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_object_fields::<PreparedSampleTag>(v, object);
        v.field::<Vec<LogisticalSampleItem>>(object, "logistical_samples");
        v.field::<Vec<JobItem>>(object, "jobs");
    }

    fn check(&self, v: &mut Validator) {
        v.check_namespace_extensions(&self.namespace_extensions);
        check_items(v, "logistical_samples", &self.logistical_samples);
        check_items(v, "jobs", &self.jobs);
    }
}

impl_mxlims_object!(PreparedSample, MxlimsType::PreparedSample);
