//! Dataset entity

use super::{check_dataset_fields, check_dataset_links, DATASET_FROZEN};
use crate::discriminator::mxlims_tag;
use crate::record::{impl_mxlims_object, MxlimsRecord};
use crate::validation::Validator;
use crate::{new_entity_id, EntityId, Extensions, MxlimsRef, MxlimsType, NamespaceExtensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`Dataset`].
    DatasetTag => Dataset
}

/// Base class for MXLIMS Datasets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Dataset {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: DatasetTag,
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
    /// Job that created this Dataset. return link for job.results
    source: Option<MxlimsRef>,
    /// Role of Dataset relative to the source Job. Intended for filtering of Datasets
    #[cfg_attr(
        feature = "json-schema",
        schema(examples("Result", "Intermediate", "Characterisation", "Centring"))
    )]
    role: Option<String>,
    /// Logistical Sample or Sample location relevant to Dataset.
    /// Overrides Job.logistical_sample; return link for LogisticalSample.datasets
    logistical_sample: Option<MxlimsRef>,
    /// UUID for Dataset from which this Dataset was derived. Used for modified
    /// Datasets without a 'source' link, e.g. when removing images from a sweep
    /// before processing.
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "uuid"))]
    derived_from_id: Option<EntityId>,
}

impl Dataset {
    /// A new Dataset with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: DatasetTag::Dataset,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            source: None,
            role: None,
            logistical_sample: None,
            derived_from_id: None,
        }
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for Dataset {
    const RECORD_NAME: &'static str = "Dataset";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = DATASET_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_dataset_fields::<DatasetTag>(v, object);
    }

    fn check(&self, v: &mut Validator) {
        check_dataset_links(v, self);
    }
}

impl_mxlims_object!(Dataset, MxlimsType::Dataset, dataset);
