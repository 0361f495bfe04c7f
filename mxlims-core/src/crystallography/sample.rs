//! Crystallographic prepared samples

use std::collections::BTreeMap;

use crate::discriminator::mxlims_tag;
use crate::entities::{check_object_fields, OBJECT_FROZEN};
use crate::items::{LogisticalSampleItem, MxJobItem};
use crate::record::{check_items, check_records, impl_mxlims_object, MxlimsRecord};
use crate::validation::Validator;
use crate::values::{Component, Macromolecule, UnitCell};
use crate::{new_entity_id, EntityId, Extensions, MxlimsType, NamespaceExtensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`MXSample`].
    MXSampleTag => MXSample
}

/// Prepared Sample with MX crystallography-specific additions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct MXSample {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: MXSampleTag,
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
    pub jobs: Vec<MxJobItem>,
    /// Macromolecule forming crystal(s) in sample
    pub macromolecule: Option<Macromolecule>,
    /// List of components in sample
    #[serde(default)]
    pub components: Vec<Component>,
    /// Unit cell expected in sample.
    pub unit_cell: Option<UnitCell>,
    /// Name of space group expected in Sample. Names may include alternative settings.
    pub space_group_name: Option<String>,
    /// Relative radiation sensitivity of sample.
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0, maximum = 1.0))]
    pub radiation_sensitivity: Option<f64>,
    /// Dictionary str:str of contextName: identifier. contextName will typically refer
    /// to a LIMS, database, or web site and the identifier will point to the sample
    /// within this context
    #[serde(default)]
    #[cfg_attr(
        feature = "json-schema",
        schema(examples(json!({
            "sendersId": "29174",
            "receiversUrl": "http://lims.synchrotron.org/crystal/54321"
        })))
    )]
    pub identifiers: BTreeMap<String, String>,
}

impl MXSample {
    /// A new MXSample with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: MXSampleTag::MXSample,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            logistical_samples: Vec::new(),
            jobs: Vec::new(),
            macromolecule: None,
            components: Vec::new(),
            unit_cell: None,
            space_group_name: None,
            radiation_sensitivity: None,
            identifiers: BTreeMap::new(),
        }
    }

    /// Look up the component with the given acronym.
    pub fn component(&self, acronym: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.acronym == acronym)
    }
}

impl Default for MXSample {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for MXSample {
    const RECORD_NAME: &'static str = "MXSample";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = OBJECT_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_object_fields::<MXSampleTag>(v, object);
        v.field::<Vec<LogisticalSampleItem>>(object, "logistical_samples");
        v.field::<Vec<MxJobItem>>(object, "jobs");
        v.field::<Option<Macromolecule>>(object, "macromolecule");
        v.field::<Vec<Component>>(object, "components");
        v.field::<Option<UnitCell>>(object, "unit_cell");
        v.field::<Option<String>>(object, "space_group_name");
        v.field::<Option<f64>>(object, "radiation_sensitivity");
        v.field::<BTreeMap<String, String>>(object, "identifiers");
    }

    fn check(&self, v: &mut Validator) {
        v.check_namespace_extensions(&self.namespace_extensions);
        check_items(v, "logistical_samples", &self.logistical_samples);
        check_items(v, "jobs", &self.jobs);
        if let Some(macromolecule) = &self.macromolecule {
            v.nested("macromolecule", None, |v| macromolecule.check(v));
        }
        check_records(v, "components", &self.components);
        if let Some(cell) = &self.unit_cell {
            v.nested("unit_cell", None, |v| cell.check(v));
        }
        v.check_range("radiation_sensitivity", self.radiation_sensitivity, 0.0, 1.0);
    }
}

impl_mxlims_object!(MXSample, MxlimsType::MXSample);
