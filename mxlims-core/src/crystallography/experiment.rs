//! Diffraction data acquisition experiments

use crate::discriminator::mxlims_tag;
use crate::entities::{check_job_fields, check_job_links, JOB_FROZEN};
use crate::items::{CollectionSweepItem, DatasetItem, ReflectionSetItem};
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
    /// Discriminator literal of [`MXExperiment`].
    MXExperimentTag => MXExperiment
}

/// MX Crystallographic data acquisition experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct MXExperiment {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: MXExperimentTag,
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
    pub templates: Vec<CollectionSweepItem>,
    /// Input data sets (pre-existing), used for calculation
    #[serde(default)]
    pub input_data: Vec<DatasetItem>,
    /// Reference data sets, e.g. reference mtz file
    #[serde(default)]
    pub reference_data: Vec<ReflectionSetItem>,
    /// Datasets produced by Job (match Dataset.source)
    #[serde(default)]
    pub results: Vec<CollectionSweepItem>,
    /// Actual starting time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub start_time: Option<Timestamp>,
    /// Actual finishing time for job or calculation
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<String>, format = "date-time"))]
    pub end_time: Option<Timestamp>,
    /// Status of job - enumerated
    pub job_status: Option<JobStatus>,
    /// Experiment strategy indicator
    #[cfg_attr(
        feature = "json-schema",
        schema(examples(
            "OSC",
            "Helical",
            "MXPressE",
            "GPhL_native_basic",
            "GPhL_SAD_advanced",
            "GPhL_2wvl_basic"
        ))
    )]
    pub experiment_strategy: Option<String>,
    /// The resolution expected in the experiment - for positioning the detector and setting up the experiment
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub expected_resolution: Option<f64>,
    /// Minimal completeness expected from experiment
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0, maximum = 100.0))]
    pub target_completeness: Option<f64>,
    /// Minimal multiplicity expected from experiment
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub target_multiplicity: Option<f64>,
    /// Dose (MGy) to be used in experiment
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub dose_budget: Option<f64>,
    /// Number of snapshots to acquire after each (re)centring
    pub snapshot_count: Option<u32>,
    /// Wedge width (in degrees) to use for interleaving
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub wedge_width: Option<f64>,
    /// Measured value of beam flux in photons/s
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub measured_flux: Option<f64>,
    /// Total radiation dose absorbed during experiment
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub radiation_dose: Option<f64>,
    /// Crystallographic unit cell, as determined during characterisation
    pub unit_cell: Option<UnitCell>,
    /// Name of space group, as determined during characterisation. Names may include alternative settings.
    pub space_group_name: Option<String>,
}

impl MXExperiment {
    /// A new experiment with a fresh identifier.
    pub fn new() -> Self {
        Self {
            mxlims_type: MXExperimentTag::MXExperiment,
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
            experiment_strategy: None,
            expected_resolution: None,
            target_completeness: None,
            target_multiplicity: None,
            dose_budget: None,
            snapshot_count: None,
            wedge_width: None,
            measured_flux: None,
            radiation_dose: None,
            unit_cell: None,
            space_group_name: None,
        }
    }
}

impl Default for MXExperiment {
    fn default() -> Self {
        Self::new()
    }
}

impl MxlimsRecord for MXExperiment {
    const RECORD_NAME: &'static str = "MXExperiment";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type"];
    const FROZEN_FIELDS: &'static [&'static str] = JOB_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_job_fields::<MXExperimentTag>(v, object);
        v.field::<Vec<CollectionSweepItem>>(object, "templates");
        v.field::<Vec<DatasetItem>>(object, "input_data");
        v.field::<Vec<ReflectionSetItem>>(object, "reference_data");
        v.field::<Vec<CollectionSweepItem>>(object, "results");
        v.field::<Option<String>>(object, "experiment_strategy");
        for field in [
            "expected_resolution",
            "target_completeness",
            "target_multiplicity",
            "dose_budget",
            "wedge_width",
            "measured_flux",
            "radiation_dose",
        ] {
            v.field::<Option<f64>>(object, field);
        }
        v.field::<Option<u32>>(object, "snapshot_count");
        v.field::<Option<UnitCell>>(object, "unit_cell");
        v.field::<Option<String>>(object, "space_group_name");
    }

    fn check(&self, v: &mut Validator) {
        check_job_links(v, self, MX_SAMPLE_TARGETS);
        check_items(v, "templates", &self.templates);
        check_items(v, "input_data", &self.input_data);
        check_items(v, "reference_data", &self.reference_data);
        check_items(v, "results", &self.results);
        v.check_min("expected_resolution", self.expected_resolution, 0.0);
        v.check_range("target_completeness", self.target_completeness, 0.0, 100.0);
        v.check_min("target_multiplicity", self.target_multiplicity, 0.0);
        v.check_min("dose_budget", self.dose_budget, 0.0);
        v.check_min("wedge_width", self.wedge_width, 0.0);
        v.check_min("measured_flux", self.measured_flux, 0.0);
        v.check_min("radiation_dose", self.radiation_dose, 0.0);
        if let Some(cell) = &self.unit_cell {
            v.nested("unit_cell", None, |v| cell.check(v));
        }
    }
}

impl_mxlims_object!(MXExperiment, MxlimsType::MXExperiment);
impl_job_record!(MXExperiment, CollectionSweepItem);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crystallography::CollectionSweep;
    use crate::error::{MxlimsError, ViolationKind};
    use crate::record::{CollectionItem, JobRecord, MxlimsObject};
    use serde_json::json;

    fn violations(err: MxlimsError) -> crate::ValidationErrors {
        err.validation().cloned().expect("validation error")
    }

    #[test]
    fn test_mixed_results_preserve_order() {
        let referenced = new_entity_id();
        let value = json!({
            "mxlims_type": "MXExperiment",
            "experiment_strategy": "OSC",
            "results": [
                {
                    "mxlims_type": "CollectionSweep",
                    "scan_axis": "Omega",
                    "axis_positions_start": {"Omega": 0.0},
                    "axis_positions_end": {"Omega": 180.0},
                    "image_width": 0.1,
                },
                {"target_type": "CollectionSweep", "uuid": referenced.to_string()},
            ],
        });
        let experiment = MXExperiment::from_value(value).unwrap();
        assert_eq!(experiment.results.len(), 2);
        match &experiment.results[0] {
            CollectionSweepItem::CollectionSweep(sweep) => assert_eq!(sweep.scan_axis, "Omega"),
            other => panic!("expected embedded sweep, got {:?}", other),
        }
        assert_eq!(
            experiment.results[1].as_reference(),
            Some(&MxlimsRef::new(MxlimsType::CollectionSweep, referenced))
        );
    }

    #[test]
    fn test_results_reject_other_dataset_types() {
        let value = json!({
            "mxlims_type": "MXExperiment",
            "results": [{"mxlims_type": "ReflectionSet"}],
        });
        let errors = violations(MXExperiment::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::UnknownVariant));

        let value = json!({
            "mxlims_type": "MXExperiment",
            "results": [{"target_type": "ReflectionSet", "uuid": new_entity_id().to_string()}],
        });
        let errors = violations(MXExperiment::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::DisallowedTarget));
    }

    #[test]
    fn test_sample_narrowed_to_mx_sample() {
        let ok = MXExperiment::new().with_sample(MxlimsRef::new(MxlimsType::MXSample, new_entity_id()));
        assert!(ok.validate().is_ok());

        let generic = MxlimsRef::new(MxlimsType::PreparedSample, new_entity_id());
        let errors = MXExperiment::new().with_sample(generic).validate().unwrap_err();
        assert!(errors.has("sample", ViolationKind::DisallowedTarget));
    }

    #[test]
    fn test_quantities_must_be_non_negative() {
        let mut experiment = MXExperiment::new();
        experiment.dose_budget = Some(-0.5);
        experiment.target_completeness = Some(100.5);
        experiment.measured_flux = Some(-1.0e12);
        experiment.wedge_width = Some(5.0);
        let errors = experiment.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.has("dose_budget", ViolationKind::OutOfRange));
        assert!(errors.has("target_completeness", ViolationKind::OutOfRange));
        assert!(errors.has("measured_flux", ViolationKind::OutOfRange));
    }

    #[test]
    fn test_embedded_result_violation_path() {
        let mut experiment = MXExperiment::new();
        let mut sweep = CollectionSweep::new("Omega");
        sweep.transmission = Some(120.0);
        experiment.results.push(CollectionSweep::new("Phi").into());
        experiment.results.push(sweep.into());
        let errors = experiment.validate().unwrap_err();
        assert!(errors.has("results[1].transmission", ViolationKind::OutOfRange));
    }

    #[test]
    fn test_result_sources_checked_against_experiment() {
        let mut experiment = MXExperiment::new();
        let own = CollectionSweep::new("Omega").with_source(experiment.reference());
        let stray = CollectionSweep::new("Omega")
            .with_source(MxlimsRef::new(MxlimsType::MXExperiment, new_entity_id()));
        let stray_id = stray.uuid();
        experiment.results.push(own.into());
        experiment.results.push(stray.into());
        assert_eq!(experiment.result_source_mismatches(), vec![stray_id]);
        assert!(experiment.results.iter().all(|item| !item.is_reference()));
    }

    #[test]
    fn test_round_trip() {
        let mut experiment = MXExperiment::new()
            .with_sample(MxlimsRef::new(MxlimsType::MXSample, new_entity_id()));
        experiment.experiment_strategy = Some("GPhL_SAD_advanced".to_string());
        experiment.snapshot_count = Some(2);
        experiment.unit_cell = Some(UnitCell::new(61.2, 61.2, 97.5, 90.0, 90.0, 120.0).unwrap());
        experiment.results.push(CollectionSweep::new("Omega").into());
        experiment
            .reference_data
            .push(MxlimsRef::new(MxlimsType::ReflectionSet, new_entity_id()).into());

        let decoded = MXExperiment::from_json(&experiment.to_json_pretty().unwrap()).unwrap();
        assert_eq!(decoded, experiment);
    }
}
