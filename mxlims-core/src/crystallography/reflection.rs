//! Processed reflection sets

use crate::discriminator::mxlims_tag;
use crate::entities::{check_dataset_fields, check_dataset_links, DATASET_FROZEN};
use crate::record::{check_records, impl_mxlims_object, MxlimsRecord};
use crate::validation::Validator;
use crate::values::{QualityFactor, ReflectionStatistics, Tensor, UnitCell};
use crate::{
    new_entity_id, EntityId, Extensions, MxlimsRef, MxlimsType, NamespaceExtensions,
    PdbxSignalType, ReflectionBinningMode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

mxlims_tag! {
    /// Discriminator literal of [`ReflectionSet`].
    ReflectionSetTag => ReflectionSet
}

/// Processed reflections, possibly merged or scaled
/// as might be stored within an MTZ file or as mmCIF.refln
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct ReflectionSet {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: ReflectionSetTag,
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
    /// Is diffraction limit analysis anisotropic? True/False
    #[serde(default)]
    pub anisotropic_diffraction: bool,
    /// Resolution rings detected as originating from ice, powder diffraction etc.
    #[serde(default)]
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<Vec<f64>>))]
    pub resolution_rings_detected: Vec<[f64; 2]>,
    /// Resolution rings excluded from calculation
    #[serde(default)]
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<Vec<f64>>))]
    pub resolution_rings_excluded: Vec<[f64; 2]>,
    /// Unit cell determined.
    pub unit_cell: Option<UnitCell>,
    /// Name of detected space group. Names may include alternative settings.
    pub space_group_name: Option<String>,
    /// Operation resolution in A matching observed_criteria.
    pub operational_resolution: Option<f64>,
    /// matches mmCIF reflns.B_iso_Wilson_estimate
    #[serde(rename = "B_iso_Wilson_estimate")]
    pub b_iso_wilson_estimate: Option<f64>,
    /// lowest and highest h index - matches mmCIF reflns.limit_h_*
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<i32>, min_items = 2, max_items = 2))]
    pub h_index_range: [i32; 2],
    /// lowest and highest k index - matches mmCIF reflns.limit_k_*
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<i32>, min_items = 2, max_items = 2))]
    pub k_index_range: [i32; 2],
    /// lowest and highest l index - matches mmCIF reflns.limit_l_*
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<i32>, min_items = 2, max_items = 2))]
    pub l_index_range: [i32; 2],
    /// Total number of reflections
    pub num_reflections: u64,
    /// Total number of unique reflections
    pub num_unique_reflections: u64,
    /// Anisotropic B tensor, matching mmCIF reflns.pdbx_aniso_B_tensor
    #[serde(rename = "aniso_B_tensor")]
    pub aniso_b_tensor: Option<Tensor>,
    /// Ellipsoid of observable reflections (unit:A), regardless whether all have actually
    /// been observed. Matches mmCIF reflns.pdbx_anisodiffraction_limit
    pub diffraction_limits_estimated: Option<Tensor>,
    /// Reflection statistics for all measured reflections
    pub overall_refln_statistics: Option<ReflectionStatistics>,
    /// Reflection statistics per reflection shell
    #[serde(default)]
    pub refln_shells: Vec<ReflectionStatistics>,
    /// Criterion for when a reflection counts as observed, as a multiple of sigma(F)
    /// - matches mmCIF reflns.observed_criterion_sigma_F
    #[serde(rename = "observed_criterion_sigma_F")]
    pub observed_criterion_sigma_f: Option<f64>,
    /// Criterion for when a reflection counts as observed, as a multiple of sigma(I)
    /// - matches mmCIF reflns.observed_criterion_sigma_I
    #[serde(rename = "observed_criterion_sigma_I")]
    pub observed_criterion_sigma_i: Option<f64>,
    /// 'local <I/sigmaI>', 'local wCC_half'; matches reflns.pdbx_signal_type. Criterion for
    /// observability, as used in mmCIF refln.pdbx_signal_status
    pub signal_type: Option<PdbxSignalType>,
    /// Limiting value for signal calculation; matches reflns.pdbx_observed_signal_threshold.
    /// Cutoff for observability, as used in mmCIF refln.pdbx_signal_status
    pub signal_cutoff: Option<f64>,
    /// MRFANA resolution cutoff criteria
    #[serde(default)]
    pub resolution_cutoffs: Vec<QualityFactor>,
    /// Binning mode for reflection binning
    pub binning_mode: Option<ReflectionBinningMode>,
    /// Number of equal volume bins for reflection binning
    #[cfg_attr(feature = "json-schema", schema(minimum = 1))]
    pub number_bins: Option<u32>,
    /// Number of reflections per bin
    #[cfg_attr(feature = "json-schema", schema(minimum = 1))]
    pub refln_per_bin: Option<u32>,
    /// Number of reflections per bin for per-run statistics
    #[cfg_attr(feature = "json-schema", schema(minimum = 1))]
    pub refln_per_bin_per_sweep: Option<u32>,
    /// Type of file
    pub file_type: Option<String>,
    /// File name
    pub filename: Option<String>,
    /// Path to directory containing reflection set files.
    pub path: Option<String>,
}

impl ReflectionSet {
    /// A new reflection set with the required index ranges and counts.
    pub fn new(
        h_index_range: [i32; 2],
        k_index_range: [i32; 2],
        l_index_range: [i32; 2],
        num_reflections: u64,
        num_unique_reflections: u64,
    ) -> Self {
        Self {
            mxlims_type: ReflectionSetTag::ReflectionSet,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            source: None,
            role: None,
            logistical_sample: None,
            derived_from_id: None,
            anisotropic_diffraction: false,
            resolution_rings_detected: Vec::new(),
            resolution_rings_excluded: Vec::new(),
            unit_cell: None,
            space_group_name: None,
            operational_resolution: None,
            b_iso_wilson_estimate: None,
            h_index_range,
            k_index_range,
            l_index_range,
            num_reflections,
            num_unique_reflections,
            aniso_b_tensor: None,
            diffraction_limits_estimated: None,
            overall_refln_statistics: None,
            refln_shells: Vec::new(),
            observed_criterion_sigma_f: None,
            observed_criterion_sigma_i: None,
            signal_type: None,
            signal_cutoff: None,
            resolution_cutoffs: Vec::new(),
            binning_mode: None,
            number_bins: None,
            refln_per_bin: None,
            refln_per_bin_per_sweep: None,
            file_type: None,
            filename: None,
            path: None,
        }
    }

    /// Highest resolution (smallest d-spacing) across all shells, in A.
    pub fn high_resolution_limit(&self) -> Option<f64> {
        self.overall_refln_statistics
            .iter()
            .chain(self.refln_shells.iter())
            .map(|stats| stats.resolution_limits[0].min(stats.resolution_limits[1]))
            .reduce(f64::min)
    }
}

impl MxlimsRecord for ReflectionSet {
    const RECORD_NAME: &'static str = "ReflectionSet";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "mxlims_type",
        "h_index_range",
        "k_index_range",
        "l_index_range",
        "num_reflections",
        "num_unique_reflections",
    ];
    const FROZEN_FIELDS: &'static [&'static str] = DATASET_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_dataset_fields::<ReflectionSetTag>(v, object);
        v.field::<bool>(object, "anisotropic_diffraction");
        v.field::<Vec<[f64; 2]>>(object, "resolution_rings_detected");
        v.field::<Vec<[f64; 2]>>(object, "resolution_rings_excluded");
        v.field::<Option<UnitCell>>(object, "unit_cell");
        for field in ["h_index_range", "k_index_range", "l_index_range"] {
            v.field::<[i32; 2]>(object, field);
        }
        v.field::<u64>(object, "num_reflections");
        v.field::<u64>(object, "num_unique_reflections");
        v.field::<Option<Tensor>>(object, "aniso_B_tensor");
        v.field::<Option<Tensor>>(object, "diffraction_limits_estimated");
        v.field::<Option<ReflectionStatistics>>(object, "overall_refln_statistics");
        v.field::<Vec<ReflectionStatistics>>(object, "refln_shells");
        for field in [
            "operational_resolution",
            "B_iso_Wilson_estimate",
            "observed_criterion_sigma_F",
            "observed_criterion_sigma_I",
            "signal_cutoff",
        ] {
            v.field::<Option<f64>>(object, field);
        }
        v.field::<Option<PdbxSignalType>>(object, "signal_type");
        v.field::<Vec<QualityFactor>>(object, "resolution_cutoffs");
        v.field::<Option<ReflectionBinningMode>>(object, "binning_mode");
        for field in ["number_bins", "refln_per_bin", "refln_per_bin_per_sweep"] {
            v.field::<Option<u32>>(object, field);
        }
        for field in ["space_group_name", "file_type", "filename", "path"] {
            v.field::<Option<String>>(object, field);
        }
    }

    fn check(&self, v: &mut Validator) {
        check_dataset_links(v, self);
        if let Some(cell) = &self.unit_cell {
            v.nested("unit_cell", None, |v| cell.check(v));
        }
        v.check_ordered("h_index_range", &self.h_index_range);
        v.check_ordered("k_index_range", &self.k_index_range);
        v.check_ordered("l_index_range", &self.l_index_range);
        if self.num_unique_reflections > self.num_reflections {
            v.invalid(
                "num_unique_reflections",
                format!(
                    "{} unique reflections exceed {} reflections",
                    self.num_unique_reflections, self.num_reflections
                ),
            );
        }
        if let Some(tensor) = &self.aniso_b_tensor {
            v.nested("aniso_B_tensor", None, |v| tensor.check(v));
        }
        if let Some(tensor) = &self.diffraction_limits_estimated {
            v.nested("diffraction_limits_estimated", None, |v| tensor.check(v));
        }
        if let Some(stats) = &self.overall_refln_statistics {
            v.nested("overall_refln_statistics", None, |v| stats.check(v));
        }
        check_records(v, "refln_shells", &self.refln_shells);
        check_records(v, "resolution_cutoffs", &self.resolution_cutoffs);
        v.check_positive_count("number_bins", self.number_bins);
        v.check_positive_count("refln_per_bin", self.refln_per_bin);
        v.check_positive_count("refln_per_bin_per_sweep", self.refln_per_bin_per_sweep);
    }
}

impl_mxlims_object!(ReflectionSet, MxlimsType::ReflectionSet, dataset);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MxlimsError, ViolationKind};
    use serde_json::json;

    fn violations(err: MxlimsError) -> crate::ValidationErrors {
        err.validation().cloned().expect("validation error")
    }

    fn minimal_json() -> serde_json::Value {
        json!({
            "mxlims_type": "ReflectionSet",
            "h_index_range": [-40, 40],
            "k_index_range": [-40, 40],
            "l_index_range": [0, 20],
            "num_reflections": 120000,
            "num_unique_reflections": 30000,
        })
    }

    #[test]
    fn test_minimal_reflection_set() {
        let set = ReflectionSet::from_value(minimal_json()).unwrap();
        assert!(!set.anisotropic_diffraction);
        assert!(set.refln_shells.is_empty());
        assert!(set.resolution_rings_detected.is_empty());
        assert_eq!(set.high_resolution_limit(), None);
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let errors = violations(ReflectionSet::from_value(json!({"mxlims_type": "ReflectionSet"})).unwrap_err());
        assert_eq!(errors.len(), 5);
        for field in ["h_index_range", "k_index_range", "l_index_range", "num_reflections", "num_unique_reflections"] {
            assert!(errors.has(field, ViolationKind::MissingField), "{}", field);
        }
    }

    #[test]
    fn test_mmcif_field_names() {
        let mut set = ReflectionSet::new([-1, 1], [-1, 1], [0, 1], 10, 5);
        set.b_iso_wilson_estimate = Some(21.5);
        set.observed_criterion_sigma_f = Some(2.0);
        set.observed_criterion_sigma_i = Some(1.5);
        set.aniso_b_tensor = Some(Tensor::new(
            [1.0, 2.0, -3.0],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        ));
        let value = set.to_value().unwrap();
        assert_eq!(value["B_iso_Wilson_estimate"], json!(21.5));
        assert_eq!(value["observed_criterion_sigma_F"], json!(2.0));
        assert_eq!(value["observed_criterion_sigma_I"], json!(1.5));
        assert_eq!(value["aniso_B_tensor"]["eigenvalues"], json!([1.0, 2.0, -3.0]));
        assert_eq!(ReflectionSet::from_value(value).unwrap(), set);
    }

    #[test]
    fn test_constraint_violations() {
        let mut set = ReflectionSet::new([5, -5], [-1, 1], [3, 2], 10, 11);
        set.number_bins = Some(0);
        set.refln_per_bin = Some(0);
        set.refln_per_bin_per_sweep = Some(50);
        let errors = set.validate().unwrap_err();
        assert!(errors.has("h_index_range", ViolationKind::OutOfRange));
        assert!(errors.has("l_index_range", ViolationKind::OutOfRange));
        assert!(errors.has("num_unique_reflections", ViolationKind::InvalidValue));
        assert!(errors.has("number_bins", ViolationKind::OutOfRange));
        assert!(errors.has("refln_per_bin", ViolationKind::OutOfRange));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_nested_statistics_paths() {
        let mut value = minimal_json();
        value["refln_shells"] = json!([
            {
                "resolution_limits": [40.0, 3.0],
                "number_observations": 1000,
                "number_unique_observations": 250,
                "completeness": 99.0,
                "redundancy": 4.0,
                "redundancy_anomalous": 2.0,
            },
            {
                "resolution_limits": [3.0, 1.8],
                "number_observations": 1000,
                "number_unique_observations": 250,
                "completeness": 101.0,
                "redundancy": 4.0,
                "redundancy_anomalous": 2.0,
            },
        ]);
        value["unit_cell"] = json!({"a": 0.0, "b": 50.0, "c": 50.0, "alpha": 90.0, "beta": 90.0, "gamma": 90.0});
        let errors = violations(ReflectionSet::from_value(value).unwrap_err());
        assert!(errors.has("refln_shells[1].completeness", ViolationKind::OutOfRange));
        assert!(errors.has("unit_cell.a", ViolationKind::OutOfRange));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_signal_and_binning_vocabulary() {
        let mut value = minimal_json();
        value["signal_type"] = json!("local wCC_half");
        value["binning_mode"] = json!("equal_volume");
        let set = ReflectionSet::from_value(value).unwrap();
        assert_eq!(set.signal_type, Some(PdbxSignalType::WccHalf));
        assert_eq!(set.binning_mode, Some(ReflectionBinningMode::EqualVolume));

        let mut value = minimal_json();
        value["binning_mode"] = json!("log_scale");
        let errors = violations(ReflectionSet::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::InvalidEnumMember));
    }

    #[test]
    fn test_high_resolution_limit() {
        let mut set = ReflectionSet::new([-1, 1], [-1, 1], [0, 1], 10, 5);
        set.refln_shells = vec![
            ReflectionStatistics::new([40.0, 3.0], 10, 5, 90.0, 2.0, 1.0).unwrap(),
            ReflectionStatistics::new([3.0, 1.65], 10, 5, 80.0, 2.0, 1.0).unwrap(),
        ];
        assert_eq!(set.high_resolution_limit(), Some(1.65));
    }
}
