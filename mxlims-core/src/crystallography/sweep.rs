//! Diffraction data collection sweeps

use crate::discriminator::mxlims_tag;
use crate::entities::{check_dataset_fields, check_dataset_links, DATASET_FROZEN};
use crate::error::MxlimsResult;
use crate::record::{check_records, impl_mxlims_object, MxlimsRecord};
use crate::validation::Validator;
use crate::values::Scan;
use crate::{new_entity_id, EntityId, Extensions, MxlimsRef, MxlimsType, NamespaceExtensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

mxlims_tag! {
    /// Discriminator literal of [`CollectionSweep`].
    CollectionSweepTag => CollectionSweep
}

/// MX Crystallographic data collection sweep, may be subdivided for acquisition
///
/// Note that the CollectionSweep specifies a single, continuous sweep range,
/// with equidistant images given by image_width, and all starting motor positions
/// in axis_positions_start. axis_positions_end contain the end point of the sweep,
/// and must have at least the value for the scan_axis; sweeps changing more than
/// one motor (e.g. helical scan) can be represented by adding more values
/// to axis_positions_end. The default number of images can be calculated from the
/// sweep range and image_width. The actual number of images, the image numbering,
/// and the order of acquisition (including interleaving) follows from the list of
/// Scans. The role should be set to 'Result' for those sweeps that are deemed to
/// be the desired result of the experiment; in templates you would prefer to use
/// Acquisition for the Dataset that gives the acquisition parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct CollectionSweep {
    #[cfg_attr(feature = "json-schema", schema(inline))]
    mxlims_type: CollectionSweepTag,
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
    /// Annotation string for sweep
    pub annotation: Option<String>,
    /// Exposure time in seconds
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub exposure_time: Option<f64>,
    /// Width of a single image, along scan_axis. For rotational axes in degrees, for translations in m.
    pub image_width: Option<f64>,
    /// Energy of the beam in eV
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub energy: Option<f64>,
    /// Transmission setting in %
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0, maximum = 100.0))]
    pub transmission: Option<f64>,
    /// Type of detector, using enumeration of mmCIF Items/_diffrn_detector.type.html
    pub detector_type: Option<String>,
    /// Binning mode of detector. Should be made into an enumeration
    pub detector_binning_mode: Option<String>,
    /// Region-of-interest mode of detector. Should be made into an enumeration
    pub detector_roi_mode: Option<String>,
    /// x,y position of the beam on the detector in pixels
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<Vec<f64>>, min_items = 2, max_items = 2))]
    pub beam_position: Option<[f64; 2]>,
    /// x,y size of the beam on the detector in m
    #[cfg_attr(feature = "json-schema", schema(value_type = Option<Vec<f64>>, min_items = 2, max_items = 2))]
    pub beam_size: Option<[f64; 2]>,
    /// Shape of the beam. NB Should be an enumeration
    #[cfg_attr(feature = "json-schema", schema(examples("unknown", "rectangular", "ellipsoid")))]
    pub beam_shape: Option<String>,
    /// Dictionary string:float with starting position of all axes, rotations or translations,
    /// including detector distance, by name. Units are m for distances, degrees for angles
    #[serde(default)]
    pub axis_positions_start: BTreeMap<String, f64>,
    /// Dictionary string:float with final position of scanned axes as for axis_positions_start.
    /// NB scans may be acquired out of order, so this determines the limits of the sweep,
    /// not the temporal start and end points
    #[serde(default)]
    pub axis_positions_end: BTreeMap<String, f64>,
    /// Name of main scanned axis. Other axes may be scanned in parallel.
    #[cfg_attr(
        feature = "json-schema",
        schema(examples(
            "Omega", "Kappa", "Phi", "Chi", "TwoTheta", "SampleX", "SampleY", "SampleZ",
            "DetectorX", "DetectorY"
        ))
    )]
    pub scan_axis: String,
    /// Overlap between successive images, in degrees. May be negative for non-contiguous images.
    pub overlap: Option<f64>,
    /// Number of triggers. Instruction to detector - does not modify effect of other parameters.
    pub num_triggers: Option<u32>,
    /// Number of images per trigger. Instruction to detector - does not modify effect of other parameters.
    pub num_images_per_trigger: Option<u32>,
    /// List of Scans i.e. subdivisions of CollectionSweep.
    /// NB Scans need not be contiguous or in order or add up to entire sweep
    #[serde(default)]
    pub scans: Vec<Scan>,
    /// Type of file.
    #[cfg_attr(
        feature = "json-schema",
        schema(examples("mini-cbf", "imgCIF", "FullCBF", "HDF5", "MarCCD"))
    )]
    pub file_type: Option<String>,
    /// Input parameter - used to build the file name template.
    pub prefix: Option<String>,
    /// File name template, includes prefix, suffix, run number, and a slot where image number can be filled in.
    pub filename_template: Option<String>,
    /// Path to directory containing image files.
    pub path: Option<String>,
}

impl CollectionSweep {
    /// A new sweep around `scan_axis` with a fresh identifier.
    pub fn new(scan_axis: impl Into<String>) -> Self {
        Self {
            mxlims_type: CollectionSweepTag::CollectionSweep,
            uuid: new_entity_id(),
            extensions: Extensions::new(),
            namespace_extensions: NamespaceExtensions::new(),
            source: None,
            role: None,
            logistical_sample: None,
            derived_from_id: None,
            annotation: None,
            exposure_time: None,
            image_width: None,
            energy: None,
            transmission: None,
            detector_type: None,
            detector_binning_mode: None,
            detector_roi_mode: None,
            beam_position: None,
            beam_size: None,
            beam_shape: None,
            axis_positions_start: BTreeMap::new(),
            axis_positions_end: BTreeMap::new(),
            scan_axis: scan_axis.into(),
            overlap: None,
            num_triggers: None,
            num_images_per_trigger: None,
            scans: Vec::new(),
            file_type: None,
            prefix: None,
            filename_template: None,
            path: None,
        }
    }

    /// A sweep of `scan_axis` from `start` to `end` in steps of `image_width`.
    pub fn sweep(scan_axis: &str, start: f64, end: f64, image_width: f64) -> MxlimsResult<Self> {
        let mut sweep = Self::new(scan_axis);
        sweep.axis_positions_start.insert(scan_axis.to_string(), start);
        sweep.axis_positions_end.insert(scan_axis.to_string(), end);
        sweep.image_width = Some(image_width);
        sweep.validated()
    }

    /// Extent of the sweep along `scan_axis`, end minus start.
    pub fn sweep_range(&self) -> Option<f64> {
        let start = self.axis_positions_start.get(&self.scan_axis)?;
        let end = self.axis_positions_end.get(&self.scan_axis)?;
        Some(end - start)
    }

    /// Number of images implied by the sweep range and image width.
    pub fn default_image_count(&self) -> Option<u64> {
        let width = self.image_width.filter(|w| *w > 0.0)?;
        let count = (self.sweep_range()?.abs() / width).round();
        (count.is_finite() && count >= 0.0).then_some(count as u64)
    }

    /// Scans sorted by acquisition ordinal; ties keep their listed order.
    pub fn scans_in_acquisition_order(&self) -> Vec<&Scan> {
        let mut scans: Vec<&Scan> = self.scans.iter().collect();
        scans.sort_by_key(|scan| scan.ordinal);
        scans
    }

    /// Images across all scans.
    pub fn total_scan_images(&self) -> u64 {
        self.scans.iter().map(|scan| u64::from(scan.num_images)).sum()
    }
}

impl MxlimsRecord for CollectionSweep {
    const RECORD_NAME: &'static str = "CollectionSweep";
    const REQUIRED_FIELDS: &'static [&'static str] = &["mxlims_type", "scan_axis"];
    const FROZEN_FIELDS: &'static [&'static str] = DATASET_FROZEN;

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        check_dataset_fields::<CollectionSweepTag>(v, object);
        v.field::<String>(object, "scan_axis");
        for field in ["exposure_time", "image_width", "energy", "transmission", "overlap"] {
            v.field::<Option<f64>>(object, field);
        }
        for field in [
            "annotation",
            "detector_type",
            "detector_binning_mode",
            "detector_roi_mode",
            "beam_shape",
            "file_type",
            "prefix",
            "filename_template",
            "path",
        ] {
            v.field::<Option<String>>(object, field);
        }
        v.field::<Option<[f64; 2]>>(object, "beam_position");
        v.field::<Option<[f64; 2]>>(object, "beam_size");
        v.field::<BTreeMap<String, f64>>(object, "axis_positions_start");
        v.field::<BTreeMap<String, f64>>(object, "axis_positions_end");
        v.field::<Option<u32>>(object, "num_triggers");
        v.field::<Option<u32>>(object, "num_images_per_trigger");
        v.field::<Vec<Scan>>(object, "scans");
    }

    fn check(&self, v: &mut Validator) {
        check_dataset_links(v, self);
        v.check_min("exposure_time", self.exposure_time, 0.0);
        v.check_min("energy", self.energy, 0.0);
        v.check_range("transmission", self.transmission, 0.0, 100.0);
        v.check_non_blank("scan_axis", &self.scan_axis);
        if !self.axis_positions_end.is_empty() && !self.axis_positions_end.contains_key(&self.scan_axis) {
            v.invalid(
                "axis_positions_end",
                format!("must contain the scan axis {}", self.scan_axis),
            );
        }
        check_records(v, "scans", &self.scans);
    }
}

impl_mxlims_object!(CollectionSweep, MxlimsType::CollectionSweep, dataset);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MxlimsError, ViolationKind};
    use crate::record::{DatasetRecord, MxlimsObject};
    use serde_json::json;

    fn violations(err: MxlimsError) -> crate::ValidationErrors {
        err.validation().cloned().expect("validation error")
    }

    fn omega_json() -> serde_json::Value {
        json!({
            "mxlims_type": "CollectionSweep",
            "scan_axis": "Omega",
            "axis_positions_start": {"Omega": 0.0},
            "axis_positions_end": {"Omega": 180.0},
            "image_width": 0.1,
        })
    }

    #[test]
    fn test_omega_sweep_defaults() {
        let sweep = CollectionSweep::from_value(omega_json()).unwrap();
        assert!(sweep.scans.is_empty());
        assert_eq!(sweep.scan_axis, "Omega");
        assert_eq!(sweep.sweep_range(), Some(180.0));
        assert_eq!(sweep.default_image_count(), Some(1800));
        assert_eq!(sweep.total_scan_images(), 0);
        assert_eq!(sweep.source(), None);
    }

    #[test]
    fn test_scan_axis_required() {
        let errors = violations(CollectionSweep::from_value(json!({})).unwrap_err());
        assert_eq!(errors.len(), 2);
        assert!(errors.has("mxlims_type", ViolationKind::MissingField));
        assert!(errors.has("scan_axis", ViolationKind::MissingField));
    }

    #[test]
    fn test_transmission_boundaries() {
        for ok in [0.0, 100.0, 42.5] {
            let mut value = omega_json();
            value["transmission"] = json!(ok);
            assert!(CollectionSweep::from_value(value).is_ok(), "transmission {}", ok);
        }
        for bad in [-0.001, 100.001] {
            let mut value = omega_json();
            value["transmission"] = json!(bad);
            let errors = violations(CollectionSweep::from_value(value).unwrap_err());
            assert!(errors.has("transmission", ViolationKind::OutOfRange));
        }
    }

    #[test]
    fn test_end_positions_must_include_scan_axis() {
        let mut value = omega_json();
        value["axis_positions_end"] = json!({"Kappa": 30.0});
        let errors = violations(CollectionSweep::from_value(value).unwrap_err());
        assert!(errors.has("axis_positions_end", ViolationKind::InvalidValue));
    }

    #[test]
    fn test_beam_position_is_a_pair() {
        let mut value = omega_json();
        value["beam_position"] = json!([1024.5, 1100.0, 3.0]);
        let errors = violations(CollectionSweep::from_value(value).unwrap_err());
        assert!(errors.has_kind(ViolationKind::WrongType));

        let mut value = omega_json();
        value["beam_position"] = json!([1024.5, 1100.0]);
        let sweep = CollectionSweep::from_value(value).unwrap();
        assert_eq!(sweep.beam_position, Some([1024.5, 1100.0]));
    }

    #[test]
    fn test_every_violation_reported() {
        let mut sweep = CollectionSweep::new(" ");
        sweep.exposure_time = Some(-1.0);
        sweep.energy = Some(-12_700.0);
        sweep.transmission = Some(150.0);
        let errors = sweep.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_scans_in_acquisition_order() {
        let mut sweep = CollectionSweep::sweep("Omega", 0.0, 90.0, 0.5).unwrap();
        sweep.scans = vec![
            Scan::new(45.0, 91, 90, 3),
            Scan::new(0.0, 1, 90, 1),
            Scan::new(90.0, 181, 10, 3),
        ];
        let ordered: Vec<i32> = sweep
            .scans_in_acquisition_order()
            .iter()
            .map(|scan| scan.first_image_no)
            .collect();
        assert_eq!(ordered, vec![1, 91, 181]);
        assert_eq!(sweep.total_scan_images(), 190);
        // declared order is untouched
        assert_eq!(sweep.scans[0].first_image_no, 91);
    }

    #[test]
    fn test_default_image_count_needs_width_and_range() {
        let mut sweep = CollectionSweep::new("Phi");
        assert_eq!(sweep.default_image_count(), None);
        sweep.axis_positions_start.insert("Phi".to_string(), 10.0);
        sweep.axis_positions_end.insert("Phi".to_string(), 20.0);
        assert_eq!(sweep.default_image_count(), None);
        sweep.image_width = Some(0.0);
        assert_eq!(sweep.default_image_count(), None);
        sweep.image_width = Some(0.25);
        assert_eq!(sweep.default_image_count(), Some(40));
    }

    #[test]
    fn test_mutable_and_frozen_assignment() {
        let mut sweep = CollectionSweep::from_value(omega_json()).unwrap();
        sweep.assign("transmission", json!(50.0)).unwrap();
        assert_eq!(sweep.transmission, Some(50.0));

        assert!(sweep.assign("transmission", json!(100.001)).is_err());
        assert_eq!(sweep.transmission, Some(50.0));

        let errors = violations(sweep.assign("role", json!("Result")).unwrap_err());
        assert!(errors.has("role", ViolationKind::ImmutableField));
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let mut sweep = CollectionSweep::sweep("Omega", 0.0, 180.0, 0.1)
            .unwrap()
            .with_role("Result")
            .with_source(MxlimsRef::new(MxlimsType::MXExperiment, new_entity_id()));
        sweep.scans.push(Scan::new(0.0, 1, 1800, 1));
        sweep.beam_size = Some([0.05, 0.02]);
        let decoded = CollectionSweep::from_json(&sweep.to_json().unwrap()).unwrap();
        assert_eq!(decoded, sweep);
        assert_eq!(decoded.uuid(), sweep.uuid());
    }
}
