//! Value records without identity
//!
//! Unit cells, tensors, quality factors, reflection statistics, scans and
//! sample constituents. These are embedded in entities and validated as
//! part of them.

use crate::error::MxlimsResult;
use crate::record::{check_records, MxlimsRecord};
use crate::validation::Validator;
use crate::QualityFactorType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============================================================================
// UNIT CELL
// ============================================================================

/// Crystallographic unit cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct UnitCell {
    /// A axis length (A)
    #[cfg_attr(feature = "json-schema", schema(exclusive_minimum = 0.0))]
    a: f64,
    /// B axis length (A)
    #[cfg_attr(feature = "json-schema", schema(exclusive_minimum = 0.0))]
    b: f64,
    /// C axis length (A)
    #[cfg_attr(feature = "json-schema", schema(exclusive_minimum = 0.0))]
    c: f64,
    /// alpha angle (degrees)
    #[cfg_attr(
        feature = "json-schema",
        schema(exclusive_minimum = 0.0, exclusive_maximum = 180.0)
    )]
    alpha: f64,
    /// beta angle (degrees)
    #[cfg_attr(
        feature = "json-schema",
        schema(exclusive_minimum = 0.0, exclusive_maximum = 180.0)
    )]
    beta: f64,
    /// gamma angle (degrees)
    #[cfg_attr(
        feature = "json-schema",
        schema(exclusive_minimum = 0.0, exclusive_maximum = 180.0)
    )]
    gamma: f64,
}

impl UnitCell {
    /// Create a validated unit cell. Lengths in A, angles in degrees.
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> MxlimsResult<Self> {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
        .validated()
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Cell volume in cubic A.
    pub fn volume(&self) -> f64 {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        let factor = 1.0 - ca * ca - cb * cb - cg * cg + 2.0 * ca * cb * cg;
        self.a * self.b * self.c * factor.max(0.0).sqrt()
    }
}

impl MxlimsRecord for UnitCell {
    const RECORD_NAME: &'static str = "UnitCell";
    const REQUIRED_FIELDS: &'static [&'static str] = &["a", "b", "c", "alpha", "beta", "gamma"];
    const FROZEN_FIELDS: &'static [&'static str] = &["a", "b", "c", "alpha", "beta", "gamma"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        for field in Self::REQUIRED_FIELDS {
            v.field::<f64>(object, field);
        }
    }

    fn check(&self, v: &mut Validator) {
        v.check_positive("a", Some(self.a));
        v.check_positive("b", Some(self.b));
        v.check_positive("c", Some(self.c));
        v.check_open_range("alpha", Some(self.alpha), 0.0, 180.0);
        v.check_open_range("beta", Some(self.beta), 0.0, 180.0);
        v.check_open_range("gamma", Some(self.gamma), 0.0, 180.0);
    }
}

// ============================================================================
// TENSOR
// ============================================================================

/// Tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Tensor {
    /// Eigenvalues of tensor
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<f64>, min_items = 3, max_items = 3))]
    pub eigenvalues: [f64; 3],
    /// Eigenvectors (unit vectors) of tensor, in same order as eigenvalues
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<Vec<f64>>, min_items = 3, max_items = 3))]
    pub eigenvectors: Vec<[f64; 3]>,
}

impl Tensor {
    pub fn new(eigenvalues: [f64; 3], eigenvectors: [[f64; 3]; 3]) -> Self {
        Self {
            eigenvalues,
            eigenvectors: eigenvectors.to_vec(),
        }
    }
}

impl MxlimsRecord for Tensor {
    const RECORD_NAME: &'static str = "Tensor";
    const REQUIRED_FIELDS: &'static [&'static str] = &["eigenvalues", "eigenvectors"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<[f64; 3]>(object, "eigenvalues");
        v.field::<Vec<[f64; 3]>>(object, "eigenvectors");
    }

    fn check(&self, v: &mut Validator) {
        if self.eigenvectors.len() != 3 {
            v.invalid(
                "eigenvectors",
                format!("expected 3 eigenvectors, found {}", self.eigenvectors.len()),
            );
        }
    }
}

// ============================================================================
// QUALITY FACTORS AND REFLECTION STATISTICS
// ============================================================================

/// Reflection shell quality factor. Enumerated type with associated value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct QualityFactor {
    /// Quality factor type
    #[serde(rename = "type")]
    pub factor_type: QualityFactorType,
    /// Quality factor value
    pub value: f64,
}

impl QualityFactor {
    pub fn new(factor_type: QualityFactorType, value: f64) -> Self {
        Self { factor_type, value }
    }
}

impl MxlimsRecord for QualityFactor {
    const RECORD_NAME: &'static str = "QualityFactor";
    const REQUIRED_FIELDS: &'static [&'static str] = &["type", "value"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<QualityFactorType>(object, "type");
        v.field::<f64>(object, "value");
    }

    fn check(&self, _v: &mut Validator) {}
}

/// Reflection statistics for a shell (or all) of reflections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct ReflectionStatistics {
    /// lower, higher resolution limit of shell - matches mmCIF d_res_high, d_res_low.
    #[cfg_attr(feature = "json-schema", schema(value_type = Vec<f64>, min_items = 2, max_items = 2))]
    pub resolution_limits: [f64; 2],
    /// total number of observations
    pub number_observations: u64,
    /// total number of unique observations
    pub number_unique_observations: u64,
    /// Quality factors for reflection shell
    #[serde(default)]
    pub quality_factors: Vec<QualityFactor>,
    /// Completeness for reflection shell in %, matches mmCIF percent_possible_all.
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0, maximum = 100.0))]
    pub completeness: f64,
    /// Chi-squared statistic for reflection shell, matches mmCIF pdbx_chi_squared
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub chi_squared: Option<f64>,
    /// Number of rejected reflns for reflection shell, matches pdbx_rejects
    pub number_rejected_reflns: Option<u64>,
    /// Redundancy of data collected in this shell - matches mmCIF pdbx_redundancy
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub redundancy: f64,
    /// Redundancy of anomalous data collected in this shell - matches mmCIF pdbx_redundancy_anomalous
    #[cfg_attr(feature = "json-schema", schema(minimum = 0.0))]
    pub redundancy_anomalous: f64,
}

impl ReflectionStatistics {
    /// Statistics with the required values; optional values start empty.
    pub fn new(
        resolution_limits: [f64; 2],
        number_observations: u64,
        number_unique_observations: u64,
        completeness: f64,
        redundancy: f64,
        redundancy_anomalous: f64,
    ) -> MxlimsResult<Self> {
        Self {
            resolution_limits,
            number_observations,
            number_unique_observations,
            quality_factors: Vec::new(),
            completeness,
            chi_squared: None,
            number_rejected_reflns: None,
            redundancy,
            redundancy_anomalous,
        }
        .validated()
    }

    /// First quality factor of the given type.
    pub fn quality_factor(&self, factor_type: QualityFactorType) -> Option<f64> {
        self.quality_factors
            .iter()
            .find(|q| q.factor_type == factor_type)
            .map(|q| q.value)
    }
}

impl MxlimsRecord for ReflectionStatistics {
    const RECORD_NAME: &'static str = "ReflectionStatistics";
    const REQUIRED_FIELDS: &'static [&'static str] = &[
        "resolution_limits",
        "number_observations",
        "number_unique_observations",
        "completeness",
        "redundancy",
        "redundancy_anomalous",
    ];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<[f64; 2]>(object, "resolution_limits");
        for field in ["number_observations", "number_unique_observations"] {
            v.field::<u64>(object, field);
        }
        v.field::<Vec<QualityFactor>>(object, "quality_factors");
        for field in ["completeness", "redundancy", "redundancy_anomalous"] {
            v.field::<f64>(object, field);
        }
        v.field::<Option<f64>>(object, "chi_squared");
        v.field::<Option<u64>>(object, "number_rejected_reflns");
    }

    fn check(&self, v: &mut Validator) {
        v.check_positive("resolution_limits[0]", Some(self.resolution_limits[0]));
        v.check_positive("resolution_limits[1]", Some(self.resolution_limits[1]));
        if self.number_unique_observations > self.number_observations {
            v.invalid(
                "number_unique_observations",
                format!(
                    "{} unique observations exceed {} observations",
                    self.number_unique_observations, self.number_observations
                ),
            );
        }
        check_records(v, "quality_factors", &self.quality_factors);
        v.check_range("completeness", Some(self.completeness), 0.0, 100.0);
        v.check_min("chi_squared", self.chi_squared, 0.0);
        v.check_min("redundancy", Some(self.redundancy), 0.0);
        v.check_min("redundancy_anomalous", Some(self.redundancy_anomalous), 0.0);
    }
}

// ============================================================================
// SCAN
// ============================================================================

/// Subdivision of CollectionSweep.
///
/// The Scan describes a continuously acquired set of images that forms a subset
/// of the CollectionSweep of which they form part. The ordinal gives the
/// acquisition order of sweeps across an entire multi-sweep experiment; this
/// allows you to describe out-of-order acquisition and interleaving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Scan {
    /// Value of scan axis for the first image, in units matching axis type
    pub scan_position_start: f64,
    /// Image number to use for first image
    pub first_image_no: i32,
    /// Number of images to acquire as part of the Scan.
    pub num_images: u32,
    /// Ordinal defining the ordering of all scans within the experiment (not just within the scan)
    pub ordinal: i32,
}

impl Scan {
    pub fn new(scan_position_start: f64, first_image_no: i32, num_images: u32, ordinal: i32) -> Self {
        Self {
            scan_position_start,
            first_image_no,
            num_images,
            ordinal,
        }
    }

    /// Image number of the last image, if the scan has any.
    pub fn last_image_no(&self) -> Option<i64> {
        (self.num_images > 0).then(|| i64::from(self.first_image_no) + i64::from(self.num_images) - 1)
    }
}

impl MxlimsRecord for Scan {
    const RECORD_NAME: &'static str = "Scan";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["scan_position_start", "first_image_no", "num_images", "ordinal"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<f64>(object, "scan_position_start");
        v.field::<i32>(object, "first_image_no");
        v.field::<u32>(object, "num_images");
        v.field::<i32>(object, "ordinal");
    }

    fn check(&self, v: &mut Validator) {
        if !self.scan_position_start.is_finite() {
            v.invalid("scan_position_start", "must be finite");
        }
    }
}

// ============================================================================
// SAMPLE CONSTITUENTS
// ============================================================================

/// Macromolecule - main molecule under investigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Macromolecule {
    /// Acronym - short synonym of macromolecule
    pub acronym: String,
    /// Human readable name of macromolecule
    pub name: Option<String>,
    /// Dictionary str:str of contextName: identifier. contextName could refer to a LIMS,
    /// database, or web site but could also be e.g. 'sequence'
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}

impl Macromolecule {
    pub fn new(acronym: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            name: None,
            identifiers: BTreeMap::new(),
        }
    }
}

impl MxlimsRecord for Macromolecule {
    const RECORD_NAME: &'static str = "Macromolecule";
    const REQUIRED_FIELDS: &'static [&'static str] = &["acronym"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<String>(object, "acronym");
        v.field::<Option<String>>(object, "name");
        v.field::<BTreeMap<String, String>>(object, "identifiers");
    }

    fn check(&self, v: &mut Validator) {
        v.check_non_blank("acronym", &self.acronym);
    }
}

/// Additional component of sample ('ligand')
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct Component {
    /// Acronym - short synonym of component (e.g. 'lig1')
    pub acronym: String,
    /// Human readable name of component
    pub name: Option<String>,
    /// Dictionary str:str of contextName: identifier. contextName will typically refer
    /// to a LIMS, database, or web site but could also be e.g. 'smiles'
    #[serde(default)]
    pub identifiers: BTreeMap<String, String>,
}

impl Component {
    pub fn new(acronym: impl Into<String>) -> Self {
        Self {
            acronym: acronym.into(),
            name: None,
            identifiers: BTreeMap::new(),
        }
    }
}

impl MxlimsRecord for Component {
    const RECORD_NAME: &'static str = "Component";
    const REQUIRED_FIELDS: &'static [&'static str] = &["acronym"];

    fn check_fields(v: &mut Validator, object: &Map<String, Value>) {
        v.field::<String>(object, "acronym");
        v.field::<Option<String>>(object, "name");
        v.field::<BTreeMap<String, String>>(object, "identifiers");
    }

    fn check(&self, v: &mut Validator) {
        v.check_non_blank("acronym", &self.acronym);
    }
}

// =============================================================================
// TESTS
// =============================================================================
