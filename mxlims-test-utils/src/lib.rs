//! MXLIMS Test Utilities
//!
//! Shared test infrastructure for the MXLIMS workspace:
//! - Proptest generators for records and value types
//! - Fixtures for common crystallography scenarios
//! - Assertions for validation outcomes

// Re-export core types for convenience
pub use mxlims_core::{
    CollectionItem, CollectionSweep, Component, DatasetRecord, EntityId, JobRecord, JobStatus,
    LogisticalSample, Macromolecule, MXExperiment, MXProcessing, MXSample, MxlimsError,
    MxlimsObject, MxlimsRecord, MxlimsRef, MxlimsResult, MxlimsType, QualityFactor,
    QualityFactorType, ReflectionSet, ReflectionStatistics, Scan, Timestamp, UnitCell,
    ValidationErrors, ViolationKind,
};

use chrono::Utc;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating MXLIMS records.
    //!
    //! Floating-point values are drawn from decimal grids so that they survive
    //! a JSON round trip exactly.

    use super::*;
    use proptest::prelude::*;

    // === Scalar Generators ===

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a Timestamp with whole-second precision (2020-2030).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1577836800i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    /// Generate a value on a grid of `1/scale` steps within `[lo, hi]`.
    pub fn arb_grid(lo: i64, hi: i64, scale: f64) -> impl Strategy<Value = f64> {
        (lo..=hi).prop_map(move |n| n as f64 / scale)
    }

    /// Generate a percentage in [0, 100] with one decimal.
    pub fn arb_percentage() -> impl Strategy<Value = f64> {
        arb_grid(0, 1000, 10.0)
    }

    // === Enum Generators ===

    /// Generate an MxlimsType variant.
    pub fn arb_mxlims_type() -> impl Strategy<Value = MxlimsType> {
        prop::sample::select(MxlimsType::ALL.to_vec())
    }

    /// Generate a JobStatus variant.
    pub fn arb_job_status() -> impl Strategy<Value = JobStatus> {
        prop_oneof![
            Just(JobStatus::Template),
            Just(JobStatus::Ready),
            Just(JobStatus::Running),
            Just(JobStatus::Completed),
            Just(JobStatus::Failed),
            Just(JobStatus::Aborted),
        ]
    }

    /// Generate a QualityFactorType variant.
    pub fn arb_quality_factor_type() -> impl Strategy<Value = QualityFactorType> {
        prop_oneof![
            Just(QualityFactorType::RMerge),
            Just(QualityFactorType::RMeas),
            Just(QualityFactorType::RPim),
            Just(QualityFactorType::IOverSigI),
            Just(QualityFactorType::CcHalf),
            Just(QualityFactorType::CcAno),
            Just(QualityFactorType::SigAno),
            Just(QualityFactorType::Completeness),
            Just(QualityFactorType::Redundancy),
        ]
    }

    /// Generate a reference to any record type.
    pub fn arb_reference() -> impl Strategy<Value = MxlimsRef> {
        (arb_mxlims_type(), arb_uuid()).prop_map(|(target_type, uuid)| MxlimsRef::new(target_type, uuid))
    }

    /// Generate a reference to one of `allowed`.
    pub fn arb_reference_to(allowed: &'static [MxlimsType]) -> impl Strategy<Value = MxlimsRef> {
        (prop::sample::select(allowed.to_vec()), arb_uuid())
            .prop_map(|(target_type, uuid)| MxlimsRef::new(target_type, uuid))
    }

    // === Value Type Generators ===

    /// Generate a valid UnitCell.
    pub fn arb_unit_cell() -> impl Strategy<Value = UnitCell> {
        (
            arb_grid(100, 3000, 10.0),
            arb_grid(100, 3000, 10.0),
            arb_grid(100, 3000, 10.0),
            arb_grid(600, 1200, 10.0),
            arb_grid(600, 1200, 10.0),
            arb_grid(600, 1200, 10.0),
        )
            .prop_filter_map("unit cell out of range", |(a, b, c, alpha, beta, gamma)| {
                UnitCell::new(a, b, c, alpha, beta, gamma).ok()
            })
    }

    /// Generate a Scan.
    pub fn arb_scan() -> impl Strategy<Value = Scan> {
        (arb_grid(-3600, 3600, 10.0), 1i32..1000, 1u32..3600, 0i32..20).prop_map(
            |(start, first_image_no, num_images, ordinal)| {
                Scan::new(start, first_image_no, num_images, ordinal)
            },
        )
    }

    /// Generate a QualityFactor.
    pub fn arb_quality_factor() -> impl Strategy<Value = QualityFactor> {
        (arb_quality_factor_type(), arb_grid(0, 10000, 100.0))
            .prop_map(|(factor_type, value)| QualityFactor::new(factor_type, value))
    }

    /// Generate a valid ReflectionStatistics shell.
    pub fn arb_reflection_statistics() -> impl Strategy<Value = ReflectionStatistics> {
        (
            5i64..300,
            10i64..5000,
            1u64..100_000,
            0u64..500_000,
            arb_percentage(),
            arb_grid(0, 500, 10.0),
            arb_grid(0, 500, 10.0),
            prop::collection::vec(arb_quality_factor(), 0..4),
        )
            .prop_filter_map(
                "reflection statistics out of range",
                |(high, width, unique, extra, completeness, redundancy, anomalous, factors)| {
                    // limits in hundredths of an A, summed before scaling
                    let mut stats = ReflectionStatistics::new(
                        [(high + width) as f64 / 100.0, high as f64 / 100.0],
                        unique + extra,
                        unique,
                        completeness,
                        redundancy,
                        anomalous,
                    )
                    .ok()?;
                    stats.quality_factors = factors;
                    Some(stats)
                },
            )
    }

    /// Generate an ordered Miller index range.
    pub fn arb_index_range() -> impl Strategy<Value = [i32; 2]> {
        (-100i32..=0, 0i32..=100).prop_map(|(lo, hi)| [lo, hi])
    }

    // === Record Generators ===

    /// Generate a valid CollectionSweep with a consistent scan range.
    pub fn arb_collection_sweep() -> impl Strategy<Value = CollectionSweep> {
        (
            prop::sample::select(vec!["Omega", "Kappa", "Phi"]),
            -1800i64..=1800,
            1i64..=3600,
            arb_grid(1, 100, 100.0),
            prop::option::of(arb_grid(0, 1000, 1000.0)),
            prop::option::of(arb_percentage()),
            prop::option::of(arb_grid(5000, 25000, 1.0)),
            prop::collection::vec(arb_scan(), 0..4),
        )
            .prop_filter_map(
                "sweep out of range",
                |(axis, start, range, width, exposure, transmission, energy, scans)| {
                    let (end, start) = ((start + range) as f64 / 10.0, start as f64 / 10.0);
                    let mut sweep = CollectionSweep::sweep(axis, start, end, width).ok()?;
                    sweep.exposure_time = exposure;
                    sweep.transmission = transmission;
                    sweep.energy = energy;
                    sweep.scans = scans;
                    Some(sweep)
                },
            )
    }

    /// Generate a valid ReflectionSet.
    pub fn arb_reflection_set() -> impl Strategy<Value = ReflectionSet> {
        (
            arb_index_range(),
            arb_index_range(),
            arb_index_range(),
            1u64..100_000,
            0u64..1_000_000,
            prop::option::of(arb_unit_cell()),
            prop::option::of(arb_reflection_statistics()),
            prop::collection::vec(arb_reflection_statistics(), 0..4),
            any::<bool>(),
        )
            .prop_map(
                |(h, k, l, unique, extra, unit_cell, overall, shells, anisotropic)| {
                    let mut set = ReflectionSet::new(h, k, l, unique + extra, unique);
                    set.unit_cell = unit_cell;
                    set.overall_refln_statistics = overall;
                    set.refln_shells = shells;
                    set.anisotropic_diffraction = anisotropic;
                    set
                },
            )
    }

    /// Generate a valid MXExperiment whose embedded results name it as source.
    pub fn arb_mx_experiment() -> impl Strategy<Value = MXExperiment> {
        (
            prop::option::of(arb_uuid()),
            prop::option::of(prop::sample::select(vec!["OSC", "Helical", "MXPressE"])),
            prop::option::of(arb_percentage()),
            prop::option::of(arb_grid(0, 500, 10.0)),
            prop::option::of(arb_unit_cell()),
            prop::option::of(arb_job_status()),
            prop::collection::vec(arb_collection_sweep(), 0..3),
            prop::collection::vec(arb_uuid(), 0..3),
        )
            .prop_map(
                |(sample, strategy, completeness, dose, unit_cell, status, sweeps, referenced)| {
                    let mut experiment = MXExperiment::new();
                    if let Some(id) = sample {
                        experiment = experiment.with_sample(MxlimsRef::new(MxlimsType::MXSample, id));
                    }
                    experiment.experiment_strategy = strategy.map(str::to_string);
                    experiment.target_completeness = completeness;
                    experiment.dose_budget = dose;
                    experiment.unit_cell = unit_cell;
                    experiment.job_status = status;
                    let source = experiment.reference();
                    for sweep in sweeps {
                        experiment.results.push(sweep.with_source(source).with_role("Result").into());
                    }
                    for id in referenced {
                        experiment
                            .results
                            .push(MxlimsRef::new(MxlimsType::CollectionSweep, id).into());
                    }
                    experiment
                },
            )
    }

    /// Generate a valid MXSample.
    pub fn arb_mx_sample() -> impl Strategy<Value = MXSample> {
        (
            prop::option::of("[A-Z]{2,6}"),
            prop::collection::vec("[a-z]{3}[0-9]", 0..3),
            prop::option::of(arb_grid(0, 100, 100.0)),
            prop::option::of(arb_unit_cell()),
            prop::collection::btree_map("[a-zA-Z]{3,10}", "[a-z0-9]{1,12}", 0..3),
        )
            .prop_map(|(acronym, components, sensitivity, unit_cell, identifiers)| {
                let mut sample = MXSample::new();
                sample.macromolecule = acronym.map(Macromolecule::new);
                sample.components = components.into_iter().map(Component::new).collect();
                sample.radiation_sensitivity = sensitivity;
                sample.unit_cell = unit_cell;
                sample.identifiers = identifiers;
                sample
            })
    }

    /// Generate a containment tree: a root holding children, each holding
    /// the given number of grandchildren. Every back-link is set.
    pub fn arb_logistical_sample_tree() -> impl Strategy<Value = LogisticalSample> {
        prop::collection::vec(0usize..4, 0..4).prop_map(|shape| {
            let mut root = LogisticalSample::new();
            for grandchildren in shape {
                let mut child = LogisticalSample::new();
                for _ in 0..grandchildren {
                    child.contain(LogisticalSample::new());
                }
                root.contain(child);
            }
            root
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made records for common scenarios.

    use super::*;

    /// A 180 degree omega sweep in 0.1 degree images.
    pub fn omega_sweep() -> CollectionSweep {
        let mut sweep = CollectionSweep::new("Omega");
        sweep.axis_positions_start.insert("Omega".to_string(), 0.0);
        sweep.axis_positions_start.insert("Kappa".to_string(), 0.0);
        sweep.axis_positions_end.insert("Omega".to_string(), 180.0);
        sweep.image_width = Some(0.1);
        sweep.exposure_time = Some(0.02);
        sweep.energy = Some(12700.0);
        sweep.transmission = Some(50.0);
        sweep.scans.push(Scan::new(0.0, 1, 900, 0));
        sweep.scans.push(Scan::new(90.0, 901, 900, 1));
        sweep
    }

    /// Tetragonal lysozyme cell.
    pub fn lysozyme_cell() -> UnitCell {
        UnitCell::new(79.1, 79.1, 38.0, 90.0, 90.0, 90.0).unwrap_or_else(|e| panic!("{}", e))
    }

    /// A processed reflection set with overall statistics and two shells.
    pub fn sample_reflection_set() -> ReflectionSet {
        let stats = |limits: [f64; 2], obs, unique, completeness| {
            ReflectionStatistics::new(limits, obs, unique, completeness, 6.5, 3.4)
                .unwrap_or_else(|e| panic!("{}", e))
        };
        let mut set = ReflectionSet::new([-45, 45], [-45, 45], [0, 22], 420_000, 64_000);
        set.unit_cell = Some(lysozyme_cell());
        set.space_group_name = Some("P 43 21 2".to_string());
        let mut overall = stats([39.5, 1.5], 420_000, 64_000, 99.2);
        overall
            .quality_factors
            .push(QualityFactor::new(QualityFactorType::CcHalf, 99.8));
        set.overall_refln_statistics = Some(overall);
        set.refln_shells.push(stats([39.5, 4.07], 23_000, 3_500, 99.9));
        set.refln_shells.push(stats([1.53, 1.5], 19_000, 3_100, 97.0));
        set
    }

    /// An MXSample of lysozyme.
    pub fn lysozyme_sample() -> MXSample {
        let mut sample = MXSample::new();
        sample.macromolecule = Some(Macromolecule::new("HEWL"));
        sample.unit_cell = Some(lysozyme_cell());
        sample.space_group_name = Some("P 43 21 2".to_string());
        sample.radiation_sensitivity = Some(0.5);
        sample
    }

    /// An experiment with one embedded result sourced from it, then one reference.
    pub fn experiment_with_mixed_results() -> MXExperiment {
        let mut experiment = MXExperiment::new()
            .with_sample(lysozyme_sample().reference());
        experiment.experiment_strategy = Some("OSC".to_string());
        let source = experiment.reference();
        experiment
            .results
            .push(omega_sweep().with_source(source).with_role("Result").into());
        experiment
            .results
            .push(MxlimsRef::new(MxlimsType::CollectionSweep, mxlims_core::new_entity_id()).into());
        experiment
    }

    /// A dewar holding one puck holding two pins.
    pub fn shipping_dewar() -> LogisticalSample {
        let mut puck = LogisticalSample::new();
        puck.contain(LogisticalSample::new());
        puck.contain(LogisticalSample::new());
        let mut dewar = LogisticalSample::new();
        dewar.contain(puck);
        dewar
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for validation outcomes.

    use super::*;

    /// Assert that a record passes validation.
    #[track_caller]
    pub fn assert_valid<R: MxlimsRecord>(record: &R) {
        if let Err(errors) = record.validate() {
            panic!("Expected valid record: {}", errors);
        }
    }

    /// Assert that a result failed validation.
    #[track_caller]
    pub fn assert_invalid<T: std::fmt::Debug>(result: &MxlimsResult<T>) -> &ValidationErrors {
        match result {
            Err(MxlimsError::Validation(errors)) => errors,
            other => panic!("Expected validation failure, got {:?}", other),
        }
    }

    /// Assert that a result failed with a violation of `kind` at `field`.
    #[track_caller]
    pub fn assert_violation<T: std::fmt::Debug>(
        result: &MxlimsResult<T>,
        field: &str,
        kind: ViolationKind,
    ) {
        let errors = assert_invalid(result);
        assert!(
            errors.has(field, kind),
            "Expected {:?} at {}, got: {}",
            kind,
            field,
            errors
        );
    }

    /// Assert that a record survives an encode and decode unchanged.
    #[track_caller]
    pub fn assert_round_trip<R>(record: &R)
    where
        R: MxlimsRecord + PartialEq + std::fmt::Debug,
    {
        let json = match record.to_json() {
            Ok(json) => json,
            Err(e) => panic!("Encoding failed: {}", e),
        };
        match R::from_json(&json) {
            Ok(decoded) => assert_eq!(&decoded, record, "Record changed in round trip"),
            Err(e) => panic!("Decoding failed: {}\n{}", e, json),
        }
    }

    /// Assert that every embedded result of a Job names the Job as source.
    #[track_caller]
    pub fn assert_results_sourced<J: JobRecord>(job: &J) {
        let stray = job.result_source_mismatches();
        assert!(stray.is_empty(), "Results with foreign source: {:?}", stray);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_omega_sweep_fixture() {
        let sweep = fixtures::omega_sweep();
        assertions::assert_valid(&sweep);
        assert_eq!(sweep.default_image_count(), Some(1800));
        assert_eq!(sweep.total_scan_images(), 1800);
    }

    #[test]
    fn test_sample_reflection_set_fixture() {
        let set = fixtures::sample_reflection_set();
        assertions::assert_valid(&set);
        assert_eq!(set.high_resolution_limit(), Some(1.5));
    }

    #[test]
    fn test_experiment_fixture() {
        let experiment = fixtures::experiment_with_mixed_results();
        assertions::assert_valid(&experiment);
        assertions::assert_results_sourced(&experiment);
        assert!(!experiment.results[0].is_reference());
        assert!(experiment.results[1].is_reference());
    }

    #[test]
    fn test_shipping_dewar_fixture() {
        let dewar = fixtures::shipping_dewar();
        assertions::assert_valid(&dewar);
        assert_eq!(dewar.descendant_ids().len(), 3);
    }

    #[test]
    fn test_assert_violation() {
        let result = UnitCell::new(79.1, 79.1, -38.0, 90.0, 90.0, 90.0);
        assertions::assert_violation(&result, "c", ViolationKind::OutOfRange);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_sweeps_are_valid(sweep in generators::arb_collection_sweep()) {
            assertions::assert_valid(&sweep);
        }

        #[test]
        fn prop_generated_reflection_sets_are_valid(set in generators::arb_reflection_set()) {
            assertions::assert_valid(&set);
        }

        #[test]
        fn prop_generated_experiments_are_valid(experiment in generators::arb_mx_experiment()) {
            assertions::assert_valid(&experiment);
            assertions::assert_results_sourced(&experiment);
        }

        #[test]
        fn prop_generated_samples_are_valid(sample in generators::arb_mx_sample()) {
            assertions::assert_valid(&sample);
        }

        #[test]
        fn prop_generated_trees_are_valid(tree in generators::arb_logistical_sample_tree()) {
            assertions::assert_valid(&tree);
        }
    }
}
