//! End-to-end scenarios over MXLIMS JSON documents.

use mxlims_core::{
    CollectionItem, CollectionSweep, CollectionSweepItem, JobRecord, JobStatus, LogisticalSample,
    MXExperiment, MXProcessing, MXSample, MxlimsObject, MxlimsRecord, MxlimsRef, MxlimsType,
    ReflectionSet, ViolationKind,
};
use mxlims_test_utils::{assertions, fixtures};
use serde_json::json;

// ============================================================================
// COLLECTION SWEEP
// ============================================================================

#[test]
fn test_sweep_without_scans() {
    let sweep = CollectionSweep::from_value(json!({
        "mxlims_type": "CollectionSweep",
        "scan_axis": "Omega",
        "axis_positions_start": {"Omega": 0.0},
        "axis_positions_end": {"Omega": 180.0},
        "image_width": 0.1,
    }))
    .unwrap();
    assert!(sweep.scans.is_empty());
    assert_eq!(sweep.sweep_range(), Some(180.0));
    assert_eq!(sweep.default_image_count(), Some(1800));
    assert_eq!(sweep.to_value().unwrap()["scans"], json!([]));
}

#[test]
fn test_transmission_boundaries() {
    for accepted in [0.0, 100.0, 42.5] {
        let mut sweep = fixtures::omega_sweep();
        sweep.transmission = Some(accepted);
        assertions::assert_valid(&sweep);
    }
    for rejected in [-0.001, 100.001] {
        let mut value = fixtures::omega_sweep().to_value().unwrap();
        value["transmission"] = json!(rejected);
        let result = CollectionSweep::from_value(value);
        assertions::assert_violation(&result, "transmission", ViolationKind::OutOfRange);
    }
}

#[test]
fn test_all_violations_reported() {
    let result = CollectionSweep::from_value(json!({
        "mxlims_type": "CollectionSweep",
        "scan_axis": "Omega",
        "exposure_time": -0.1,
        "energy": -1.0,
        "transmission": 101.0,
        "axis_positions_end": {"Phi": 10.0},
    }));
    let errors = assertions::assert_invalid(&result);
    assert_eq!(errors.len(), 4);
    assert!(errors.has("axis_positions_end", ViolationKind::InvalidValue));
}

#[test]
fn test_wrong_type_and_enum_member() {
    let result = CollectionSweep::from_value(json!({
        "mxlims_type": "CollectionSweep",
        "scan_axis": "Omega",
        "image_width": "wide",
    }));
    assert!(assertions::assert_invalid(&result).has_kind(ViolationKind::WrongType));

    let result = MXProcessing::from_value(json!({
        "mxlims_type": "MXProcessing",
        "job_status": "Paused",
    }));
    assert!(assertions::assert_invalid(&result).has_kind(ViolationKind::InvalidEnumMember));
}

#[test]
fn test_every_wrong_type_is_reported() {
    let result = CollectionSweep::from_value(json!({
        "mxlims_type": "CollectionSweep",
        "scan_axis": "Omega",
        "exposure_time": "long",
        "energy": "high",
    }));
    let errors = assertions::assert_invalid(&result);
    assert_eq!(errors.len(), 2, "{}", errors);
    assert!(errors.has("exposure_time", ViolationKind::WrongType));
    assert!(errors.has("energy", ViolationKind::WrongType));
}

#[test]
fn test_wrong_type_does_not_hide_range_violation() {
    let result = CollectionSweep::from_value(json!({
        "mxlims_type": "CollectionSweep",
        "scan_axis": "Omega",
        "transmission": 150.0,
        "exposure_time": "long",
    }));
    let errors = assertions::assert_invalid(&result);
    assert_eq!(errors.len(), 2, "{}", errors);
    assert!(errors.has("exposure_time", ViolationKind::WrongType));
    assert!(errors.has("transmission", ViolationKind::OutOfRange));
}

#[test]
fn test_scan_ordering() {
    let mut sweep = fixtures::omega_sweep();
    sweep.scans.reverse();
    let ordinals: Vec<i32> = sweep
        .scans_in_acquisition_order()
        .iter()
        .map(|scan| scan.ordinal)
        .collect();
    assert_eq!(ordinals, vec![0, 1]);
}

// ============================================================================
// EXPERIMENT AND PROCESSING
// ============================================================================

#[test]
fn test_experiment_with_literal_and_reference_results() {
    let referenced = mxlims_core::new_entity_id();
    let experiment = MXExperiment::from_value(json!({
        "mxlims_type": "MXExperiment",
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
    }))
    .unwrap();

    assert_eq!(experiment.results.len(), 2);
    assert!(matches!(
        experiment.results[0],
        CollectionSweepItem::CollectionSweep(_)
    ));
    assert_eq!(
        experiment.results[1],
        CollectionSweepItem::Reference(MxlimsRef::new(MxlimsType::CollectionSweep, referenced))
    );
}

#[test]
fn test_nested_result_errors_keep_their_path() {
    let result = MXExperiment::from_value(json!({
        "mxlims_type": "MXExperiment",
        "results": [{"mxlims_type": "CollectionSweep"}],
    }));
    assertions::assert_violation(&result, "results[0].scan_axis", ViolationKind::MissingField);

    let result = MXExperiment::from_value(json!({
        "mxlims_type": "MXExperiment",
        "results": [
            {"mxlims_type": "CollectionSweep", "scan_axis": "Omega", "energy": "high"},
            {"mxlims_type": "Crystal"},
        ],
    }));
    let errors = assertions::assert_invalid(&result);
    assert_eq!(errors.len(), 2, "{}", errors);
    assert!(errors.has("results[0].energy", ViolationKind::WrongType));
    assert!(errors.has("results[1]", ViolationKind::UnknownVariant));
}

#[test]
fn test_experiment_to_processing_pipeline() {
    let sample = fixtures::lysozyme_sample();
    let mut experiment = fixtures::experiment_with_mixed_results();
    experiment.mark_running(chrono::Utc::now());
    experiment
        .mark_finished(JobStatus::Completed, chrono::Utc::now())
        .unwrap();

    let mut processing = MXProcessing::new().with_sample(sample.reference());
    for sweep in &experiment.results {
        processing.input_data.push(sweep.to_reference().into());
    }
    let source = processing.reference();
    processing.results.push(
        fixtures::sample_reflection_set()
            .with_source(source)
            .with_role("Result")
            .into(),
    );

    assertions::assert_valid(&processing);
    assertions::assert_results_sourced(&processing);
    assertions::assert_round_trip(&processing);
    assertions::assert_round_trip(&experiment);
    assert!(processing.input_data.iter().all(CollectionItem::is_reference));
}

#[test]
fn test_finishing_with_non_terminal_status_fails() {
    let mut experiment = MXExperiment::new();
    let result = experiment.mark_finished(JobStatus::Running, chrono::Utc::now());
    assertions::assert_violation(&result, "job_status", ViolationKind::InvalidValue);
    assert_eq!(experiment.job_status, None);
}

#[test]
fn test_back_link_mismatch_is_observable_not_rejected() {
    let mut experiment = MXExperiment::new();
    let foreign = MxlimsRef::new(MxlimsType::MXProcessing, mxlims_core::new_entity_id());
    let sweep = fixtures::omega_sweep().with_source(foreign);
    let id = sweep.uuid();
    experiment.results.push(sweep.into());
    assertions::assert_valid(&experiment);
    assert_eq!(experiment.result_source_mismatches(), vec![id]);
}

#[test]
fn test_dataset_source_must_be_a_job() {
    let sample = MxlimsRef::new(MxlimsType::MXSample, mxlims_core::new_entity_id());
    let set = ReflectionSet::new([0, 1], [0, 1], [0, 1], 10, 5).with_source(sample);
    let errors = set.validate().unwrap_err();
    assert!(errors.has("source", ViolationKind::DisallowedTarget));
}

// ============================================================================
// SAMPLES AND CONTAINMENT
// ============================================================================

#[test]
fn test_sample_shipment() {
    let mut sample = fixtures::lysozyme_sample();
    let mut dewar = fixtures::shipping_dewar();
    dewar.sample = Some(sample.reference());
    sample.logistical_samples.push(dewar.reference().into());
    sample.jobs.push(fixtures::experiment_with_mixed_results().into());

    assertions::assert_valid(&dewar);
    assertions::assert_valid(&sample);
    assertions::assert_round_trip(&sample);
    assertions::assert_round_trip(&dewar);
}

#[test]
fn test_containment_cycle_rejected_on_input() {
    let mut dewar = fixtures::shipping_dewar();
    let own = dewar.reference();
    if let Some(mxlims_core::LogisticalSampleItem::LogisticalSample(puck)) = dewar.contents.first_mut() {
        puck.contents.push(own.into());
    }
    let result = LogisticalSample::from_value(dewar.to_value().unwrap());
    assertions::assert_violation(
        &result,
        "contents[0].contents[2]",
        ViolationKind::CircularContainment,
    );
}

#[test]
fn test_namespace_extensions() {
    let mut sample = MXSample::new();
    sample
        .set_namespace_extension("GPhL", &json!({"strategy_version": 3}))
        .unwrap();
    let decoded = MXSample::from_json(&sample.to_json().unwrap()).unwrap();
    let extension: Option<serde_json::Value> = decoded.namespace_extension("GPhL").unwrap();
    assert_eq!(extension, Some(json!({"strategy_version": 3})));

    let mut value = sample.to_value().unwrap();
    value["namespace_extensions"]["ESRF"] = json!("flat");
    let result = MXSample::from_value(value);
    assertions::assert_violation(&result, "namespace_extensions.ESRF", ViolationKind::WrongType);
}

#[test]
fn test_unknown_field_assignment() {
    let mut sample = MXSample::new();
    let result = sample.assign("crystal_colour", json!("blue"));
    assertions::assert_violation(&result, "crystal_colour", ViolationKind::UnknownField);
}
