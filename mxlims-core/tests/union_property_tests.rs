//! Property-Based Tests for Collection Member Resolution
//!
//! **Property 1: Embedded Dispatch**
//! A member whose `mxlims_type` names a type of the union decodes as that type.
//!
//! **Property 2: Reference Dispatch**
//! A member whose `target_type` names a type of the union decodes as a reference.
//!
//! **Property 3: Fail Closed**
//! Any other tag, a missing tag, or a non-object member fails decoding.

use mxlims_core::{
    CollectionItem, CollectionSweepItem, DatasetItem, JobItem, LogisticalSampleItem, MXExperiment,
    MxJobItem, MxlimsRecord, MxlimsRef, MxlimsType, ReflectionSetItem, ViolationKind,
};
use mxlims_test_utils::{assertions, generators};
use proptest::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Decode one member, reporting the decoder message on failure.
fn decode<I: DeserializeOwned>(value: Value) -> Result<I, String> {
    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Check reference dispatch for a union against every type name.
fn check_reference<I>(reference: MxlimsRef) -> Result<(), TestCaseError>
where
    I: CollectionItem + DeserializeOwned + std::fmt::Debug,
{
    let value = serde_json::to_value(reference).map_err(|e| TestCaseError::fail(e.to_string()))?;
    match decode::<I>(value) {
        Ok(item) => {
            prop_assert!(I::ALLOWED.contains(&reference.target_type));
            prop_assert_eq!(item.as_reference(), Some(&reference));
        }
        Err(message) => {
            prop_assert!(!I::ALLOWED.contains(&reference.target_type));
            prop_assert!(message.starts_with("disallowed reference target"), "{}", message);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_reference_dispatch(reference in generators::arb_reference()) {
        check_reference::<DatasetItem>(reference)?;
        check_reference::<JobItem>(reference)?;
        check_reference::<LogisticalSampleItem>(reference)?;
        check_reference::<CollectionSweepItem>(reference)?;
        check_reference::<ReflectionSetItem>(reference)?;
        check_reference::<MxJobItem>(reference)?;
    }

    #[test]
    fn prop_embedded_sweep_dispatch(sweep in generators::arb_collection_sweep()) {
        let value = sweep.to_value().unwrap();
        let item: DatasetItem = decode(value.clone()).unwrap();
        prop_assert_eq!(item, DatasetItem::CollectionSweep(sweep.clone()));
        let item: CollectionSweepItem = decode(value.clone()).unwrap();
        prop_assert_eq!(item, CollectionSweepItem::CollectionSweep(sweep));
        prop_assert!(decode::<ReflectionSetItem>(value.clone()).is_err());
        prop_assert!(decode::<JobItem>(value).is_err());
    }

    #[test]
    fn prop_embedded_reflection_set_dispatch(set in generators::arb_reflection_set()) {
        let value = set.to_value().unwrap();
        let item: DatasetItem = decode(value.clone()).unwrap();
        prop_assert_eq!(item.target_type(), MxlimsType::ReflectionSet);
        prop_assert!(decode::<CollectionSweepItem>(value).is_err());
    }

    #[test]
    fn prop_unknown_tags_fail_closed(tag in "[A-Za-z]{1,12}") {
        prop_assume!(tag.parse::<MxlimsType>().is_err());
        let message = decode::<DatasetItem>(json!({"mxlims_type": tag.clone()})).unwrap_err();
        prop_assert!(message.starts_with("unknown discriminator"), "{}", message);
        let message = decode::<JobItem>(json!({"target_type": tag, "uuid": mxlims_core::new_entity_id()})).unwrap_err();
        prop_assert!(message.starts_with("unknown discriminator"), "{}", message);
    }

    #[test]
    fn prop_experiment_results_keep_order(experiment in generators::arb_mx_experiment()) {
        let decoded = MXExperiment::from_value(experiment.to_value().unwrap()).unwrap();
        let kinds: Vec<bool> = decoded.results.iter().map(|item| item.is_reference()).collect();
        let expected: Vec<bool> = experiment.results.iter().map(|item| item.is_reference()).collect();
        prop_assert_eq!(kinds, expected);
    }
}

#[test]
fn test_missing_discriminator_in_record() {
    let result = MXExperiment::from_value(json!({
        "mxlims_type": "MXExperiment",
        "templates": [{"scan_axis": "Omega"}],
    }));
    let errors = assertions::assert_invalid(&result);
    assert!(errors.has_kind(ViolationKind::MissingDiscriminator));
}

#[test]
fn test_non_object_member_rejected() {
    let result = MXExperiment::from_value(json!({
        "mxlims_type": "MXExperiment",
        "reference_data": ["not-a-record"],
    }));
    let errors = assertions::assert_invalid(&result);
    assert!(errors.has_kind(ViolationKind::WrongType));
}

#[test]
fn test_non_string_tag_rejected() {
    let message = decode::<JobItem>(json!({"mxlims_type": 3})).unwrap_err();
    assert!(message.starts_with("unknown discriminator"), "{}", message);
}
