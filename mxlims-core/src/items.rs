//! Collection members: an embedded entity or a reference to one
//!
//! Every list-valued relationship holds one of these unions. On input the
//! member type is chosen by `mxlims_type` (embedded) or `target_type`
//! (reference); a tag naming any type outside the union is rejected.

use crate::crystallography::{CollectionSweep, MXExperiment, MXProcessing, ReflectionSet};
use crate::discriminator::mxlims_union;
use crate::entities::{Dataset, Job, LogisticalSample};

mxlims_union! {
    /// Any Dataset, embedded or referenced.
    DatasetItem { Dataset, CollectionSweep, ReflectionSet }
}

mxlims_union! {
    /// Any Job, embedded or referenced.
    JobItem { Job, MXExperiment, MXProcessing }
}

mxlims_union! {
    /// A LogisticalSample, embedded or referenced.
    LogisticalSampleItem { LogisticalSample }
}

mxlims_union! {
    /// A CollectionSweep, embedded or referenced.
    CollectionSweepItem { CollectionSweep }
}

mxlims_union! {
    /// A ReflectionSet, embedded or referenced.
    ReflectionSetItem { ReflectionSet }
}

mxlims_union! {
    /// A crystallography Job, embedded or referenced.
    MxJobItem { MXExperiment, MXProcessing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CollectionItem, MxlimsObject, MxlimsRecord};
    use crate::validation::Validator;
    use crate::{new_entity_id, MxlimsRef, MxlimsType};
    use serde_json::json;

    #[test]
    fn test_embedded_dataset_members_decode_by_tag() {
        let items: Vec<DatasetItem> = serde_json::from_value(json!([
            {"mxlims_type": "Dataset"},
            {"mxlims_type": "CollectionSweep", "scan_axis": "Phi"},
            {
                "mxlims_type": "ReflectionSet",
                "h_index_range": [-10, 10],
                "k_index_range": [-10, 10],
                "l_index_range": [0, 20],
                "num_reflections": 1000,
                "num_unique_reflections": 400,
            },
        ]))
        .unwrap();
        let types: Vec<_> = items.iter().map(|item| item.target_type()).collect();
        assert_eq!(
            types,
            vec![
                MxlimsType::Dataset,
                MxlimsType::CollectionSweep,
                MxlimsType::ReflectionSet
            ]
        );
        assert!(items.iter().all(|item| !item.is_reference()));
    }

    #[test]
    fn test_reference_member_serializes_as_reference() {
        let id = new_entity_id();
        let item = JobItem::from(MxlimsRef::new(MxlimsType::MXProcessing, id));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"target_type": "MXProcessing", "uuid": id.to_string()}));
        assert_eq!(item.uuid(), id);
        assert_eq!(item.embedded_source(), None);
    }

    #[test]
    fn test_embedded_member_serializes_as_entity() {
        let job = Job::new();
        let id = job.uuid();
        let value = serde_json::to_value(JobItem::from(job)).unwrap();
        assert_eq!(value["mxlims_type"], json!("Job"));
        assert_eq!(value["uuid"], json!(id.to_string()));
    }

    #[test]
    fn test_reference_outside_union_rejected() {
        let err = serde_json::from_value::<MxJobItem>(json!({
            "target_type": "Job",
            "uuid": new_entity_id().to_string(),
        }))
        .unwrap_err();
        assert!(err.to_string().starts_with("disallowed reference target"));
    }

    #[test]
    fn test_embedded_source_reported_for_datasets() {
        let experiment = MXExperiment::new();
        let sweep = CollectionSweep::new("Omega").with_source(experiment.reference());
        let item = CollectionSweepItem::from(sweep);
        assert_eq!(item.embedded_source(), Some(&experiment.reference()));
        assert_eq!(item.to_reference().target_type, MxlimsType::CollectionSweep);
    }

    #[test]
    fn test_reference_check_uses_union_members() {
        // built in code, so the decoder never saw it
        let stray = LogisticalSampleItem::from(MxlimsRef::new(MxlimsType::Dataset, new_entity_id()));
        let mut v = Validator::new("test");
        v.nested("contents", Some(0), |v| stray.check(v));
        let errors = v.finish().unwrap_err();
        assert!(errors.has("contents[0]", crate::ViolationKind::DisallowedTarget));
    }

    #[test]
    fn test_embedded_member_checked_as_record() {
        let mut sweep = CollectionSweep::new("Omega");
        sweep.exposure_time = Some(-1.0);
        assert!(sweep.validate().is_err());
        let item = DatasetItem::from(sweep);
        let mut v = Validator::new("test");
        item.check(&mut v);
        assert_eq!(v.error_count(), 1);
    }
}
