//! MXLIMS Core - Record Types
//!
//! Typed records for the MXLIMS macromolecular crystallography data model:
//! generic LIMS entities (Datasets, Jobs, Logistical and Prepared Samples),
//! their crystallography specializations, and the value types they carry.
//!
//! Every record decodes from and encodes to the MXLIMS JSON form through
//! [`MxlimsRecord`], and is checked against its constraints on the way in.
//! Records link to each other by embedding or by [`MxlimsRef`], and collection
//! members are resolved by their `mxlims_type` or `target_type` tag.

mod enums;
mod identity;
mod reference;

pub mod crystallography;
pub mod discriminator;
pub mod entities;
pub mod error;
pub mod items;
pub mod record;
pub mod shape;
pub mod validation;
pub mod values;

pub use crystallography::{
    CollectionSweep, CollectionSweepTag, MXExperiment, MXExperimentTag, MXProcessing,
    MXProcessingTag, MXSample, MXSampleTag, ReflectionSet, ReflectionSetTag,
};
pub use discriminator::{resolve_discriminator, Discriminated};
pub use entities::{
    Dataset, DatasetTag, Job, JobTag, LogisticalSample, LogisticalSampleTag, PreparedSample,
    PreparedSampleTag,
};
pub use enums::{
    JobStatus, JobStatusParseError, MxlimsType, MxlimsTypeParseError, PdbxSignalType,
    QualityFactorType, ReflectionBinningMode,
};
pub use error::{
    DiscriminatorError, MxlimsError, MxlimsResult, ValidationError, ValidationErrors,
    ViolationKind,
};
pub use identity::{new_entity_id, EntityId, Extensions, NamespaceExtensions, Timestamp};
pub use items::{
    CollectionSweepItem, DatasetItem, JobItem, LogisticalSampleItem, MxJobItem, ReflectionSetItem,
};
pub use record::{
    check_items, check_records, CollectionItem, DatasetRecord, JobRecord, MxlimsObject,
    MxlimsRecord,
};
pub use reference::MxlimsRef;
pub use shape::Shape;
pub use validation::Validator;
pub use values::{
    Component, Macromolecule, QualityFactor, ReflectionStatistics, Scan, Tensor, UnitCell,
};
