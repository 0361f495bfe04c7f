//! Macromolecular crystallography specializations
//!
//! Each type narrows one of the generic entities: [`CollectionSweep`] and
//! [`ReflectionSet`] are Datasets, [`MXExperiment`] and [`MXProcessing`] are
//! Jobs, and [`MXSample`] is a PreparedSample. Relationship fields are narrowed
//! to the matching crystallography types.

mod experiment;
mod processing;
mod reflection;
mod sample;
mod sweep;

pub use experiment::{MXExperiment, MXExperimentTag};
pub use processing::{MXProcessing, MXProcessingTag};
pub use reflection::{ReflectionSet, ReflectionSetTag};
pub use sample::{MXSample, MXSampleTag};
pub use sweep::{CollectionSweep, CollectionSweepTag};
