//! Enumerated vocabularies for MXLIMS records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TYPE DISCRIMINATORS
// ============================================================================

/// Names of the concrete MXLIMS record types.
///
/// Used as the value of `mxlims_type` on embedded records and of `target_type`
/// on references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub enum MxlimsType {
    Dataset,
    Job,
    LogisticalSample,
    PreparedSample,
    CollectionSweep,
    ReflectionSet,
    MXExperiment,
    MXProcessing,
    MXSample,
}

impl MxlimsType {
    /// Every known type name, in declaration order.
    pub const ALL: [MxlimsType; 9] = [
        MxlimsType::Dataset,
        MxlimsType::Job,
        MxlimsType::LogisticalSample,
        MxlimsType::PreparedSample,
        MxlimsType::CollectionSweep,
        MxlimsType::ReflectionSet,
        MxlimsType::MXExperiment,
        MxlimsType::MXProcessing,
        MxlimsType::MXSample,
    ];

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MxlimsType::Dataset => "Dataset",
            MxlimsType::Job => "Job",
            MxlimsType::LogisticalSample => "LogisticalSample",
            MxlimsType::PreparedSample => "PreparedSample",
            MxlimsType::CollectionSweep => "CollectionSweep",
            MxlimsType::ReflectionSet => "ReflectionSet",
            MxlimsType::MXExperiment => "MXExperiment",
            MxlimsType::MXProcessing => "MXProcessing",
            MxlimsType::MXSample => "MXSample",
        }
    }

    /// True for Dataset and its specializations.
    pub fn is_dataset(&self) -> bool {
        matches!(
            self,
            MxlimsType::Dataset | MxlimsType::CollectionSweep | MxlimsType::ReflectionSet
        )
    }

    /// True for Job and its specializations.
    pub fn is_job(&self) -> bool {
        matches!(
            self,
            MxlimsType::Job | MxlimsType::MXExperiment | MxlimsType::MXProcessing
        )
    }

    /// True for PreparedSample and its specializations.
    pub fn is_prepared_sample(&self) -> bool {
        matches!(self, MxlimsType::PreparedSample | MxlimsType::MXSample)
    }
}

impl fmt::Display for MxlimsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MxlimsType {
    type Err = MxlimsTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MxlimsType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| MxlimsTypeParseError(s.to_string()))
    }
}

/// Error when parsing an unknown MXLIMS type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxlimsTypeParseError(pub String);

impl fmt::Display for MxlimsTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown MXLIMS type: {}", self.0)
    }
}

impl std::error::Error for MxlimsTypeParseError {}

// ============================================================================
// JOB STATUS
// ============================================================================

/// Status of a Job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub enum JobStatus {
    Template,
    Ready,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Template => "Template",
            JobStatus::Ready => "Ready",
            JobStatus::Running => "Running",
            JobStatus::Completed => "Completed",
            JobStatus::Failed => "Failed",
            JobStatus::Aborted => "Aborted",
        }
    }

    /// Check if the job can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Aborted
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = JobStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Template" => Ok(JobStatus::Template),
            "Ready" => Ok(JobStatus::Ready),
            "Running" => Ok(JobStatus::Running),
            "Completed" => Ok(JobStatus::Completed),
            "Failed" => Ok(JobStatus::Failed),
            "Aborted" => Ok(JobStatus::Aborted),
            _ => Err(JobStatusParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid job status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatusParseError(pub String);

impl fmt::Display for JobStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid job status: {}", self.0)
    }
}

impl std::error::Error for JobStatusParseError {}

// ============================================================================
// CRYSTALLOGRAPHY VOCABULARIES
// ============================================================================

/// Name for quality factor type, used in QualityFactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub enum QualityFactorType {
    #[serde(rename = "R(merge)")]
    RMerge,
    #[serde(rename = "R(meas)")]
    RMeas,
    #[serde(rename = "R(pim)")]
    RPim,
    #[serde(rename = "I/SigI")]
    IOverSigI,
    #[serde(rename = "CC(1/2)")]
    CcHalf,
    #[serde(rename = "CC(ano)")]
    CcAno,
    SigAno,
    Completeness,
    Redundancy,
}

/// Observability criterion. Matches mmCIF refln.pdbx_signal_status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub enum PdbxSignalType {
    #[serde(rename = "local <I/sigmaI>")]
    IOverSigma,
    #[serde(rename = "local wCC_half")]
    WccHalf,
}

/// Reflection binning mode for binning reflection statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReflectionBinningMode {
    EqualVolume,
    EqualNumber,
    DstarEquidistant,
    Dstar2Equidistant,
}
