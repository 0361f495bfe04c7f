//! Type-tagged references between MXLIMS records

use crate::{EntityId, MxlimsType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an MXLIMS record by identifier.
///
/// Stands in for the referenced record wherever embedding it would duplicate
/// data or link records held in separate JSON documents. Resolution is up to
/// the consuming application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "json-schema", derive(utoipa::ToSchema))]
pub struct MxlimsRef {
    /// Type of the referenced record
    pub target_type: MxlimsType,
    /// Permanent unique identifier of the referenced record
    #[cfg_attr(feature = "json-schema", schema(value_type = String, format = "uuid"))]
    pub uuid: EntityId,
}

impl MxlimsRef {
    pub fn new(target_type: MxlimsType, uuid: EntityId) -> Self {
        Self { target_type, uuid }
    }

    /// Check if this reference targets one of `allowed`.
    pub fn targets_any(&self, allowed: &[MxlimsType]) -> bool {
        allowed.contains(&self.target_type)
    }
}

impl fmt::Display for MxlimsRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target_type, self.uuid)
    }
}
