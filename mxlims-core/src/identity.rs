//! Identity types for MXLIMS records

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Permanent record identifier.
/// Random (v4) UUIDs, so independent producers never need to coordinate.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Free-form keyword-value extensions.
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// Organisation-keyed extension records. Every value must be a JSON object.
pub type NamespaceExtensions = BTreeMap<String, serde_json::Value>;

/// Generate a new random EntityId.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
