//! MXLIMS Schema - JSON Schema Export
//!
//! Builds self-contained JSON Schema documents from the schema descriptions
//! derived in mxlims-core, and writes one `<Type>_schema.json` file per
//! exported record type.

pub mod config;
pub mod error;
pub mod export;
pub mod registry;

pub use config::{ConfigError, ExportConfig};
pub use error::{SchemaError, SchemaResult};
pub use export::{export_schemas, export_types, render, EXPORTED_TYPES};
pub use registry::{SchemaRegistry, SCHEMA_DIALECT};
