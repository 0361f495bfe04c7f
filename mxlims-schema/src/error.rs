//! Error types for schema generation and export

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while building or writing schema documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Unknown type: {name} is not registered")]
    UnknownType { name: String },

    #[error("Type {root} cannot be introspected: unresolved reference to {reference}")]
    UnresolvedReference { root: String, reference: String },

    #[error("Failed to serialize schema for {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema text for {name} is not UTF-8: {source}")]
    Encoding {
        name: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
