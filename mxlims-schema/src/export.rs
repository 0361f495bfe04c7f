//! Batch export of schema documents to files

use crate::config::ExportConfig;
use crate::error::{SchemaError, SchemaResult};
use crate::registry::SchemaRegistry;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Types whose documents the exporter writes, in order.
pub const EXPORTED_TYPES: &[&str] = &[
    "LogisticalSample",
    "CollectionSweep",
    "ReflectionSet",
    "MXExperiment",
    "MXProcessing",
    "MXSample",
];

/// Render `document` as indented JSON text with a trailing newline.
pub fn render(name: &str, document: &Value, indent_width: usize) -> SchemaResult<String> {
    let indent = vec![b' '; indent_width];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|source| SchemaError::Serialize {
            name: name.to_string(),
            source,
        })?;
    buffer.push(b'\n');
    String::from_utf8(buffer).map_err(|source| SchemaError::Encoding {
        name: name.to_string(),
        source,
    })
}

/// Write the document of each of `names`, stopping at the first failure.
///
/// Returns the paths written.
pub fn export_types(
    registry: &SchemaRegistry,
    names: &[&str],
    config: &ExportConfig,
) -> SchemaResult<Vec<PathBuf>> {
    config.validate()?;

    let mut written = Vec::with_capacity(names.len());
    for name in names {
        let document = registry.document(name)?;
        let text = render(name, &document, config.indent_width)?;
        let path = config.path_for(name);
        std::fs::write(&path, text).map_err(|source| SchemaError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(name = *name, path = %path.display(), "wrote schema");
        written.push(path);
    }
    Ok(written)
}

/// Write the documents of [`EXPORTED_TYPES`].
pub fn export_schemas(config: &ExportConfig) -> SchemaResult<Vec<PathBuf>> {
    export_types(&SchemaRegistry::mxlims(), EXPORTED_TYPES, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_uses_indent_width() {
        let text = render("Sample", &json!({"a": {"b": 1}}), 4).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");

        let text = render("Sample", &json!({"a": 1}), 2).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_exported_types_are_registered() {
        let registry = SchemaRegistry::mxlims();
        for name in EXPORTED_TYPES {
            assert!(registry.contains(name), "{}", name);
        }
    }
}
