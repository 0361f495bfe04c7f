//! Schema registry and JSON Schema document builder
//!
//! The registry maps type names to the schema generators derived in
//! mxlims-core. A document is self-contained: every type the root refers to,
//! directly or transitively, is placed under `$defs` and references are
//! rewritten to point there.

use crate::error::{SchemaError, SchemaResult};
use mxlims_core::{
    CollectionSweep, CollectionSweepItem, Component, Dataset, DatasetItem, Job, JobItem,
    JobStatus, LogisticalSample, LogisticalSampleItem, MXExperiment, MXProcessing, MXSample,
    Macromolecule, MxJobItem, MxlimsRef, MxlimsType, PdbxSignalType, PreparedSample,
    QualityFactor, QualityFactorType, ReflectionBinningMode, ReflectionSet, ReflectionSetItem,
    ReflectionStatistics, Scan, Tensor, UnitCell,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::openapi::schema::Schema;
use utoipa::openapi::RefOr;
use utoipa::{PartialSchema, ToSchema};

/// JSON Schema dialect of every generated document.
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Prefix of the component references emitted by the derives.
const COMPONENT_PREFIX: &str = "#/components/schemas/";

type SchemaFn = fn() -> RefOr<Schema>;

/// Named schema generators.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, SchemaFn>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every MXLIMS record, enum, reference and union type.
    pub fn mxlims() -> Self {
        let mut registry = Self::new();
        registry
            // entities
            .register::<Dataset>()
            .register::<Job>()
            .register::<LogisticalSample>()
            .register::<PreparedSample>()
            .register::<CollectionSweep>()
            .register::<ReflectionSet>()
            .register::<MXExperiment>()
            .register::<MXProcessing>()
            .register::<MXSample>()
            // value types
            .register::<UnitCell>()
            .register::<Tensor>()
            .register::<QualityFactor>()
            .register::<ReflectionStatistics>()
            .register::<Scan>()
            .register::<Macromolecule>()
            .register::<Component>()
            // enumerations
            .register::<MxlimsType>()
            .register::<JobStatus>()
            .register::<QualityFactorType>()
            .register::<PdbxSignalType>()
            .register::<ReflectionBinningMode>()
            // references and collection members
            .register::<MxlimsRef>()
            .register::<DatasetItem>()
            .register::<JobItem>()
            .register::<LogisticalSampleItem>()
            .register::<CollectionSweepItem>()
            .register::<ReflectionSetItem>()
            .register::<MxJobItem>();
        registry
    }

    /// Register `T` under its schema name.
    pub fn register<T: ToSchema>(&mut self) -> &mut Self {
        self.schemas
            .insert(T::name().into_owned(), <T as PartialSchema>::schema);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// The bare schema of `name`, with component references left as emitted.
    pub fn schema_value(&self, name: &str) -> SchemaResult<Value> {
        let generate = self.schemas.get(name).ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })?;
        serde_json::to_value(generate()).map_err(|source| SchemaError::Serialize {
            name: name.to_string(),
            source,
        })
    }

    /// A self-contained JSON Schema document for `name`.
    pub fn document(&self, name: &str) -> SchemaResult<Value> {
        let mut root = self.schema_value(name)?;
        let mut pending = Vec::new();
        rewrite_refs(&mut root, name, &mut pending);

        let mut defs = Map::new();
        while let Some(reference) = pending.pop() {
            if defs.contains_key(&reference) {
                continue;
            }
            let mut schema = match self.schema_value(&reference) {
                Ok(schema) => schema,
                Err(SchemaError::UnknownType { .. }) => {
                    return Err(SchemaError::UnresolvedReference {
                        root: name.to_string(),
                        reference,
                    })
                }
                Err(e) => return Err(e),
            };
            rewrite_refs(&mut schema, name, &mut pending);
            defs.insert(reference, schema);
        }

        let mut document = Map::new();
        document.insert("$schema".to_string(), Value::String(SCHEMA_DIALECT.to_string()));
        document.insert("title".to_string(), Value::String(name.to_string()));
        match root {
            Value::Object(fields) => document.extend(fields),
            other => {
                document.insert("allOf".to_string(), Value::Array(vec![other]));
            }
        }
        let definitions = defs.len();
        if !defs.is_empty() {
            document.insert("$defs".to_string(), Value::Object(defs));
        }

        tracing::debug!(name, definitions, "built schema document");
        Ok(Value::Object(document))
    }
}

/// Point component references at `$defs`, or at the document root for
/// `root` itself, collecting the names referred to.
fn rewrite_refs(value: &mut Value, root: &str, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                if let Some(name) = reference.strip_prefix(COMPONENT_PREFIX) {
                    let name = name.to_string();
                    if name == root {
                        *reference = "#".to_string();
                    } else {
                        *reference = format!("#/$defs/{}", name);
                        found.push(name);
                    }
                }
            }
            for child in map.values_mut() {
                rewrite_refs(child, root, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_refs(item, root, found);
            }
        }
        _ => {}
    }
}
