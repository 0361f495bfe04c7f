//! Schema Generator Binary
//!
//! Writes the JSON Schema document of every exported MXLIMS record type into
//! the current working directory.
//!
//! Usage:
//!   cargo run -p mxlims-schema --bin generate-schemas

use mxlims_schema::{export_schemas, ExportConfig};
use tracing_subscriber::EnvFilter;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match export_schemas(&ExportConfig::default()) {
        Ok(paths) => tracing::info!(count = paths.len(), "schema export complete"),
        Err(e) => {
            tracing::error!(error = %e, "schema export failed");
            eprintln!("Failed to export schemas: {}", e);
            std::process::exit(1);
        }
    }
}
